use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationListQuery, ApplicationListResponse, ApplicationResponse,
        CreateApplicationPayload, CreateJobPayload, InterviewPayload, JobResponse, RatePayload,
    },
    dto::stats_dto::{CompanyStatsQuery, CreatedResponse, MessageResponse, MonthQuery},
    error::Result,
    middleware::permissions::{require, ADMIN, ANY_APPROVED, COMPANY, STUDENT, STUDENT_OR_COMPANY},
    models::user::Actor,
    routes::company_of,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job posted", body = JobResponse),
        (status = 403, description = "Not a company account")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    payload.validate()?;
    let job = state.job_service.create_job(payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(JobResponse { job })))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job", body = JobResponse),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let job = state.job_service.find_job(id).await?;
    Ok(Json(JobResponse { job }))
}

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Application submitted", body = CreatedResponse),
        (status = 400, description = "Invalid payload or already applied"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn create_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT)?;
    payload.validate()?;
    let app = state
        .application_service
        .create(payload, actor.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: app.id })))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("stage" = Option<String>, Query, description = "Stage filter")
    ),
    responses((status = 200, description = "Applications visible to the caller"))
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT_OR_COMPANY)?;
    let page = state.application_service.list(query, &actor).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application", body = ApplicationResponse),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT_OR_COMPANY)?;
    let application = state.application_service.find_one(id, &actor).await?;
    Ok(Json(ApplicationResponse { application }))
}

#[utoipa::path(
    get,
    path = "/api/applications/job/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses((status = 200, description = "Applications to the job", body = ApplicationListResponse))
)]
#[axum::debug_handler]
pub async fn applications_for_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT_OR_COMPANY)?;
    let applications = state
        .application_service
        .find_for_job(job_id, &actor)
        .await?;
    Ok(Json(ApplicationListResponse { applications }))
}

#[utoipa::path(
    get,
    path = "/api/applications/user/{user_id}",
    params(("user_id" = Uuid, Path, description = "Student ID")),
    responses((status = 200, description = "Applications of a student", body = ApplicationListResponse))
)]
#[axum::debug_handler]
pub async fn applications_for_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, ADMIN)?;
    let applications = state.application_service.find_for_user(user_id).await?;
    Ok(Json(ApplicationListResponse { applications }))
}

#[utoipa::path(
    delete,
    path = "/api/applications/user/{user_id}",
    params(("user_id" = Uuid, Path, description = "Deleted user ID")),
    responses((status = 200, description = "Applications removed", body = MessageResponse))
)]
#[axum::debug_handler]
pub async fn remove_user_applications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, ADMIN)?;
    let removed = state
        .application_service
        .remove_user_applications(user_id)
        .await?;
    Ok(Json(MessageResponse::new(format!(
        "Removed {} applications",
        removed
    ))))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/shortlist",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Shortlisted", body = ApplicationResponse),
        (status = 400, description = "Not in review"),
        (status = 401, description = "Job owned by another company")
    )
)]
#[axum::debug_handler]
pub async fn shortlist(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let application = state.application_service.shortlist(id, &actor).await?;
    Ok(Json(ApplicationResponse { application }))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/interview",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = InterviewPayload,
    responses(
        (status = 200, description = "Interview scheduled", body = ApplicationResponse),
        (status = 401, description = "Job owned by another company")
    )
)]
#[axum::debug_handler]
pub async fn interview(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InterviewPayload>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    payload.validate()?;
    let application = state
        .application_service
        .interview(id, payload, &actor)
        .await?;
    Ok(Json(ApplicationResponse { application }))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/rate",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = RatePayload,
    responses((status = 200, description = "Rated", body = ApplicationResponse))
)]
#[axum::debug_handler]
pub async fn rate(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RatePayload>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    payload.validate()?;
    let application = state
        .application_service
        .rate(id, payload.rating, &actor)
        .await?;
    Ok(Json(ApplicationResponse { application }))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/reject",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses((status = 200, description = "Rejected", body = ApplicationResponse))
)]
#[axum::debug_handler]
pub async fn reject(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let application = state.application_service.reject(id, &actor).await?;
    Ok(Json(ApplicationResponse { application }))
}

#[utoipa::path(
    get,
    path = "/api/applications/stats",
    responses((status = 200, description = "Caller's applications per stage"))
)]
#[axum::debug_handler]
pub async fn student_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT)?;
    let stats = state.application_service.get_stats(actor.user_id).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/applications/graph",
    responses((status = 200, description = "Caller's monthly application activity"))
)]
#[axum::debug_handler]
pub async fn student_graph(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT)?;
    let graph = state
        .application_service
        .application_graph(actor.user_id)
        .await?;
    Ok(Json(graph))
}

#[utoipa::path(
    get,
    path = "/api/applications/company/stats",
    params(("recruiterID" = Option<Uuid>, Query, description = "Only this recruiter's jobs")),
    responses((status = 200, description = "Company application stats"))
)]
#[axum::debug_handler]
pub async fn company_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<CompanyStatsQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let stats = state
        .application_service
        .get_stats_company(company_of(&actor)?, query.recruiter_id)
        .await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/applications/company/top-unis",
    params(
        ("recruiterID" = Option<Uuid>, Query, description = "Only this recruiter's jobs"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Universities ranked by applicant count"))
)]
#[axum::debug_handler]
pub async fn company_top_unis(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<CompanyStatsQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let unis = state
        .application_service
        .top_unis(company_of(&actor)?, query.recruiter_id, query.page, query.limit)
        .await?;
    Ok(Json(unis))
}

#[utoipa::path(
    get,
    path = "/api/applications/company/month",
    params(
        ("month" = u32, Query, description = "Month, 1 to 12"),
        ("year" = i32, Query, description = "Year"),
        ("recruiterID" = Option<Uuid>, Query, description = "Only this recruiter's jobs")
    ),
    responses(
        (status = 200, description = "Daily application and interview counts"),
        (status = 400, description = "Invalid month")
    )
)]
#[axum::debug_handler]
pub async fn company_month(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let month = state
        .application_service
        .applications_month(company_of(&actor)?, query.recruiter_id, query.month, query.year)
        .await?;
    Ok(Json(month))
}
