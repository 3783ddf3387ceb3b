use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::project_dto::{
        ApplicantListResponse, ApplicantResponse, AssignGradePayload, CreateProjectPayload,
        ProjectListResponse, SubmitTaskPayload,
    },
    dto::stats_dto::{CompanyStatsQuery, CreatedResponse, MessageResponse, MonthQuery, PageQuery},
    error::{Error, Result},
    middleware::permissions::{
        require, ANY_APPROVED, COMPANY, COMPANY_OR_UNIVERSITY, STUDENT, UNIVERSITY,
    },
    models::user::Actor,
    routes::company_of,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectPayload,
    responses(
        (status = 201, description = "Project published", body = CreatedResponse),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    payload.validate()?;
    let project = state.project_service.create_project(payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: project.id })))
}

#[utoipa::path(
    get,
    path = "/api/projects",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Projects visible to the caller", body = ProjectListResponse))
)]
#[axum::debug_handler]
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let projects = state
        .project_service
        .list(&actor, query.page, query.limit)
        .await?;
    Ok(Json(ProjectListResponse { projects }))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project, with progress for students"),
        (status = 401, description = "Not visible to the caller"),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn get_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let view = state.project_service.find_one(id, &actor).await?;
    Ok(Json(view))
}

#[utoipa::path(
    patch,
    path = "/api/projects/{id}/approve",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses((status = 200, description = "Approved for the caller's university", body = MessageResponse))
)]
#[axum::debug_handler]
pub async fn approve_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, UNIVERSITY)?;
    let university_id = actor
        .university_id
        .ok_or_else(|| Error::BadRequest("Your account is not linked to a university".to_string()))?;
    state.project_service.approve(id, university_id).await?;
    Ok(Json(MessageResponse::new("Success")))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/apply",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 201, description = "Applied", body = CreatedResponse),
        (status = 400, description = "Already applied")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT)?;
    let applicant = state.project_service.apply(id, actor.user_id).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: applicant.id })))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/submit",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = SubmitTaskPayload,
    responses(
        (status = 200, description = "Submission recorded", body = ApplicantResponse),
        (status = 400, description = "Not assigned, or over the submission cap")
    )
)]
#[axum::debug_handler]
pub async fn submit_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitTaskPayload>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT)?;
    payload.validate()?;
    let applicant = state
        .project_service
        .submit_task(id, actor.user_id, payload)
        .await?;
    Ok(Json(ApplicantResponse { applicant }))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/applicants",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses((status = 200, description = "Applicants visible to the caller", body = ApplicantListResponse))
)]
#[axum::debug_handler]
pub async fn project_applicants(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY_OR_UNIVERSITY)?;
    let applicants = state.project_service.get_applicants(id, &actor).await?;
    Ok(Json(ApplicantListResponse { applicants }))
}

#[utoipa::path(
    get,
    path = "/api/projects/applicants/{id}",
    params(("id" = Uuid, Path, description = "Applicant ID")),
    responses(
        (status = 200, description = "Applicant", body = ApplicantResponse),
        (status = 401, description = "Not visible to the caller")
    )
)]
#[axum::debug_handler]
pub async fn get_applicant(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let applicant = state.project_service.get_applicant(id, &actor).await?;
    Ok(Json(ApplicantResponse { applicant }))
}

#[utoipa::path(
    patch,
    path = "/api/projects/applicants/{id}/grade",
    params(("id" = Uuid, Path, description = "Applicant ID")),
    request_body = AssignGradePayload,
    responses(
        (status = 200, description = "Graded", body = ApplicantResponse),
        (status = 400, description = "Task not yet submitted"),
        (status = 401, description = "Project owned by another company")
    )
)]
#[axum::debug_handler]
pub async fn assign_grade(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignGradePayload>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    payload.validate()?;
    let applicant = state
        .project_service
        .assign_grade(id, payload, &actor)
        .await?;
    Ok(Json(ApplicantResponse { applicant }))
}

#[utoipa::path(
    get,
    path = "/api/projects/applicants/{id}/profile",
    params(("id" = Uuid, Path, description = "Applicant ID")),
    responses((status = 200, description = "Submission with the student's profile"))
)]
#[axum::debug_handler]
pub async fn submission_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let profile = state.project_service.submission_profile(id, &actor).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/projects/in-progress",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Caller's projects with progress"))
)]
#[axum::debug_handler]
pub async fn in_progress(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT)?;
    let projects = state
        .project_service
        .find_in_progress(actor.user_id, query.page, query.limit)
        .await?;
    Ok(Json(projects))
}

#[utoipa::path(
    get,
    path = "/api/projects/stats",
    responses((status = 200, description = "Company project stats"))
)]
#[axum::debug_handler]
pub async fn project_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let stats = state.project_service.get_stats(company_of(&actor)?).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/projects/completed",
    params(
        ("recruiterID" = Option<Uuid>, Query, description = "Only this recruiter's projects"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Most recent completed submissions"))
)]
#[axum::debug_handler]
pub async fn completed_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<CompanyStatsQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let completed = state
        .project_service
        .completed_projects(company_of(&actor)?, query.recruiter_id, query.page, query.limit)
        .await?;
    Ok(Json(completed))
}

#[utoipa::path(
    get,
    path = "/api/projects/top-unis",
    params(
        ("recruiterID" = Option<Uuid>, Query, description = "Only this recruiter's projects"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Universities ranked by applicant count"))
)]
#[axum::debug_handler]
pub async fn project_top_unis(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<CompanyStatsQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let unis = state
        .project_service
        .top_unis(company_of(&actor)?, query.recruiter_id, query.page, query.limit)
        .await?;
    Ok(Json(unis))
}

#[utoipa::path(
    get,
    path = "/api/projects/month",
    params(
        ("month" = u32, Query, description = "Month, 1 to 12"),
        ("year" = i32, Query, description = "Year"),
        ("recruiterID" = Option<Uuid>, Query, description = "Only this recruiter's projects")
    ),
    responses((status = 200, description = "Daily application and completion counts"))
)]
#[axum::debug_handler]
pub async fn submission_month(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, COMPANY)?;
    let month = state
        .project_service
        .submission_in_month(company_of(&actor)?, query.recruiter_id, query.month, query.year)
        .await?;
    Ok(Json(month))
}
