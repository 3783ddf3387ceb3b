pub mod applications;
pub mod events;
pub mod health;
pub mod projects;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::{auth::require_auth, rate_limit};
use crate::models::user::Actor;
use crate::AppState;

/// Company-scoped routes act on the caller's own company.
pub(crate) fn company_of(actor: &Actor) -> Result<Uuid> {
    actor
        .company_id
        .ok_or_else(|| Error::BadRequest("Your account is not linked to a company".to_string()))
}

pub fn router(state: AppState, rps: u32) -> Router {
    let base_routes = Router::new().route("/health", get(health::health));

    let application_api = Router::new()
        .route("/api/jobs", post(applications::create_job))
        .route("/api/jobs/:id", get(applications::get_job))
        .route(
            "/api/applications",
            get(applications::list_applications).post(applications::create_application),
        )
        .route("/api/applications/stats", get(applications::student_stats))
        .route("/api/applications/graph", get(applications::student_graph))
        .route(
            "/api/applications/company/stats",
            get(applications::company_stats),
        )
        .route(
            "/api/applications/company/top-unis",
            get(applications::company_top_unis),
        )
        .route(
            "/api/applications/company/month",
            get(applications::company_month),
        )
        .route(
            "/api/applications/job/:job_id",
            get(applications::applications_for_job),
        )
        .route(
            "/api/applications/user/:user_id",
            get(applications::applications_for_user)
                .delete(applications::remove_user_applications),
        )
        .route("/api/applications/:id", get(applications::get_application))
        .route(
            "/api/applications/:id/shortlist",
            patch(applications::shortlist),
        )
        .route(
            "/api/applications/:id/interview",
            patch(applications::interview),
        )
        .route("/api/applications/:id/rate", patch(applications::rate))
        .route("/api/applications/:id/reject", patch(applications::reject));

    let project_api = Router::new()
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/api/projects/stats", get(projects::project_stats))
        .route("/api/projects/completed", get(projects::completed_projects))
        .route("/api/projects/top-unis", get(projects::project_top_unis))
        .route("/api/projects/month", get(projects::submission_month))
        .route("/api/projects/in-progress", get(projects::in_progress))
        .route("/api/projects/:id", get(projects::get_project))
        .route("/api/projects/:id/approve", patch(projects::approve_project))
        .route("/api/projects/:id/apply", post(projects::apply))
        .route("/api/projects/:id/submit", post(projects::submit_task))
        .route(
            "/api/projects/:id/applicants",
            get(projects::project_applicants),
        )
        .route(
            "/api/projects/applicants/:id",
            get(projects::get_applicant),
        )
        .route(
            "/api/projects/applicants/:id/grade",
            patch(projects::assign_grade),
        )
        .route(
            "/api/projects/applicants/:id/profile",
            get(projects::submission_profile),
        );

    let event_api = Router::new()
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/api/events/invited", get(events::invited_events))
        .route(
            "/api/events/company/:company_id",
            get(events::company_events),
        )
        .route(
            "/api/events/university/:university_id",
            get(events::university_events),
        )
        .route(
            "/api/events/count/:university_id",
            get(events::event_count),
        )
        .route(
            "/api/events/:id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/api/events/:id/rsvp/:action", patch(events::rsvp))
        .route("/api/events/:id/invite/:user_id", post(events::invite))
        .route("/api/events/:id/cancel", patch(events::cancel_event))
        .route("/api/events/:id/approve", patch(events::approve_event))
        .route("/api/events/:id/connections", post(events::connections));

    let authed_api = application_api
        .merge(project_api)
        .merge(event_api)
        .layer(from_fn_with_state(state.clone(), require_auth))
        .layer(from_fn_with_state(
            rate_limit::new_rps_state(rps),
            rate_limit::rps_middleware,
        ));

    base_routes.merge(authed_api).with_state(state)
}
