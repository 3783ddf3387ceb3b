use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use careers_backend::config::EngineSettings;
use careers_backend::middleware::auth::{issue_token, Claims};
use careers_backend::models::user::{Actor, Role};
use careers_backend::routes;
use careers_backend::services::notification_service::LogNotifier;
use careers_backend::store::memory::MemoryStore;
use careers_backend::AppState;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test_secret_key";

fn app() -> Router {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(LogNotifier),
        EngineSettings::default(),
        SECRET,
    );
    routes::router(state, 1000)
}

fn token_for(actor: &Actor) -> String {
    let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
    issue_token(SECRET, &Claims::for_actor(actor, exp)).expect("sign token")
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    actor: Option<&Actor>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(actor)));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_requires_a_valid_bearer_token() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/applications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let request = Request::builder()
        .uri("/api/applications")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn capabilities_are_checked_per_route() {
    let app = app();
    let student = Actor::student(Uuid::new_v4(), Some(Uuid::new_v4()));
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/jobs",
        Some(&student),
        Some(json!({ "title": "Data analyst" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut pending = Actor::company(Uuid::new_v4(), Role::CompanyAdmin, Uuid::new_v4());
    pending.status = careers_backend::models::user::AccountStatus::Pending;
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/jobs",
        Some(&pending),
        Some(json!({ "title": "Data analyst" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn application_lifecycle_over_http() {
    let app = app();
    let recruiter = Actor::company(Uuid::new_v4(), Role::CompanyRecruiter, Uuid::new_v4());
    let student = Actor::student(Uuid::new_v4(), Some(Uuid::new_v4()));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/jobs",
        Some(&recruiter),
        Some(json!({ "title": "Data analyst" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let job_id = body["job"]["_id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/applications",
        Some(&student),
        Some(json!({ "jobID": job_id, "resume": "r.pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let app_id = body["_id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/applications",
        Some(&student),
        Some(json!({ "jobID": job_id, "resume": "again.pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/applications/{}/shortlist", app_id),
        Some(&recruiter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["stage"], "short-listed");
    assert_eq!(body["application"]["history"].as_array().unwrap().len(), 1);

    let other = Actor::company(Uuid::new_v4(), Role::CompanyAdmin, Uuid::new_v4());
    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/api/applications/{}/reject", app_id),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/api/applications/{}/rate", app_id),
        Some(&recruiter),
        Some(json!({ "rating": 11.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/applications/stats",
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["shortlisted"], 1);
}

#[tokio::test]
async fn rsvp_action_must_be_known() {
    let app = app();
    let university = Uuid::new_v4();
    let host = Actor::student(Uuid::new_v4(), Some(university));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/events",
        Some(&host),
        Some(json!({
            "title": "Hack night",
            "description": "Build things",
            "coverPhoto": "hack.png",
            "type": "virtual",
            "eventLink": "https://meet.example.com/hack",
            "start": "2030-03-01T18:00:00Z",
            "end": "2030-03-01T23:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = body["_id"].as_str().unwrap().to_string();

    let guest = Actor::student(Uuid::new_v4(), Some(university));
    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/api/events/{}/rsvp/maybe", event_id),
        Some(&guest),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/events/{}/rsvp/going", event_id),
        Some(&guest),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userStatus"], "going");
    assert_eq!(body["goingCount"], 1);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/events/{}", event_id),
        Some(&guest),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Hack night");
    assert_eq!(body["userStatus"], "going");
}

#[tokio::test]
async fn university_staff_cannot_list_applications() {
    let app = app();
    let counselor = Actor::university(Uuid::new_v4(), Role::UniCounselor, Uuid::new_v4());
    let (status, _) = call(&app, Method::GET, "/api/applications", Some(&counselor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn huge_page_number_returns_an_empty_page() {
    let app = app();
    let student = Actor::student(Uuid::new_v4(), Some(Uuid::new_v4()));
    let (status, body) = call(
        &app,
        Method::GET,
        "/api/applications?page=9223372036854775807&limit=3",
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["limit"], 3);
}
