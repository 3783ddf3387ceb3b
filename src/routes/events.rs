use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::event_dto::{
        ConnectionsPayload, ConnectionsResponse, CreateEventPayload, EventCountResponse,
        EventListQuery, EventListResponse, EventView, InvitedEventsResponse, UpdateEventPayload,
    },
    dto::stats_dto::{CreatedResponse, MessageResponse},
    error::{Error, Result},
    middleware::permissions::{require, ANY_APPROVED, EVENT_HOSTS, STUDENT, UNIVERSITY},
    models::event::RsvpAction,
    models::user::{Actor, Role},
    services::event_service::EventScope,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventPayload,
    responses(
        (status = 201, description = "Event created", body = CreatedResponse),
        (status = 400, description = "Missing venue, link or university")
    )
)]
#[axum::debug_handler]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateEventPayload>,
) -> Result<impl IntoResponse> {
    require(&actor, EVENT_HOSTS)?;
    payload.validate()?;
    let event = state.event_service.create(payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: event.id })))
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("title" = Option<String>, Query, description = "Words the title must contain"),
        ("personal" = Option<bool>, Query, description = "Only events hosted by the caller")
    ),
    responses((status = 200, description = "Events visible to the caller", body = EventListResponse))
)]
#[axum::debug_handler]
pub async fn list_events(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<EventListQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    // Students only see their own campus.
    let scope = EventScope {
        university_id: match actor.role {
            Role::Student => actor.university_id,
            _ => None,
        },
        ..EventScope::default()
    };
    let events = state.event_service.find_all(query, scope, &actor).await?;
    Ok(Json(EventListResponse { events }))
}

#[utoipa::path(
    get,
    path = "/api/events/company/{company_id}",
    params(("company_id" = Uuid, Path, description = "Company ID")),
    responses((status = 200, description = "Events of one company", body = EventListResponse))
)]
#[axum::debug_handler]
pub async fn company_events(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<EventListQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let scope = EventScope {
        company_id: Some(company_id),
        ..EventScope::default()
    };
    let events = state.event_service.find_all(query, scope, &actor).await?;
    Ok(Json(EventListResponse { events }))
}

#[utoipa::path(
    get,
    path = "/api/events/university/{university_id}",
    params(("university_id" = Uuid, Path, description = "University ID")),
    responses((status = 200, description = "Events of one university", body = EventListResponse))
)]
#[axum::debug_handler]
pub async fn university_events(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(university_id): Path<Uuid>,
    Query(query): Query<EventListQuery>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let scope = EventScope {
        university_id: Some(university_id),
        ..EventScope::default()
    };
    let events = state.event_service.find_all(query, scope, &actor).await?;
    Ok(Json(EventListResponse { events }))
}

#[utoipa::path(
    get,
    path = "/api/events/invited",
    responses((status = 200, description = "Invitations received by the caller", body = InvitedEventsResponse))
)]
#[axum::debug_handler]
pub async fn invited_events(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let events = state
        .event_service
        .find_invited_events(actor.user_id)
        .await?;
    Ok(Json(InvitedEventsResponse { events }))
}

#[utoipa::path(
    get,
    path = "/api/events/count/{university_id}",
    params(("university_id" = Uuid, Path, description = "University ID")),
    responses((status = 200, description = "Number of events at a university", body = EventCountResponse))
)]
#[axum::debug_handler]
pub async fn event_count(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(university_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let count = state.event_service.event_count(university_id).await?;
    Ok(Json(EventCountResponse { count }))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event with the caller's RSVP state", body = EventView),
        (status = 404, description = "Event not found")
    )
)]
#[axum::debug_handler]
pub async fn get_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let view = state.event_service.find_one(id, &actor).await?;
    Ok(Json(view))
}

#[utoipa::path(
    patch,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEventPayload,
    responses(
        (status = 200, description = "Updated event"),
        (status = 401, description = "Caller may not update this event")
    )
)]
#[axum::debug_handler]
pub async fn update_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventPayload>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    payload.validate()?;
    let event = state.event_service.update_event(id, payload, &actor).await?;
    Ok(Json(event))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 401, description = "Only the host may delete")
    )
)]
#[axum::debug_handler]
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    state.event_service.remove(id, &actor).await?;
    Ok(Json(MessageResponse::new("Event deleted")))
}

#[utoipa::path(
    patch,
    path = "/api/events/{id}/rsvp/{action}",
    params(
        ("id" = Uuid, Path, description = "Event ID"),
        ("action" = String, Path, description = "interested, going or notInterested")
    ),
    responses(
        (status = 200, description = "Caller's RSVP state after the change"),
        (status = 400, description = "Unknown action or blocked event"),
        (status = 401, description = "Private event without an invitation")
    )
)]
#[axum::debug_handler]
pub async fn rsvp(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, action)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse> {
    require(&actor, STUDENT)?;
    let action: RsvpAction = action.parse().map_err(Error::BadRequest)?;
    let stats = state
        .event_service
        .update_rsvp(id, actor.user_id, action)
        .await?;
    Ok(Json(stats))
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/invite/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Event ID"),
        ("user_id" = Uuid, Path, description = "Invited user")
    ),
    responses(
        (status = 201, description = "Invitation sent", body = CreatedResponse),
        (status = 401, description = "Caller may not invite to this event")
    )
)]
#[axum::debug_handler]
pub async fn invite(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let invitation = state
        .event_service
        .invite(id, actor.user_id, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: invitation.id })))
}

#[utoipa::path(
    patch,
    path = "/api/events/{id}/cancel",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses((status = 200, description = "Event blocked", body = MessageResponse))
)]
#[axum::debug_handler]
pub async fn cancel_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    state.event_service.cancel_event(id, &actor).await?;
    Ok(Json(MessageResponse::new("Event cancelled")))
}

#[utoipa::path(
    patch,
    path = "/api/events/{id}/approve",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event approved", body = MessageResponse),
        (status = 401, description = "Event belongs to another university")
    )
)]
#[axum::debug_handler]
pub async fn approve_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require(&actor, UNIVERSITY)?;
    state.event_service.approve_event(id, &actor).await?;
    Ok(Json(MessageResponse::new("Event approved")))
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/connections",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = ConnectionsPayload,
    responses((status = 200, description = "Going and invited flags per connection", body = ConnectionsResponse))
)]
#[axum::debug_handler]
pub async fn connections(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConnectionsPayload>,
) -> Result<impl IntoResponse> {
    require(&actor, ANY_APPROVED)?;
    let connections = state
        .event_service
        .get_connections(id, &payload.connections)
        .await?;
    Ok(Json(ConnectionsResponse { connections }))
}
