use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::event::{
    Event, EventInvitation, EventStats, EventStatus, EventType, EventVisibility,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventPayload {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,
    #[validate(length(min = 1, message = "Please provide a cover photo"))]
    pub cover_photo: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub visibility: EventVisibility,
    pub venue: Option<String>,
    #[validate(url)]
    pub event_link: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Required for hosts that are not affiliated with a university.
    pub university: Option<Uuid>,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub cover_photo: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub visibility: Option<EventVisibility>,
    pub venue: Option<String>,
    #[validate(url)]
    pub event_link: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EventListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Only events hosted by the caller.
    pub personal: Option<bool>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
}

/// An event together with the caller's RSVP state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    #[serde(flatten)]
    pub stats: EventStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventListResponse {
    pub events: Vec<EventView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitedEvent {
    pub invitation: EventInvitation,
    pub event: Option<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitedEventsResponse {
    pub events: Vec<InvitedEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConnectionsPayload {
    pub connections: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub going: bool,
    pub invited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsResponse {
    pub connections: Vec<ConnectionStatus>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventCountResponse {
    pub count: i64,
}
