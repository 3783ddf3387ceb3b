use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::audit::{AuditEntry, Audited};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Pending,
    Approved,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventVisibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Physical,
    Virtual,
}

macro_rules! str_enum {
    ($ty:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $s,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($s => Ok($ty::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($ty), other)),
                }
            }
        }
    };
}

str_enum!(EventStatus { Pending => "pending", Approved => "approved", Blocked => "blocked" });
str_enum!(EventVisibility { Public => "public", Private => "private" });
str_enum!(EventType { Physical => "physical", Virtual => "virtual" });

/// What a user asks for when they RSVP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RsvpAction {
    Interested,
    Going,
    NotInterested,
}

str_enum!(RsvpAction { Interested => "interested", Going => "going", NotInterested => "notInterested" });

/// A user's current relationship to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserEventStatus {
    None,
    Interested,
    Going,
    NotInterested,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub visibility: EventVisibility,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// User who created the event.
    pub host: Uuid,
    /// Company of the host, when the host is a company user.
    #[serde(rename = "companyID", default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    pub university: Uuid,
    pub venue: Option<String>,
    pub event_link: Option<String>,
    pub interested: Vec<Uuid>,
    pub going: Vec<Uuid>,
    pub not_interested: Vec<Uuid>,
    pub cover_photo: String,
    pub status: EventStatus,
    pub history: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

impl Audited for Event {
    fn history(&self) -> &[AuditEntry] {
        &self.history
    }

    fn history_mut(&mut self) -> &mut Vec<AuditEntry> {
        &mut self.history
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub user_status: UserEventStatus,
    pub going_count: usize,
    pub interested_count: usize,
}

impl Event {
    pub fn is_blocked(&self) -> bool {
        self.status == EventStatus::Blocked
    }

    /// Moves `user_id` into the set matching `action`, removing it from the
    /// other two first.
    pub fn set_rsvp(&mut self, user_id: Uuid, action: RsvpAction) {
        self.interested.retain(|id| *id != user_id);
        self.going.retain(|id| *id != user_id);
        self.not_interested.retain(|id| *id != user_id);
        match action {
            RsvpAction::Interested => self.interested.push(user_id),
            RsvpAction::Going => self.going.push(user_id),
            RsvpAction::NotInterested => self.not_interested.push(user_id),
        }
    }

    /// First match wins: interested, then going, then notInterested.
    pub fn rsvp_status(&self, user_id: Uuid) -> UserEventStatus {
        if self.interested.contains(&user_id) {
            UserEventStatus::Interested
        } else if self.going.contains(&user_id) {
            UserEventStatus::Going
        } else if self.not_interested.contains(&user_id) {
            UserEventStatus::NotInterested
        } else {
            UserEventStatus::None
        }
    }

    pub fn stats(&self, user_id: Uuid) -> EventStats {
        EventStats {
            user_status: self.rsvp_status(user_id),
            going_count: self.going.len(),
            interested_count: self.interested.len(),
        }
    }

    /// Whether `user_id` may invite others: the event is public, they host
    /// it, or they are already going.
    pub fn can_invite(&self, user_id: Uuid) -> bool {
        self.visibility == EventVisibility::Public
            || self.host == user_id
            || self.going.contains(&user_id)
    }

    pub fn approve(&mut self, actor_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        match self.status {
            EventStatus::Blocked => Err(Error::InvalidState(
                "Blocked events cannot be approved".to_string(),
            )),
            EventStatus::Approved => Ok(()),
            EventStatus::Pending => {
                self.status = EventStatus::Approved;
                self.record("status", EventStatus::Approved, actor_id, now);
                Ok(())
            }
        }
    }

    pub fn cancel(&mut self, actor_id: Uuid, now: DateTime<Utc>) {
        if self.status != EventStatus::Blocked {
            self.status = EventStatus::Blocked;
            self.record("status", EventStatus::Blocked, actor_id, now);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInvitation {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub status: EventStatus,
    #[serde(rename = "eventID")]
    pub event_id: Uuid,
    pub invited_by: Uuid,
    pub invited: Uuid,
    pub created_at: DateTime<Utc>,
}

impl EventInvitation {
    pub fn new(event_id: Uuid, invited_by: Uuid, invited: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: EventStatus::Pending,
            event_id,
            invited_by,
            invited,
            created_at: now,
        }
    }
}
