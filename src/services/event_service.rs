use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::dto::event_dto::{
    ConnectionStatus, CreateEventPayload, EventListQuery, EventView, InvitedEvent,
    UpdateEventPayload,
};
use crate::error::{Error, Result};
use crate::models::audit::Audited;
use crate::models::event::{
    Event, EventInvitation, EventStats, EventStatus, EventType, EventVisibility, RsvpAction,
};
use crate::models::user::{Actor, Role};
use crate::services::notification_service::{spawn_notification, Notification, Notifier};
use crate::services::write_conflict;
use crate::store::{EventQuery, Store};
use crate::utils::time;

/// Extra listing restrictions picked by the route, on top of the caller's
/// own filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventScope {
    pub company_id: Option<Uuid>,
    pub university_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    settings: EngineSettings,
}

impl EventService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, settings: EngineSettings) -> Self {
        Self {
            store,
            notifier,
            settings,
        }
    }

    /// Company hosted events wait for the hosting university to approve them.
    pub async fn create(&self, payload: CreateEventPayload, actor: &Actor) -> Result<Event> {
        let university = match actor.role {
            Role::Student | Role::UniCounselor => actor.university_id,
            _ => payload.university,
        }
        .ok_or_else(|| Error::BadRequest("Please provide a university".to_string()))?;

        check_location(payload.event_type, payload.venue.as_deref(), payload.event_link.as_deref())?;
        if let Some(end) = payload.end {
            if end < payload.start {
                return Err(Error::BadRequest("Event cannot end before it starts".to_string()));
            }
        }

        let status = if actor.role.is_company_entity() {
            EventStatus::Pending
        } else {
            EventStatus::Approved
        };

        let event = Event {
            id: Uuid::new_v4(),
            title: payload.title,
            description: payload.description,
            event_type: payload.event_type,
            visibility: payload.visibility,
            start: payload.start,
            end: payload.end,
            host: actor.user_id,
            company_id: actor.company_id,
            university,
            venue: payload.venue,
            event_link: payload.event_link,
            interested: Vec::new(),
            going: Vec::new(),
            not_interested: Vec::new(),
            cover_photo: payload.cover_photo,
            status,
            history: Vec::new(),
            created_at: time::now(),
            version: 0,
        };
        self.store.insert_event(&event).await?;
        tracing::info!(event_id = %event.id, host = %event.host, status = %event.status, "event created");
        Ok(event)
    }

    /// RSVP. Non-public events need an invitation for this exact event.
    pub async fn update_rsvp(&self, event_id: Uuid, user_id: Uuid, action: RsvpAction) -> Result<EventStats> {
        let mut checked_invitation = false;

        for attempt in 0..=self.settings.write_retry_limit {
            let mut event = self.load(event_id).await?;
            if event.is_blocked() {
                return Err(Error::InvalidState(
                    "You can not register for blocked events".to_string(),
                ));
            }
            if event.visibility != EventVisibility::Public && !checked_invitation {
                if !self.store.has_invitation(event_id, user_id).await? {
                    tracing::warn!(%event_id, %user_id, "rsvp without invitation");
                    return Err(Error::Unauthorized(
                        "You are not invited to this event".to_string(),
                    ));
                }
                checked_invitation = true;
            }

            let expected = event.version;
            event.set_rsvp(user_id, action);
            if self.store.save_event(&event, expected).await? {
                tracing::info!(%event_id, %user_id, %action, "rsvp updated");
                if action == RsvpAction::Going {
                    spawn_notification(
                        self.notifier.clone(),
                        Notification::Subscribe {
                            user_id,
                            topic: event_id.to_string(),
                        },
                    );
                }
                return Ok(event.stats(user_id));
            }
            tracing::debug!(%event_id, attempt, "event changed underneath, retrying");
        }
        Err(write_conflict("Event", event_id))
    }

    pub async fn invite(&self, event_id: Uuid, inviter: Uuid, invitee: Uuid) -> Result<EventInvitation> {
        let event = self.load(event_id).await?;
        if event.is_blocked() {
            return Err(Error::InvalidState(
                "You can not register or invite for blocked events".to_string(),
            ));
        }
        if !event.can_invite(inviter) {
            tracing::warn!(%event_id, %inviter, "invite denied");
            return Err(Error::Unauthorized(
                "You do not have permission to invite".to_string(),
            ));
        }

        let invitation = EventInvitation::new(event_id, inviter, invitee, time::now());
        self.store.insert_invitation(&invitation).await?;
        tracing::info!(%event_id, %inviter, %invitee, "invitation sent");

        spawn_notification(
            self.notifier.clone(),
            Notification::Message {
                recipient: invitee,
                title: "Event Invitation".to_string(),
                body: format!("You have been invited to the event: {}", event.title),
            },
        );
        Ok(invitation)
    }

    /// Broadcasts a reminder to the subscribers of every event starting
    /// within the hour after `now`. Returns how many events were announced.
    pub async fn send_reminders(&self, now: DateTime<Utc>) -> Result<usize> {
        let events = self
            .store
            .events_starting_between(now, now + Duration::hours(1))
            .await?;
        for event in &events {
            spawn_notification(
                self.notifier.clone(),
                Notification::Topic {
                    topic: event.id.to_string(),
                    title: format!("Event Reminder: {}", event.title),
                    body: format!(
                        "This is a reminder for the event: {} starting at {}",
                        event.description,
                        event.start.format("%a %b %d %Y %H:%M UTC")
                    ),
                },
            );
        }
        if !events.is_empty() {
            tracing::info!(count = events.len(), "event reminders sent");
        }
        Ok(events.len())
    }

    pub fn get_event_stats(&self, event: &Event, user_id: Uuid) -> EventStats {
        event.stats(user_id)
    }

    pub async fn cancel_event(&self, event_id: Uuid, actor: &Actor) -> Result<Event> {
        for attempt in 0..=self.settings.write_retry_limit {
            let mut event = self.load(event_id).await?;
            if event.host != actor.user_id {
                tracing::warn!(%event_id, user_id = %actor.user_id, "cancel denied");
                return Err(Error::Unauthorized(
                    "You do not have permission to cancel this event".to_string(),
                ));
            }
            if event.is_blocked() {
                return Ok(event);
            }

            let expected = event.version;
            event.cancel(actor.user_id, time::now());
            if self.store.save_event(&event, expected).await? {
                event.version = expected + 1;
                tracing::info!(%event_id, "event cancelled");
                return Ok(event);
            }
            tracing::debug!(%event_id, attempt, "event changed underneath, retrying");
        }
        Err(write_conflict("Event", event_id))
    }

    pub async fn remove(&self, event_id: Uuid, actor: &Actor) -> Result<()> {
        let event = self.load(event_id).await?;
        if event.host != actor.user_id {
            return Err(Error::Unauthorized(
                "You do not have permission to delete".to_string(),
            ));
        }
        if !self.store.delete_event(event_id).await? {
            return Err(Error::NotFound("Event not found".to_string()));
        }
        tracing::info!(%event_id, "event deleted");
        Ok(())
    }

    /// Applies the provided fields, writing one audit entry per field whose
    /// value actually changed.
    pub async fn update_event(
        &self,
        event_id: Uuid,
        payload: UpdateEventPayload,
        actor: &Actor,
    ) -> Result<Event> {
        for attempt in 0..=self.settings.write_retry_limit {
            let mut event = self.load(event_id).await?;
            if !can_update(&event, actor) {
                tracing::warn!(%event_id, user_id = %actor.user_id, "event update denied");
                return Err(Error::Unauthorized(
                    "You do not have permission to update".to_string(),
                ));
            }

            let expected = event.version;
            let changed = apply_update(&mut event, &payload, actor.user_id)?;
            if changed == 0 {
                return Ok(event);
            }
            if self.store.save_event(&event, expected).await? {
                event.version = expected + 1;
                tracing::info!(%event_id, changed, "event updated");
                return Ok(event);
            }
            tracing::debug!(%event_id, attempt, "event changed underneath, retrying");
        }
        Err(write_conflict("Event", event_id))
    }

    pub async fn find_all(
        &self,
        query: EventListQuery,
        scope: EventScope,
        actor: &Actor,
    ) -> Result<Vec<EventView>> {
        let invited_event_ids = self
            .store
            .invitations_for_user(actor.user_id)
            .await?
            .into_iter()
            .map(|inv| inv.event_id)
            .collect();

        let filter = EventQuery {
            invited_event_ids,
            title: query.title.filter(|t| !t.trim().is_empty()),
            starts_after: query.start,
            ends_before: query.end,
            host: query.personal.unwrap_or(false).then_some(actor.user_id),
            company_id: scope.company_id,
            university_id: scope.university_id,
            event_type: query.event_type,
        };
        let (skip, limit) = self.settings.paginate(query.page, query.limit);

        Ok(self
            .store
            .list_events(&filter, skip, limit)
            .await?
            .into_iter()
            .map(|mut event| {
                let stats = event.stats(actor.user_id);
                event.history.clear();
                EventView { event, stats }
            })
            .collect())
    }

    pub async fn find_one(&self, event_id: Uuid, actor: &Actor) -> Result<EventView> {
        let mut event = self.load(event_id).await?;
        let stats = event.stats(actor.user_id);
        if !can_update(&event, actor) {
            event.history.clear();
        }
        Ok(EventView { event, stats })
    }

    pub async fn find_invited_events(&self, user_id: Uuid) -> Result<Vec<InvitedEvent>> {
        let invitations = self.store.invitations_for_user(user_id).await?;
        let mut out = Vec::with_capacity(invitations.len());
        for invitation in invitations {
            let event = self.store.get_event(invitation.event_id).await?.map(|mut e| {
                e.history.clear();
                e
            });
            out.push(InvitedEvent { invitation, event });
        }
        Ok(out)
    }

    pub async fn event_count(&self, university_id: Uuid) -> Result<i64> {
        self.store.count_university_events(university_id).await
    }

    /// Lets the hosting university publish a pending event.
    pub async fn approve_event(&self, event_id: Uuid, actor: &Actor) -> Result<Event> {
        for attempt in 0..=self.settings.write_retry_limit {
            let mut event = self.load(event_id).await?;
            if actor.university_id != Some(event.university) {
                tracing::warn!(%event_id, user_id = %actor.user_id, "approval by non-hosting university");
                return Err(Error::Unauthorized(
                    "Only the hosting university can approve this event".to_string(),
                ));
            }
            if event.status == EventStatus::Approved {
                return Ok(event);
            }

            let expected = event.version;
            event.approve(actor.user_id, time::now())?;
            if self.store.save_event(&event, expected).await? {
                event.version = expected + 1;
                tracing::info!(%event_id, "event approved");
                return Ok(event);
            }
            tracing::debug!(%event_id, attempt, "event changed underneath, retrying");
        }
        Err(write_conflict("Event", event_id))
    }

    /// Going and invited flags for each of the caller's connections.
    pub async fn get_connections(
        &self,
        event_id: Uuid,
        connections: &[Uuid],
    ) -> Result<Vec<ConnectionStatus>> {
        let event = self.load(event_id).await?;
        let invited: HashSet<Uuid> = self
            .store
            .invitations_for_event(event_id)
            .await?
            .into_iter()
            .map(|inv| inv.invited)
            .collect();

        Ok(connections
            .iter()
            .map(|user_id| ConnectionStatus {
                user_id: *user_id,
                going: event.going.contains(user_id),
                invited: invited.contains(user_id),
            })
            .collect())
    }

    async fn load(&self, id: Uuid) -> Result<Event> {
        self.store
            .get_event(id)
            .await?
            .ok_or_else(|| Error::NotFound("Event not found".to_string()))
    }
}

fn check_location(event_type: EventType, venue: Option<&str>, link: Option<&str>) -> Result<()> {
    let present = |v: Option<&str>| v.map_or(false, |s| !s.trim().is_empty());
    match event_type {
        EventType::Physical if !present(venue) => Err(Error::BadRequest(
            "Physical events need a venue".to_string(),
        )),
        EventType::Virtual if !present(link) => Err(Error::BadRequest(
            "Virtual events need an event link".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Company managers of the host's company, counselors of the event's
/// university, and the host.
pub fn can_update(event: &Event, actor: &Actor) -> bool {
    let company = actor.role.is_company_manager()
        && actor.company_id.is_some()
        && actor.company_id == event.company_id;
    let university =
        actor.role == Role::UniCounselor && actor.university_id == Some(event.university);
    company || university || event.host == actor.user_id
}

fn replace<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

fn apply_update(event: &mut Event, payload: &UpdateEventPayload, actor_id: Uuid) -> Result<usize> {
    // Updates may only block an event. Approval goes through the hosting
    // university.
    match payload.status {
        Some(status) if status != event.status && event.is_blocked() => {
            return Err(Error::InvalidState(
                "Blocked events cannot be reopened".to_string(),
            ));
        }
        Some(status) if status != event.status && status != EventStatus::Blocked => {
            return Err(Error::InvalidState(
                "Events are approved by their university".to_string(),
            ));
        }
        _ => {}
    }

    let mut changes: Vec<(&'static str, String)> = Vec::new();
    if replace(&mut event.title, payload.title.clone()) {
        changes.push(("title", event.title.clone()));
    }
    if replace(&mut event.description, payload.description.clone()) {
        changes.push(("description", event.description.clone()));
    }
    if replace(&mut event.cover_photo, payload.cover_photo.clone()) {
        changes.push(("coverPhoto", event.cover_photo.clone()));
    }
    if replace(&mut event.start, payload.start) {
        changes.push(("start", event.start.to_rfc3339()));
    }
    if replace(&mut event.end, payload.end.map(Some)) {
        changes.push(("end", event.end.map(|d| d.to_rfc3339()).unwrap_or_default()));
    }
    if replace(&mut event.event_type, payload.event_type) {
        changes.push(("type", event.event_type.to_string()));
    }
    if replace(&mut event.venue, payload.venue.clone().map(Some)) {
        changes.push(("venue", event.venue.clone().unwrap_or_default()));
    }
    if replace(&mut event.event_link, payload.event_link.clone().map(Some)) {
        changes.push(("eventLink", event.event_link.clone().unwrap_or_default()));
    }
    if replace(&mut event.visibility, payload.visibility) {
        changes.push(("visibility", event.visibility.to_string()));
    }
    if replace(&mut event.status, payload.status) {
        changes.push(("status", event.status.to_string()));
    }

    if let Some(end) = event.end {
        if end < event.start {
            return Err(Error::BadRequest("Event cannot end before it starts".to_string()));
        }
    }
    check_location(event.event_type, event.venue.as_deref(), event.event_link.as_deref())?;

    let now = time::now();
    let changed = changes.len();
    for (field, value) in changes {
        event.record(field, value, actor_id, now);
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(host: Uuid) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Open day".into(),
            description: "Campus tour".into(),
            event_type: EventType::Physical,
            visibility: EventVisibility::Public,
            start: Utc::now(),
            end: None,
            host,
            company_id: Some(Uuid::new_v4()),
            university: Uuid::new_v4(),
            venue: Some("Hall A".into()),
            event_link: None,
            interested: vec![],
            going: vec![],
            not_interested: vec![],
            cover_photo: "cover.png".into(),
            status: EventStatus::Approved,
            history: vec![],
            created_at: Utc::now(),
            version: 0,
        }
    }

    #[test]
    fn update_permission_covers_manager_counselor_and_host() {
        let host = Uuid::new_v4();
        let ev = event(host);
        let company = ev.company_id.unwrap();

        assert!(can_update(&ev, &Actor::student(host, None)));
        assert!(can_update(&ev, &Actor::company(Uuid::new_v4(), Role::CompanyAdmin, company)));
        assert!(!can_update(&ev, &Actor::company(Uuid::new_v4(), Role::CompanyRecruiter, company)));
        assert!(!can_update(&ev, &Actor::company(Uuid::new_v4(), Role::CompanyAdmin, Uuid::new_v4())));
        assert!(can_update(&ev, &Actor::university(Uuid::new_v4(), Role::UniCounselor, ev.university)));
        assert!(!can_update(&ev, &Actor::university(Uuid::new_v4(), Role::UniAdmin, ev.university)));
    }

    #[test]
    fn only_changed_fields_are_audited() {
        let host = Uuid::new_v4();
        let mut ev = event(host);
        let payload = UpdateEventPayload {
            title: Some("Open day 2025".into()),
            description: Some("Campus tour".into()),
            venue: Some("Hall B".into()),
            ..Default::default()
        };
        let changed = apply_update(&mut ev, &payload, host).unwrap();
        assert_eq!(changed, 2);
        let fields: Vec<&str> = ev.history.iter().map(|h| h.changed_field.as_str()).collect();
        assert_eq!(fields, vec!["title", "venue"]);
        assert_eq!(ev.history[1].updated_value, "Hall B");
    }

    #[test]
    fn blocked_event_stays_blocked() {
        let host = Uuid::new_v4();
        let mut ev = event(host);
        ev.status = EventStatus::Blocked;
        let payload = UpdateEventPayload {
            status: Some(EventStatus::Approved),
            ..Default::default()
        };
        assert_eq!(
            apply_update(&mut ev, &payload, host).unwrap_err().kind(),
            "invalid_state"
        );
    }

    #[test]
    fn update_cannot_approve_a_pending_event() {
        let host = Uuid::new_v4();
        let mut ev = event(host);
        ev.status = EventStatus::Pending;
        let approve = UpdateEventPayload {
            status: Some(EventStatus::Approved),
            ..Default::default()
        };
        assert_eq!(
            apply_update(&mut ev, &approve, host).unwrap_err().kind(),
            "invalid_state"
        );
        assert_eq!(ev.status, EventStatus::Pending);
        assert!(ev.history.is_empty());

        let block = UpdateEventPayload {
            status: Some(EventStatus::Blocked),
            ..Default::default()
        };
        assert_eq!(apply_update(&mut ev, &block, host).unwrap(), 1);
        assert_eq!(ev.status, EventStatus::Blocked);
    }

    #[test]
    fn virtual_events_need_a_link() {
        assert!(check_location(EventType::Virtual, Some("Hall"), None).is_err());
        assert!(check_location(EventType::Virtual, None, Some("https://meet.example/a")).is_ok());
        assert!(check_location(EventType::Physical, Some("  "), None).is_err());
    }
}
