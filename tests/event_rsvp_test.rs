use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use careers_backend::config::EngineSettings;
use careers_backend::dto::event_dto::{CreateEventPayload, EventListQuery, UpdateEventPayload};
use careers_backend::error::Result;
use careers_backend::models::event::{
    Event, EventStatus, EventType, EventVisibility, RsvpAction, UserEventStatus,
};
use careers_backend::models::user::{Actor, Role};
use careers_backend::services::event_service::{EventScope, EventService};
use careers_backend::services::notification_service::Notifier;
use careers_backend::store::memory::MemoryStore;
use careers_backend::store::{EventStore, Store};
use chrono::{Duration, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, PartialEq)]
enum Sent {
    Message { recipient: Uuid, title: String, body: String },
    Subscribe { user_id: Uuid, topic: String },
    Topic { topic: String, title: String },
}

struct ChannelNotifier(mpsc::UnboundedSender<Sent>);

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn send_notification(&self, recipient: Uuid, title: &str, body: &str) -> Result<()> {
        let _ = self.0.send(Sent::Message {
            recipient,
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn subscribe_to_topic(&self, user_id: Uuid, topic: &str) -> Result<()> {
        let _ = self.0.send(Sent::Subscribe {
            user_id,
            topic: topic.to_string(),
        });
        Ok(())
    }

    async fn send_to_topic(&self, topic: &str, title: &str, _body: &str) -> Result<()> {
        let _ = self.0.send(Sent::Topic {
            topic: topic.to_string(),
            title: title.to_string(),
        });
        Ok(())
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    events: EventService,
    sent: mpsc::UnboundedReceiver<Sent>,
    university: Uuid,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn Store> = store.clone();
    let (tx, rx) = mpsc::unbounded_channel();
    Fixture {
        events: EventService::new(dyn_store, Arc::new(ChannelNotifier(tx)), EngineSettings::default()),
        store,
        sent: rx,
        university: Uuid::new_v4(),
    }
}

impl Fixture {
    async fn next_notification(&mut self) -> Sent {
        tokio::time::timeout(StdDuration::from_secs(2), self.sent.recv())
            .await
            .expect("notification within timeout")
            .expect("notifier channel open")
    }

    async fn stored(&self, id: Uuid) -> Event {
        self.store.get_event(id).await.unwrap().unwrap()
    }
}

fn payload(visibility: EventVisibility) -> CreateEventPayload {
    CreateEventPayload {
        title: "Career fair".into(),
        description: "Meet employers".into(),
        cover_photo: "fair.png".into(),
        event_type: EventType::Physical,
        visibility,
        venue: Some("Main hall".into()),
        event_link: None,
        start: Utc::now() + Duration::days(7),
        end: Some(Utc::now() + Duration::days(7) + Duration::hours(4)),
        university: None,
    }
}

async fn host_event(fx: &Fixture, host: &Actor, visibility: EventVisibility) -> Event {
    fx.events
        .create(payload(visibility), host)
        .await
        .expect("create event")
}

fn membership(event: &Event, user: Uuid) -> usize {
    [&event.interested, &event.going, &event.not_interested]
        .iter()
        .filter(|list| list.contains(&user))
        .count()
}

#[tokio::test]
async fn private_event_needs_an_invitation() {
    let mut fx = fixture();
    let host = Actor::student(Uuid::new_v4(), Some(fx.university));
    let event = host_event(&fx, &host, EventVisibility::Private).await;
    let guest = Uuid::new_v4();

    let err = fx
        .events
        .update_rsvp(event.id, guest, RsvpAction::Going)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
    assert!(fx.stored(event.id).await.going.is_empty());

    fx.events.invite(event.id, host.user_id, guest).await.unwrap();
    assert_eq!(
        fx.next_notification().await,
        Sent::Message {
            recipient: guest,
            title: "Event Invitation".into(),
            body: "You have been invited to the event: Career fair".into(),
        }
    );

    let stats = fx
        .events
        .update_rsvp(event.id, guest, RsvpAction::Going)
        .await
        .unwrap();
    assert_eq!(stats.user_status, UserEventStatus::Going);
    assert_eq!(stats.going_count, 1);

    let stored = fx.stored(event.id).await;
    assert_eq!(stored.going, vec![guest]);
    assert_eq!(membership(&stored, guest), 1);
    assert_eq!(
        fx.next_notification().await,
        Sent::Subscribe {
            user_id: guest,
            topic: event.id.to_string(),
        }
    );
}

#[tokio::test]
async fn invitation_to_another_event_does_not_count() {
    let fx = fixture();
    let host = Actor::student(Uuid::new_v4(), Some(fx.university));
    let first = host_event(&fx, &host, EventVisibility::Private).await;
    let second = host_event(&fx, &host, EventVisibility::Private).await;
    let guest = Uuid::new_v4();

    fx.events.invite(first.id, host.user_id, guest).await.unwrap();
    let err = fx
        .events
        .update_rsvp(second.id, guest, RsvpAction::Interested)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
}

#[tokio::test]
async fn changing_rsvp_moves_the_user() {
    let fx = fixture();
    let host = Actor::student(Uuid::new_v4(), Some(fx.university));
    let event = host_event(&fx, &host, EventVisibility::Public).await;
    let user = Uuid::new_v4();

    fx.events
        .update_rsvp(event.id, user, RsvpAction::Interested)
        .await
        .unwrap();
    let stored = fx.stored(event.id).await;
    assert_eq!(stored.interested, vec![user]);

    let stats = fx
        .events
        .update_rsvp(event.id, user, RsvpAction::Going)
        .await
        .unwrap();
    assert_eq!(stats.interested_count, 0);
    assert_eq!(stats.going_count, 1);

    let stored = fx.stored(event.id).await;
    assert!(stored.interested.is_empty());
    assert_eq!(stored.going, vec![user]);

    for action in [
        RsvpAction::NotInterested,
        RsvpAction::Going,
        RsvpAction::Going,
        RsvpAction::Interested,
    ] {
        fx.events.update_rsvp(event.id, user, action).await.unwrap();
        assert_eq!(membership(&fx.stored(event.id).await, user), 1);
    }
}

#[tokio::test]
async fn cancelled_event_refuses_rsvps_and_invites() {
    let fx = fixture();
    let host = Actor::student(Uuid::new_v4(), Some(fx.university));
    let event = host_event(&fx, &host, EventVisibility::Public).await;

    let stranger = Actor::student(Uuid::new_v4(), Some(fx.university));
    let err = fx.events.cancel_event(event.id, &stranger).await.unwrap_err();
    assert_eq!(err.kind(), "unauthorized");

    let cancelled = fx.events.cancel_event(event.id, &host).await.unwrap();
    assert_eq!(cancelled.status, EventStatus::Blocked);
    assert_eq!(cancelled.history.len(), 1);

    let err = fx
        .events
        .update_rsvp(event.id, Uuid::new_v4(), RsvpAction::Going)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_state");
    let err = fx
        .events
        .invite(event.id, host.user_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_state");

    let again = fx.events.cancel_event(event.id, &host).await.unwrap();
    assert_eq!(again.history.len(), 1);
}

#[tokio::test]
async fn company_events_wait_for_university_approval() {
    let fx = fixture();
    let company = Actor::company(Uuid::new_v4(), Role::CompanyRecruiter, Uuid::new_v4());

    let err = fx
        .events
        .create(payload(EventVisibility::Public), &company)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "bad_request");

    let mut request = payload(EventVisibility::Public);
    request.university = Some(fx.university);
    let event = fx.events.create(request, &company).await.unwrap();
    assert_eq!(event.status, EventStatus::Pending);
    assert_eq!(event.company_id, company.company_id);

    let other_uni = Actor::university(Uuid::new_v4(), Role::UniAdmin, Uuid::new_v4());
    let err = fx.events.approve_event(event.id, &other_uni).await.unwrap_err();
    assert_eq!(err.kind(), "unauthorized");

    let hosting = Actor::university(Uuid::new_v4(), Role::UniAdmin, fx.university);
    let approved = fx.events.approve_event(event.id, &hosting).await.unwrap();
    assert_eq!(approved.status, EventStatus::Approved);
    assert_eq!(fx.events.event_count(fx.university).await.unwrap(), 1);
}

#[tokio::test]
async fn company_host_cannot_self_approve_through_update() {
    let fx = fixture();
    let company = Actor::company(Uuid::new_v4(), Role::CompanyRecruiter, Uuid::new_v4());
    let mut request = payload(EventVisibility::Public);
    request.university = Some(fx.university);
    let event = fx.events.create(request, &company).await.unwrap();
    assert_eq!(event.status, EventStatus::Pending);

    let err = fx
        .events
        .update_event(
            event.id,
            UpdateEventPayload {
                status: Some(EventStatus::Approved),
                ..Default::default()
            },
            &company,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_state");

    let stored = fx.stored(event.id).await;
    assert_eq!(stored.status, EventStatus::Pending);
    assert_eq!(stored.university, fx.university);
    assert!(stored.history.is_empty());
}

#[tokio::test]
async fn update_audits_each_changed_field() {
    let fx = fixture();
    let host = Actor::student(Uuid::new_v4(), Some(fx.university));
    let event = host_event(&fx, &host, EventVisibility::Public).await;

    let update = UpdateEventPayload {
        title: Some("Spring career fair".into()),
        description: Some("Meet employers".into()),
        venue: Some("Sports centre".into()),
        visibility: Some(EventVisibility::Private),
        ..Default::default()
    };
    let updated = fx.events.update_event(event.id, update, &host).await.unwrap();
    let fields: Vec<&str> = updated
        .history
        .iter()
        .map(|h| h.changed_field.as_str())
        .collect();
    assert_eq!(fields, ["title", "venue", "visibility"]);

    let unchanged = UpdateEventPayload {
        title: Some("Spring career fair".into()),
        ..Default::default()
    };
    let same = fx.events.update_event(event.id, unchanged, &host).await.unwrap();
    assert_eq!(same.history.len(), 3);

    let outsider = Actor::student(Uuid::new_v4(), Some(fx.university));
    let err = fx
        .events
        .update_event(event.id, UpdateEventPayload::default(), &outsider)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");

    let hidden = fx.events.find_one(event.id, &outsider).await.unwrap();
    assert!(hidden.event.history.is_empty());
    let visible = fx.events.find_one(event.id, &host).await.unwrap();
    assert_eq!(visible.event.history.len(), 3);
}

#[tokio::test]
async fn listing_hides_private_and_blocked_events() {
    let fx = fixture();
    let host = Actor::student(Uuid::new_v4(), Some(fx.university));
    let open = host_event(&fx, &host, EventVisibility::Public).await;
    let private = host_event(&fx, &host, EventVisibility::Private).await;
    let cancelled = host_event(&fx, &host, EventVisibility::Public).await;
    fx.events.cancel_event(cancelled.id, &host).await.unwrap();

    let viewer = Actor::student(Uuid::new_v4(), Some(fx.university));
    let scope = EventScope {
        university_id: Some(fx.university),
        ..EventScope::default()
    };
    let listed = fx
        .events
        .find_all(EventListQuery::default(), scope, &viewer)
        .await
        .unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|v| v.event.id).collect();
    assert_eq!(ids, vec![open.id]);

    fx.events
        .invite(private.id, host.user_id, viewer.user_id)
        .await
        .unwrap();
    let listed = fx
        .events
        .find_all(EventListQuery::default(), scope, &viewer)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);

    let query = EventListQuery {
        title: Some("fair career".into()),
        ..Default::default()
    };
    assert_eq!(fx.events.find_all(query, scope, &viewer).await.unwrap().len(), 2);
    let query = EventListQuery {
        title: Some("career banquet".into()),
        ..Default::default()
    };
    assert!(fx.events.find_all(query, scope, &viewer).await.unwrap().is_empty());

    let invited = fx.events.find_invited_events(viewer.user_id).await.unwrap();
    assert_eq!(invited.len(), 1);
    assert_eq!(invited[0].event.as_ref().map(|e| e.id), Some(private.id));
}

#[tokio::test]
async fn connections_report_going_and_invited() {
    let fx = fixture();
    let host = Actor::student(Uuid::new_v4(), Some(fx.university));
    let event = host_event(&fx, &host, EventVisibility::Public).await;
    let (going, invited, neither) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    fx.events
        .update_rsvp(event.id, going, RsvpAction::Going)
        .await
        .unwrap();
    fx.events.invite(event.id, host.user_id, invited).await.unwrap();

    let statuses = fx
        .events
        .get_connections(event.id, &[going, invited, neither])
        .await
        .unwrap();
    let flags: Vec<(bool, bool)> = statuses.iter().map(|s| (s.going, s.invited)).collect();
    assert_eq!(flags, vec![(true, false), (false, true), (false, false)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rsvps_are_all_kept() {
    let fx = fixture();
    let host = Actor::student(Uuid::new_v4(), Some(fx.university));
    let event = host_event(&fx, &host, EventVisibility::Public).await;

    let users: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
    let mut handles = Vec::new();
    for user in users.clone() {
        let service = fx.events.clone();
        let event_id = event.id;
        handles.push(tokio::spawn(async move {
            service.update_rsvp(event_id, user, RsvpAction::Interested).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = fx.stored(event.id).await;
    assert_eq!(stored.interested.len(), users.len());
    for user in users {
        assert_eq!(membership(&stored, user), 1);
    }
}

#[tokio::test]
async fn reminders_go_to_events_starting_within_the_hour() {
    let mut fx = fixture();
    let host = Actor::student(Uuid::new_v4(), Some(fx.university));

    let mut soon = payload(EventVisibility::Public);
    soon.title = "Demo day".into();
    soon.start = Utc::now() + Duration::minutes(30);
    soon.end = Some(soon.start + Duration::hours(2));
    let soon = fx.events.create(soon, &host).await.unwrap();

    let mut later = payload(EventVisibility::Public);
    later.start = Utc::now() + Duration::hours(3);
    later.end = Some(later.start + Duration::hours(1));
    fx.events.create(later, &host).await.unwrap();

    let mut cancelled = payload(EventVisibility::Public);
    cancelled.start = Utc::now() + Duration::minutes(20);
    cancelled.end = Some(cancelled.start + Duration::hours(1));
    let cancelled = fx.events.create(cancelled, &host).await.unwrap();
    fx.events.cancel_event(cancelled.id, &host).await.unwrap();

    let sent = fx.events.send_reminders(Utc::now()).await.unwrap();
    assert_eq!(sent, 1);
    assert_eq!(
        fx.next_notification().await,
        Sent::Topic {
            topic: soon.id.to_string(),
            title: "Event Reminder: Demo day".to_string(),
        }
    );
}
