//! Persistence seams for the workflow engines.
//!
//! Implemented by [`postgres::PgStore`] and [`memory::MemoryStore`] (tests and
//! local runs). Mutable documents are written back with `save_*`, which is a
//! compare-and-set on `version`: it returns `false` when another writer got
//! there first and leaves the stored row untouched.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    application::{Application, ApplicationStage},
    event::{Event, EventInvitation, EventType, EventVisibility, EventStatus},
    job::Job,
    project_applicant::VirtualProjectApplicant,
    user::{University, UserProfile},
    virtual_project::VirtualProject,
};

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &Job) -> Result<()>;

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>>;

    async fn job_ids(&self, company_id: Uuid, recruiter_id: Option<Uuid>) -> Result<Vec<Uuid>>;

    /// Atomic `applicants += 1`. Returns `false` when the job is gone.
    async fn increment_applicants(&self, job_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>>;

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>>;

    async fn get_universities(&self, ids: &[Uuid]) -> Result<Vec<University>>;
}

/// Filter over applications. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ApplicationQuery {
    pub job_ids: Option<Vec<Uuid>>,
    pub user_id: Option<Uuid>,
    pub stage: Option<ApplicationStage>,
}

impl ApplicationQuery {
    pub fn for_jobs(job_ids: Vec<Uuid>) -> Self {
        Self {
            job_ids: Some(job_ids),
            ..Default::default()
        }
    }

    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, app: &Application) -> bool {
        self.job_ids.as_ref().map_or(true, |ids| ids.contains(&app.job_id))
            && self.user_id.map_or(true, |u| app.user_id == u)
            && self.stage.map_or(true, |s| app.stage == s)
    }
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Fails with `BadRequest` when the user already applied to the job.
    async fn insert_application(&self, app: &Application) -> Result<()>;

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>>;

    async fn find_application(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<Application>>;

    async fn find_applications(&self, query: &ApplicationQuery) -> Result<Vec<Application>>;

    /// Newest first, plus the total number of matches.
    async fn list_applications(
        &self,
        query: &ApplicationQuery,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<Application>, i64)>;

    async fn save_application(&self, app: &Application, expected_version: i64) -> Result<bool>;

    async fn delete_user_applications(&self, user_id: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, project: &VirtualProject) -> Result<()>;

    async fn get_project(&self, id: Uuid) -> Result<Option<VirtualProject>>;

    async fn projects_for_organization(
        &self,
        organization_id: Uuid,
        recruiter_id: Option<Uuid>,
    ) -> Result<Vec<VirtualProject>>;

    async fn projects_approved_by(
        &self,
        university_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<VirtualProject>>;

    /// Idempotent set-insert. Returns `false` when the project is gone.
    async fn add_approving_university(&self, project_id: Uuid, university_id: Uuid)
        -> Result<bool>;

    /// Marks every non-expired project created before `cutoff` as expired.
    async fn expire_projects_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Fails with `BadRequest` when the user already applied to the project.
    async fn insert_applicant(&self, applicant: &VirtualProjectApplicant) -> Result<()>;

    async fn get_applicant(&self, id: Uuid) -> Result<Option<VirtualProjectApplicant>>;

    async fn find_applicant(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<VirtualProjectApplicant>>;

    async fn applicants_for_projects(
        &self,
        project_ids: &[Uuid],
    ) -> Result<Vec<VirtualProjectApplicant>>;

    async fn applicants_for_user(
        &self,
        user_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<VirtualProjectApplicant>>;

    async fn save_applicant(
        &self,
        applicant: &VirtualProjectApplicant,
        expected_version: i64,
    ) -> Result<bool>;
}

/// Listing filter for events. Blocked events never match, and non-public
/// events only match when their id is in `invited_event_ids`.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub invited_event_ids: Vec<Uuid>,
    /// Every whitespace separated word must appear in the title, ignoring case.
    pub title: Option<String>,
    pub starts_after: Option<DateTime<Utc>>,
    pub ends_before: Option<DateTime<Utc>>,
    pub host: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub university_id: Option<Uuid>,
    pub event_type: Option<EventType>,
}

impl EventQuery {
    pub fn title_words(&self) -> Vec<String> {
        self.title
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }

    pub fn matches(&self, event: &Event) -> bool {
        if event.status == EventStatus::Blocked {
            return false;
        }
        if event.visibility != EventVisibility::Public
            && !self.invited_event_ids.contains(&event.id)
        {
            return false;
        }
        let title = event.title.to_lowercase();
        self.title_words().iter().all(|w| title.contains(w.as_str()))
            && self.starts_after.map_or(true, |s| event.start >= s)
            && self
                .ends_before
                .map_or(true, |e| event.end.map_or(false, |end| end <= e))
            && self.host.map_or(true, |h| event.host == h)
            && self.company_id.map_or(true, |c| event.company_id == Some(c))
            && self.university_id.map_or(true, |u| event.university == u)
            && self.event_type.map_or(true, |t| event.event_type == t)
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: &Event) -> Result<()>;

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>>;

    async fn save_event(&self, event: &Event, expected_version: i64) -> Result<bool>;

    async fn delete_event(&self, id: Uuid) -> Result<bool>;

    /// Oldest start first.
    async fn list_events(&self, query: &EventQuery, skip: usize, limit: usize)
        -> Result<Vec<Event>>;

    async fn count_university_events(&self, university_id: Uuid) -> Result<i64>;

    /// Events that are not blocked and start within `[from, to)`.
    async fn events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    async fn insert_invitation(&self, invitation: &EventInvitation) -> Result<()>;

    async fn has_invitation(&self, event_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn invitations_for_user(&self, user_id: Uuid) -> Result<Vec<EventInvitation>>;

    async fn invitations_for_event(&self, event_id: Uuid) -> Result<Vec<EventInvitation>>;
}

/// Everything the engines need from storage.
pub trait Store: JobStore + UserStore + ApplicationStore + ProjectStore + EventStore {}

impl<T> Store for T where T: JobStore + UserStore + ApplicationStore + ProjectStore + EventStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(title: &str, visibility: EventVisibility) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            event_type: EventType::Virtual,
            visibility,
            start: Utc::now(),
            end: Some(Utc::now() + Duration::hours(2)),
            host: Uuid::new_v4(),
            company_id: None,
            university: Uuid::new_v4(),
            venue: None,
            event_link: Some("https://meet.example/x".into()),
            interested: vec![],
            going: vec![],
            not_interested: vec![],
            cover_photo: "c.png".into(),
            status: EventStatus::Approved,
            history: vec![],
            created_at: Utc::now(),
            version: 0,
        }
    }

    #[test]
    fn private_events_need_invitation() {
        let ev = event("Hack night", EventVisibility::Private);
        assert!(!EventQuery::default().matches(&ev));
        let query = EventQuery {
            invited_event_ids: vec![ev.id],
            ..Default::default()
        };
        assert!(query.matches(&ev));
    }

    #[test]
    fn blocked_events_never_match() {
        let mut ev = event("Hack night", EventVisibility::Public);
        ev.status = EventStatus::Blocked;
        let query = EventQuery {
            invited_event_ids: vec![ev.id],
            ..Default::default()
        };
        assert!(!query.matches(&ev));
    }

    #[test]
    fn title_filter_needs_every_word() {
        let ev = event("Rust Systems Meetup", EventVisibility::Public);
        let q = |t: &str| EventQuery {
            title: Some(t.to_string()),
            ..Default::default()
        };
        assert!(q("rust meetup").matches(&ev));
        assert!(q("  SYSTEMS ").matches(&ev));
        assert!(!q("rust conference").matches(&ev));
    }
}
