use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ApplicationQuery, ApplicationStore, EventQuery, EventStore, JobStore, ProjectStore, UserStore,
};
use crate::error::{Error, Result};
use crate::models::{
    application::Application,
    event::{Event, EventInvitation},
    job::{Job, JobStatus},
    project_applicant::VirtualProjectApplicant,
    user::{University, UserProfile},
    virtual_project::VirtualProject,
};

/// In-process store backed by `RwLock`ed maps. Each `save_*` holds the write
/// lock across its version check and write, so it has the same
/// compare-and-set semantics as the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserProfile>>,
    universities: RwLock<HashMap<Uuid, University>>,
    jobs: RwLock<HashMap<Uuid, Job>>,
    applications: RwLock<HashMap<Uuid, Application>>,
    projects: RwLock<HashMap<Uuid, VirtualProject>>,
    applicants: RwLock<HashMap<Uuid, VirtualProjectApplicant>>,
    events: RwLock<HashMap<Uuid, Event>>,
    invitations: RwLock<Vec<EventInvitation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserProfile) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn insert_university(&self, university: University) {
        self.universities
            .write()
            .await
            .insert(university.id, university);
    }
}

fn page<T>(items: Vec<T>, skip: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(skip).take(limit).collect()
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn job_ids(&self, company_id: Uuid, recruiter_id: Option<Uuid>) -> Result<Vec<Uuid>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| j.company_id == company_id)
            .filter(|j| recruiter_id.map_or(true, |r| j.user_id == r))
            .map(|j| j.id)
            .collect())
    }

    async fn increment_applicants(&self, job_id: Uuid) -> Result<bool> {
        match self.jobs.write().await.get_mut(&job_id) {
            Some(job) => {
                job.applicants += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn get_universities(&self, ids: &[Uuid]) -> Result<Vec<University>> {
        let universities = self.universities.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| universities.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_application(&self, app: &Application) -> Result<()> {
        let mut apps = self.applications.write().await;
        if apps
            .values()
            .any(|a| a.job_id == app.job_id && a.user_id == app.user_id)
        {
            return Err(Error::BadRequest(
                "You have already applied to this job".to_string(),
            ));
        }
        apps.insert(app.id, app.clone());
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        Ok(self.applications.read().await.get(&id).cloned())
    }

    async fn find_application(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<Application>> {
        Ok(self
            .applications
            .read()
            .await
            .values()
            .find(|a| a.job_id == job_id && a.user_id == user_id)
            .cloned())
    }

    async fn find_applications(&self, query: &ApplicationQuery) -> Result<Vec<Application>> {
        let mut found: Vec<Application> = self
            .applications
            .read()
            .await
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn list_applications(
        &self,
        query: &ApplicationQuery,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<Application>, i64)> {
        let found = self.find_applications(query).await?;
        let total = found.len() as i64;
        Ok((page(found, skip, limit), total))
    }

    async fn save_application(&self, app: &Application, expected_version: i64) -> Result<bool> {
        let mut apps = self.applications.write().await;
        match apps.get_mut(&app.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = app.clone();
                stored.version = expected_version + 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_user_applications(&self, user_id: Uuid) -> Result<u64> {
        let mut apps = self.applications.write().await;
        let before = apps.len();
        apps.retain(|_, a| a.user_id != user_id);
        Ok((before - apps.len()) as u64)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, project: &VirtualProject) -> Result<()> {
        self.projects
            .write()
            .await
            .insert(project.id, project.clone());
        Ok(())
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<VirtualProject>> {
        Ok(self.projects.read().await.get(&id).cloned())
    }

    async fn projects_for_organization(
        &self,
        organization_id: Uuid,
        recruiter_id: Option<Uuid>,
    ) -> Result<Vec<VirtualProject>> {
        let mut found: Vec<VirtualProject> = self
            .projects
            .read()
            .await
            .values()
            .filter(|p| p.organization_id == organization_id)
            .filter(|p| recruiter_id.map_or(true, |r| p.recruiter == r))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn projects_approved_by(
        &self,
        university_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<VirtualProject>> {
        let mut found: Vec<VirtualProject> = self
            .projects
            .read()
            .await
            .values()
            .filter(|p| p.is_approved_by(university_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(found, skip, limit))
    }

    async fn add_approving_university(
        &self,
        project_id: Uuid,
        university_id: Uuid,
    ) -> Result<bool> {
        match self.projects.write().await.get_mut(&project_id) {
            Some(project) => {
                if !project.approving_unis.contains(&university_id) {
                    project.approving_unis.push(university_id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn expire_projects_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut expired = 0;
        for project in self.projects.write().await.values_mut() {
            if project.created_at < cutoff && project.status != JobStatus::Expired {
                project.status = JobStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn insert_applicant(&self, applicant: &VirtualProjectApplicant) -> Result<()> {
        let mut applicants = self.applicants.write().await;
        if applicants
            .values()
            .any(|a| a.project_id == applicant.project_id && a.user_id == applicant.user_id)
        {
            return Err(Error::BadRequest(
                "You have already applied to this project".to_string(),
            ));
        }
        applicants.insert(applicant.id, applicant.clone());
        Ok(())
    }

    async fn get_applicant(&self, id: Uuid) -> Result<Option<VirtualProjectApplicant>> {
        Ok(self.applicants.read().await.get(&id).cloned())
    }

    async fn find_applicant(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<VirtualProjectApplicant>> {
        Ok(self
            .applicants
            .read()
            .await
            .values()
            .find(|a| a.project_id == project_id && a.user_id == user_id)
            .cloned())
    }

    async fn applicants_for_projects(
        &self,
        project_ids: &[Uuid],
    ) -> Result<Vec<VirtualProjectApplicant>> {
        let mut found: Vec<VirtualProjectApplicant> = self
            .applicants
            .read()
            .await
            .values()
            .filter(|a| project_ids.contains(&a.project_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn applicants_for_user(
        &self,
        user_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<VirtualProjectApplicant>> {
        let mut found: Vec<VirtualProjectApplicant> = self
            .applicants
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(found, skip, limit))
    }

    async fn save_applicant(
        &self,
        applicant: &VirtualProjectApplicant,
        expected_version: i64,
    ) -> Result<bool> {
        let mut applicants = self.applicants.write().await;
        match applicants.get_mut(&applicant.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = applicant.clone();
                stored.version = expected_version + 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        self.events.write().await.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn save_event(&self, event: &Event, expected_version: i64) -> Result<bool> {
        let mut events = self.events.write().await;
        match events.get_mut(&event.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = event.clone();
                stored.version = expected_version + 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let removed = self.events.write().await.remove(&id).is_some();
        if removed {
            self.invitations.write().await.retain(|i| i.event_id != id);
        }
        Ok(removed)
    }

    async fn list_events(
        &self,
        query: &EventQuery,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Event>> {
        let mut found: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(page(found, skip, limit))
    }

    async fn count_university_events(&self, university_id: Uuid) -> Result<i64> {
        Ok(self
            .events
            .read()
            .await
            .values()
            .filter(|e| e.university == university_id)
            .count() as i64)
    }

    async fn events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let mut found: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| !e.is_blocked() && e.start >= from && e.start < to)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(found)
    }

    async fn insert_invitation(&self, invitation: &EventInvitation) -> Result<()> {
        self.invitations.write().await.push(invitation.clone());
        Ok(())
    }

    async fn has_invitation(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self
            .invitations
            .read()
            .await
            .iter()
            .any(|i| i.event_id == event_id && i.invited == user_id))
    }

    async fn invitations_for_user(&self, user_id: Uuid) -> Result<Vec<EventInvitation>> {
        Ok(self
            .invitations
            .read()
            .await
            .iter()
            .filter(|i| i.invited == user_id)
            .cloned()
            .collect())
    }

    async fn invitations_for_event(&self, event_id: Uuid) -> Result<Vec<EventInvitation>> {
        Ok(self
            .invitations
            .read()
            .await
            .iter()
            .filter(|i| i.event_id == event_id)
            .cloned()
            .collect())
    }
}
