use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::dto::application_dto::{
    ApplicationGraph, ApplicationListQuery, ApplicationPage, ApplicationsMonth,
    CompanyApplicationStats, CreateApplicationPayload, InterviewPayload,
};
use crate::dto::stats_dto::{StageCounts, UniversityCount};
use crate::error::{Error, Result};
use crate::models::application::{validate_rating, Application, ApplicationStage};
use crate::models::user::{Actor, Role};
use crate::services::job_service::JobService;
use crate::services::{stats, write_conflict};
use crate::store::{ApplicationQuery, Store};
use crate::utils::time;

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn Store>,
    jobs: JobService,
    settings: EngineSettings,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn Store>, settings: EngineSettings) -> Self {
        Self {
            jobs: JobService::new(store.clone()),
            store,
            settings,
        }
    }

    pub async fn create(
        &self,
        payload: CreateApplicationPayload,
        user_id: Uuid,
    ) -> Result<Application> {
        if let Some(rating) = payload.rating {
            validate_rating(rating)?;
        }
        let job = self.jobs.find_job(payload.job_id).await?;

        let app = Application::new(job.id, user_id, payload.resume, payload.rating, time::now());
        self.store.insert_application(&app).await?;

        // Not linked to the insert; a lost increment only undercounts.
        match self.store.increment_applicants(job.id).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(job_id = %job.id, "job vanished before applicant count update"),
            Err(err) => tracing::warn!(job_id = %job.id, error = %err, "failed to bump applicant count"),
        }

        tracing::info!(application_id = %app.id, job_id = %job.id, %user_id, "application created");
        Ok(app)
    }

    pub async fn shortlist(&self, id: Uuid, actor: &Actor) -> Result<Application> {
        let app = self
            .mutate(id, actor, |app| app.shortlist(actor.user_id, time::now()))
            .await?;
        tracing::info!(application_id = %id, stage = %app.stage, "application shortlisted");
        Ok(app)
    }

    pub async fn interview(
        &self,
        id: Uuid,
        payload: InterviewPayload,
        actor: &Actor,
    ) -> Result<Application> {
        let app = self
            .mutate(id, actor, |app| {
                app.schedule_interview(
                    payload.interview_date,
                    payload.interview_venue.clone(),
                    actor.user_id,
                    time::now(),
                )
            })
            .await?;
        tracing::info!(application_id = %id, interview_date = %payload.interview_date, "interview scheduled");
        Ok(app)
    }

    pub async fn rate(&self, id: Uuid, rating: f64, actor: &Actor) -> Result<Application> {
        validate_rating(rating)?;
        let app = self
            .mutate(id, actor, |app| app.rate(rating, actor.user_id, time::now()))
            .await?;
        tracing::info!(application_id = %id, rating, "application rated");
        Ok(app)
    }

    pub async fn reject(&self, id: Uuid, actor: &Actor) -> Result<Application> {
        let app = self
            .mutate(id, actor, |app| app.reject(actor.user_id, time::now()))
            .await?;
        tracing::info!(application_id = %id, "application rejected");
        Ok(app)
    }

    /// Load, check ownership, apply `change`, then compare-and-set. A lost race
    /// starts over from a fresh load.
    async fn mutate<F>(&self, id: Uuid, actor: &Actor, mut change: F) -> Result<Application>
    where
        F: FnMut(&mut Application) -> Result<()> + Send,
    {
        for attempt in 0..=self.settings.write_retry_limit {
            let mut app = self.load(id).await?;
            self.ensure_company_owns(&app, actor).await?;

            let expected = app.version;
            change(&mut app)?;
            if self.store.save_application(&app, expected).await? {
                app.version = expected + 1;
                return Ok(app);
            }
            tracing::debug!(application_id = %id, attempt, "application changed underneath, retrying");
        }
        Err(write_conflict("Application", id))
    }

    async fn load(&self, id: Uuid) -> Result<Application> {
        self.store
            .get_application(id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))
    }

    async fn ensure_company_owns(&self, app: &Application, actor: &Actor) -> Result<()> {
        let job = self.jobs.find_job(app.job_id).await?;
        if actor.company_id != Some(job.company_id) {
            tracing::warn!(
                application_id = %app.id,
                user_id = %actor.user_id,
                "company does not own the application's job"
            );
            return Err(Error::Unauthorized(
                "You are not authorized to manage this application".to_string(),
            ));
        }
        Ok(())
    }

    /// Students only see their own applications; someone else's is reported
    /// as missing.
    pub async fn find_one(&self, id: Uuid, actor: &Actor) -> Result<Application> {
        let app = self.load(id).await?;
        if actor.role == Role::Student {
            if app.user_id != actor.user_id {
                return Err(Error::NotFound("Application not found".to_string()));
            }
        } else if actor.role.is_company_entity() {
            self.ensure_company_owns(&app, actor).await?;
        } else {
            return Err(Error::Forbidden(
                "Only the applicant or the hiring company can view an application".to_string(),
            ));
        }
        Ok(app)
    }

    /// A student gets their own application for the job; the owning company
    /// gets every application to it.
    pub async fn find_for_job(&self, job_id: Uuid, actor: &Actor) -> Result<Vec<Application>> {
        if actor.role == Role::Student {
            let app = self
                .store
                .find_application(job_id, actor.user_id)
                .await?
                .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
            return Ok(vec![app]);
        }

        let job = self.jobs.find_job(job_id).await?;
        if actor.role.is_company_entity() && actor.company_id != Some(job.company_id) {
            return Err(Error::Unauthorized(
                "You are not authorized to view these applications".to_string(),
            ));
        }
        self.store
            .find_applications(&ApplicationQuery::for_jobs(vec![job_id]))
            .await
    }

    pub async fn find_for_user(&self, user_id: Uuid) -> Result<Vec<Application>> {
        self.store
            .find_applications(&ApplicationQuery::for_user(user_id))
            .await
    }

    pub async fn list(&self, query: ApplicationListQuery, actor: &Actor) -> Result<ApplicationPage> {
        let mut filter = if let Some(company_id) = actor.company_id {
            ApplicationQuery::for_jobs(self.jobs.all_job_ids(company_id, None).await?)
        } else if actor.role == Role::Student {
            ApplicationQuery::for_user(actor.user_id)
        } else {
            tracing::warn!(user_id = %actor.user_id, role = ?actor.role, "application listing refused");
            return Err(Error::Forbidden(
                "Only students and company users can list applications".to_string(),
            ));
        };
        filter.stage = query.stage;

        let (skip, limit) = self.settings.paginate(query.page, query.limit);
        let (items, total) = self.store.list_applications(&filter, skip, limit).await?;
        Ok(ApplicationPage {
            items,
            total,
            page: query.page.unwrap_or(1).max(1),
            limit: limit as i64,
        })
    }

    pub async fn get_stats(&self, user_id: Uuid) -> Result<StageCounts> {
        let apps = self.find_for_user(user_id).await?;
        Ok(stats::stage_counts(&apps))
    }

    pub async fn get_stats_company(
        &self,
        company_id: Uuid,
        recruiter_id: Option<Uuid>,
    ) -> Result<CompanyApplicationStats> {
        let job_ids = self.jobs.all_job_ids(company_id, recruiter_id).await?;
        let total_jobs = job_ids.len();
        let apps = self
            .store
            .find_applications(&ApplicationQuery::for_jobs(job_ids))
            .await?;
        Ok(CompanyApplicationStats {
            total_jobs,
            applications: stats::stage_counts(&apps),
        })
    }

    pub async fn top_unis(
        &self,
        company_id: Uuid,
        recruiter_id: Option<Uuid>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<UniversityCount>> {
        let apps = self.company_applications(company_id, recruiter_id).await?;
        let applicant_ids: Vec<Uuid> = apps.iter().map(|a| a.user_id).collect();

        let unique: Vec<Uuid> = applicant_ids
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let users = self.store.get_users(&unique).await?;
        let uni_ids: Vec<Uuid> = users
            .iter()
            .filter_map(|u| u.university_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let universities = self.store.get_universities(&uni_ids).await?;

        let (skip, limit) = self.settings.paginate(page, limit);
        Ok(stats::top_universities(
            &applicant_ids,
            &users,
            &universities,
            skip,
            limit,
        ))
    }

    /// Per-day counts of new applications, and of interviews by their
    /// scheduled date, within one calendar month.
    pub async fn applications_month(
        &self,
        company_id: Uuid,
        recruiter_id: Option<Uuid>,
        month: u32,
        year: i32,
    ) -> Result<ApplicationsMonth> {
        let (start, end) = time::month_window(year, month)?;
        let apps = self.company_applications(company_id, recruiter_id).await?;

        let applications_by_day = stats::per_day(apps.iter().map(|a| a.created_at), start, end);
        let interviewed = stats::per_day(
            apps.iter()
                .filter(|a| a.stage == ApplicationStage::Interview)
                .filter_map(|a| a.interview_date),
            start,
            end,
        );
        Ok(ApplicationsMonth {
            applications_by_day,
            interviewed,
        })
    }

    pub async fn application_graph(&self, user_id: Uuid) -> Result<ApplicationGraph> {
        let apps = self.find_for_user(user_id).await?;
        Ok(ApplicationGraph {
            created: stats::per_month(apps.iter().map(|a| a.created_at)),
            shortlisted: stats::per_month(apps.iter().filter_map(|a| a.shortlist_date)),
            interviewed: stats::per_month(apps.iter().filter_map(|a| a.interview_date)),
        })
    }

    pub async fn remove_user_applications(&self, user_id: Uuid) -> Result<u64> {
        let removed = self.store.delete_user_applications(user_id).await?;
        tracing::info!(%user_id, removed, "user applications removed");
        Ok(removed)
    }

    async fn company_applications(
        &self,
        company_id: Uuid,
        recruiter_id: Option<Uuid>,
    ) -> Result<Vec<Application>> {
        let job_ids = self.jobs.all_job_ids(company_id, recruiter_id).await?;
        self.store
            .find_applications(&ApplicationQuery::for_jobs(job_ids))
            .await
    }
}
