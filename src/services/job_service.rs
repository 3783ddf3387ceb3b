use std::sync::Arc;
use uuid::Uuid;

use crate::dto::application_dto::CreateJobPayload;
use crate::error::{Error, Result};
use crate::models::job::{Job, JobStatus};
use crate::models::user::Actor;
use crate::store::Store;
use crate::utils::time;

/// Job lookups used for ownership checks by the application engine.
#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn Store>,
}

impl JobService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_job(&self, payload: CreateJobPayload, actor: &Actor) -> Result<Job> {
        let company_id = actor
            .company_id
            .ok_or_else(|| Error::BadRequest("Only company users can post jobs".to_string()))?;
        let job = Job {
            id: Uuid::new_v4(),
            company_id,
            user_id: actor.user_id,
            title: payload.title,
            status: JobStatus::Active,
            applicants: 0,
            created_at: time::now(),
        };
        self.store.insert_job(&job).await?;
        tracing::info!(job_id = %job.id, %company_id, "job created");
        Ok(job)
    }

    pub async fn find_job(&self, id: Uuid) -> Result<Job> {
        self.store
            .get_job(id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))
    }

    /// Jobs of a company, optionally narrowed to the ones one recruiter posted.
    pub async fn all_job_ids(&self, company_id: Uuid, recruiter_id: Option<Uuid>) -> Result<Vec<Uuid>> {
        self.store.job_ids(company_id, recruiter_id).await
    }
}
