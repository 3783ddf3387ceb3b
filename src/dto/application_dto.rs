use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::stats_dto::{DayCount, MonthlyCount, StageCounts};
use crate::models::application::{Application, ApplicationStage};
use crate::models::job::Job;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub job: Job,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationPayload {
    #[serde(rename = "jobID")]
    pub job_id: Uuid,
    #[validate(length(min = 1, message = "Resume is required"))]
    pub resume: String,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InterviewPayload {
    pub interview_date: DateTime<Utc>,
    #[validate(length(min = 1, message = "Interview venue cannot be empty"))]
    pub interview_venue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RatePayload {
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub stage: Option<ApplicationStage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationPage {
    pub items: Vec<Application>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub application: Application,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<Application>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyApplicationStats {
    pub total_jobs: usize,
    pub applications: StageCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationsMonth {
    pub applications_by_day: Vec<DayCount>,
    pub interviewed: Vec<DayCount>,
}

/// Per-month activity of one student, calendar order, empty months omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationGraph {
    pub created: Vec<MonthlyCount>,
    pub shortlisted: Vec<MonthlyCount>,
    pub interviewed: Vec<MonthlyCount>,
}
