use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Expired,
    #[default]
    Pending,
    Blocked,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Expired => "expired",
            JobStatus::Pending => "pending",
            JobStatus::Blocked => "blocked",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(JobStatus::Active),
            "expired" => Ok(JobStatus::Expired),
            "pending" => Ok(JobStatus::Pending),
            "blocked" => Ok(JobStatus::Blocked),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "companyID")]
    pub company_id: Uuid,
    /// Recruiter who posted the job.
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub title: String,
    pub status: JobStatus,
    pub applicants: i64,
    pub created_at: DateTime<Utc>,
}
