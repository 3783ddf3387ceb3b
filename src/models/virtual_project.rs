use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobStatus;

/// A task definition embedded in a project. Immutable once the project is
/// published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTask {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub explanatory_vid: Option<String>,
    pub duration: String,
    pub time: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub required_submissions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualProject {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub overview: String,
    pub thumbnail: String,
    pub intro_vid: Option<String>,
    pub estimated_duration: String,
    pub difficulty: Option<String>,
    pub industry_type: String,
    pub status: JobStatus,
    pub tasks: Vec<ProjectTask>,
    #[serde(rename = "organizationID")]
    pub organization_id: Uuid,
    pub recruiter: Uuid,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approving_unis: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl VirtualProject {
    pub fn task(&self, task_id: Uuid) -> Option<&ProjectTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn is_approved_by(&self, university_id: Uuid) -> bool {
        self.approving_unis.contains(&university_id)
    }
}
