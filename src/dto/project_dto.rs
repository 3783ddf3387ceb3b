use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::stats_dto::DayCount;
use crate::models::job::JobStatus;
use crate::models::project_applicant::VirtualProjectApplicant;
use crate::models::user::UserProfile;
use crate::models::virtual_project::VirtualProject;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    #[validate(length(min = 1, message = "Task name cannot be empty"))]
    pub name: String,
    pub description: String,
    pub explanatory_vid: Option<String>,
    #[validate(length(min = 1))]
    pub duration: String,
    pub time: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[validate(range(min = 1, message = "A task needs at least one submission"))]
    pub required_submissions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectPayload {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    #[validate(length(min = 1))]
    pub overview: String,
    #[validate(length(min = 1))]
    pub thumbnail: String,
    pub intro_vid: Option<String>,
    #[validate(length(min = 1))]
    pub estimated_duration: String,
    pub difficulty: Option<String>,
    #[validate(length(min = 1))]
    pub industry_type: String,
    #[validate(length(min = 1, message = "A project needs at least one task"))]
    #[validate(nested)]
    pub tasks: Vec<CreateTaskPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTaskPayload {
    #[serde(rename = "taskID")]
    pub task_id: Uuid,
    #[validate(length(min = 1, message = "No submissions provided"))]
    pub submissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignGradePayload {
    #[serde(rename = "taskID")]
    pub task_id: Uuid,
    #[validate(range(min = 0.0, max = 5.0))]
    pub grade: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub project: VirtualProject,
    /// Only present for students who applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<VirtualProjectApplicant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListResponse {
    pub projects: Vec<VirtualProject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantWithUser {
    pub applicant: VirtualProjectApplicant,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantListResponse {
    pub applicants: Vec<ApplicantWithUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantResponse {
    pub applicant: VirtualProjectApplicant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InProgressProject {
    #[serde(rename = "_id")]
    pub applicant_id: Uuid,
    #[serde(rename = "projectID")]
    pub project_id: Uuid,
    pub title: String,
    pub estimated_duration: String,
    pub status: JobStatus,
    #[serde(rename = "organizationID")]
    pub organization_id: Uuid,
    pub difficulty: Option<String>,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSubmission {
    #[serde(rename = "_id")]
    pub applicant_id: Uuid,
    #[serde(rename = "projectID")]
    pub project_id: Uuid,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub university: Option<String>,
    pub submission_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub expired_projects: usize,
    pub total_applications: usize,
    pub completed_applications: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionsMonth {
    pub applications_by_day: Vec<DayCount>,
    pub completed: Vec<DayCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionProfile {
    pub submission: VirtualProjectApplicant,
    pub profile: Option<UserProfile>,
}
