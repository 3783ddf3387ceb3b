use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::audit::{AuditEntry, Audited};
use crate::models::virtual_project::VirtualProject;

pub const MAX_GRADE: f64 = 5.0;

/// A student's progress on one task of a project. Created lazily on the first
/// submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantTask {
    #[serde(rename = "taskID")]
    pub task_id: Uuid,
    pub status: bool,
    pub submissions: Vec<String>,
    pub grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualProjectApplicant {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    #[serde(rename = "projectID")]
    pub project_id: Uuid,
    /// True once every task of the project is complete.
    pub status: bool,
    pub tasks: Vec<ApplicantTask>,
    pub submission_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub history: Vec<AuditEntry>,
    pub version: i64,
}

impl Audited for VirtualProjectApplicant {
    fn history(&self) -> &[AuditEntry] {
        &self.history
    }

    fn history_mut(&mut self) -> &mut Vec<AuditEntry> {
        &mut self.history
    }
}

pub fn validate_grade(grade: f64) -> Result<()> {
    if !(0.0..=MAX_GRADE).contains(&grade) {
        return Err(Error::BadRequest(format!(
            "Grade must be between 0 and {}",
            MAX_GRADE
        )));
    }
    Ok(())
}

impl VirtualProjectApplicant {
    pub fn new(project_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            project_id,
            status: false,
            tasks: Vec::new(),
            submission_date: None,
            created_at: now,
            history: Vec::new(),
            version: 0,
        }
    }

    pub fn task(&self, task_id: Uuid) -> Option<&ApplicantTask> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.status).count()
    }

    /// Appends `files` to the task's submissions. The cap is checked before
    /// anything is appended, so a rejected call leaves the applicant untouched.
    pub fn submit(
        &mut self,
        project: &VirtualProject,
        task_id: Uuid,
        files: &[String],
        now: DateTime<Utc>,
    ) -> Result<()> {
        if files.is_empty() {
            return Err(Error::BadRequest("No submissions provided".to_string()));
        }
        let required = project
            .task(task_id)
            .ok_or_else(|| Error::NotFound("Task not found".to_string()))?
            .required_submissions as usize;

        let existing = self.task(task_id);
        let already = existing.map(|t| t.submissions.len()).unwrap_or(0);
        if existing.map(|t| t.status).unwrap_or(false) {
            return Err(Error::InvalidState("Task already submitted".to_string()));
        }
        if already == required {
            return Err(Error::InvalidState(
                "You have already submitted the maximum number of submissions".to_string(),
            ));
        }
        if required < already + files.len() {
            return Err(Error::InvalidState(
                "You are submitting more than the required number of submissions".to_string(),
            ));
        }

        let idx = match self.tasks.iter().position(|t| t.task_id == task_id) {
            Some(idx) => idx,
            None => {
                self.tasks.push(ApplicantTask {
                    task_id,
                    status: false,
                    submissions: Vec::new(),
                    grade: None,
                });
                self.tasks.len() - 1
            }
        };
        let task = &mut self.tasks[idx];
        task.submissions.extend(files.iter().cloned());
        if task.submissions.len() == required {
            task.status = true;
        }

        if !self.status && self.covers_all_tasks(project) {
            self.status = true;
            self.submission_date = Some(now);
        }
        Ok(())
    }

    /// Every task defined on the project has a completed entry here.
    pub fn covers_all_tasks(&self, project: &VirtualProject) -> bool {
        project
            .tasks
            .iter()
            .all(|def| self.task(def.id).map(|t| t.status).unwrap_or(false))
    }

    pub fn assign_grade(
        &mut self,
        task_id: Uuid,
        grade: f64,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        validate_grade(grade)?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| Error::NotFound("Task not found".to_string()))?;
        if !task.status {
            return Err(Error::InvalidState(
                "Task not yet submitted for grading".to_string(),
            ));
        }
        task.grade = Some(grade);
        self.record(format!("Graded TASK: {}", task_id), grade, actor_id, now);
        Ok(())
    }
}
