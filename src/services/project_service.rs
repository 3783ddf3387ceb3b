use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::dto::project_dto::{
    ApplicantWithUser, AssignGradePayload, CompletedSubmission, CreateProjectPayload,
    InProgressProject, Progress, ProjectStats, ProjectView, SubmissionProfile, SubmissionsMonth,
    SubmitTaskPayload,
};
use crate::dto::stats_dto::UniversityCount;
use crate::error::{Error, Result};
use crate::models::job::JobStatus;
use crate::models::project_applicant::{validate_grade, VirtualProjectApplicant};
use crate::models::user::{Actor, Role, UserProfile};
use crate::models::virtual_project::{ProjectTask, VirtualProject};
use crate::services::{stats, write_conflict};
use crate::store::Store;
use crate::utils::time;

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
    settings: EngineSettings,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    pub async fn create_project(
        &self,
        payload: CreateProjectPayload,
        actor: &Actor,
    ) -> Result<VirtualProject> {
        let organization_id = actor.company_id.ok_or_else(|| {
            Error::BadRequest("Only company users can publish projects".to_string())
        })?;
        if payload.tasks.is_empty() {
            return Err(Error::BadRequest("A project needs at least one task".to_string()));
        }
        if payload.tasks.iter().any(|t| t.required_submissions == 0) {
            return Err(Error::BadRequest(
                "A task needs at least one submission".to_string(),
            ));
        }

        let tasks = payload
            .tasks
            .into_iter()
            .map(|t| ProjectTask {
                id: Uuid::new_v4(),
                name: t.name,
                description: t.description,
                explanatory_vid: t.explanatory_vid,
                duration: t.duration,
                time: t.time,
                attachments: t.attachments,
                required_submissions: t.required_submissions,
            })
            .collect();

        let project = VirtualProject {
            id: Uuid::new_v4(),
            title: payload.title,
            overview: payload.overview,
            thumbnail: payload.thumbnail,
            intro_vid: payload.intro_vid,
            estimated_duration: payload.estimated_duration,
            difficulty: payload.difficulty,
            industry_type: payload.industry_type,
            status: JobStatus::Active,
            tasks,
            organization_id,
            recruiter: actor.user_id,
            approving_unis: Vec::new(),
            created_at: time::now(),
        };
        self.store.insert_project(&project).await?;
        tracing::info!(project_id = %project.id, %organization_id, tasks = project.tasks.len(), "project created");
        Ok(project)
    }

    pub async fn approve(&self, project_id: Uuid, university_id: Uuid) -> Result<()> {
        if !self
            .store
            .add_approving_university(project_id, university_id)
            .await?
        {
            return Err(Error::NotFound("Project not found".to_string()));
        }
        tracing::info!(%project_id, %university_id, "project approved by university");
        Ok(())
    }

    pub async fn apply(&self, project_id: Uuid, user_id: Uuid) -> Result<VirtualProjectApplicant> {
        let project = self.load_project(project_id).await?;
        if project.status != JobStatus::Active {
            return Err(Error::InvalidState(
                "This project is not accepting applicants".to_string(),
            ));
        }
        let applicant = VirtualProjectApplicant::new(project_id, user_id, time::now());
        self.store.insert_applicant(&applicant).await?;
        tracing::info!(applicant_id = %applicant.id, %project_id, %user_id, "applied to project");
        Ok(applicant)
    }

    /// Appends submissions to one task. The cap check and the write happen
    /// against the same version, so concurrent submitters cannot jointly
    /// overshoot `requiredSubmissions`.
    pub async fn submit_task(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        payload: SubmitTaskPayload,
    ) -> Result<VirtualProjectApplicant> {
        let project = self.load_project(project_id).await?;

        for attempt in 0..=self.settings.write_retry_limit {
            let mut applicant = self
                .store
                .find_applicant(project_id, user_id)
                .await?
                .ok_or_else(|| {
                    Error::BadRequest("You are not assigned to this project".to_string())
                })?;

            let expected = applicant.version;
            applicant.submit(&project, payload.task_id, &payload.submissions, time::now())?;
            if self.store.save_applicant(&applicant, expected).await? {
                applicant.version = expected + 1;
                tracing::info!(
                    applicant_id = %applicant.id,
                    task_id = %payload.task_id,
                    files = payload.submissions.len(),
                    completed = applicant.status,
                    "task submission recorded"
                );
                return Ok(applicant);
            }
            tracing::debug!(applicant_id = %applicant.id, attempt, "applicant changed underneath, retrying");
        }
        Err(write_conflict("Applicant", project_id))
    }

    pub async fn assign_grade(
        &self,
        applicant_id: Uuid,
        payload: AssignGradePayload,
        actor: &Actor,
    ) -> Result<VirtualProjectApplicant> {
        validate_grade(payload.grade)?;

        for attempt in 0..=self.settings.write_retry_limit {
            let mut applicant = self.load_applicant(applicant_id).await?;
            let project = self.load_project(applicant.project_id).await?;
            if actor.company_id != Some(project.organization_id) {
                tracing::warn!(%applicant_id, user_id = %actor.user_id, "grading denied, project owned elsewhere");
                return Err(Error::Unauthorized(
                    "You can not grade this application".to_string(),
                ));
            }

            let expected = applicant.version;
            applicant.assign_grade(payload.task_id, payload.grade, actor.user_id, time::now())?;
            if self.store.save_applicant(&applicant, expected).await? {
                applicant.version = expected + 1;
                tracing::info!(%applicant_id, task_id = %payload.task_id, grade = payload.grade, "task graded");
                return Ok(applicant);
            }
            tracing::debug!(%applicant_id, attempt, "applicant changed underneath, retrying");
        }
        Err(write_conflict("Applicant", applicant_id))
    }

    /// Companies see every applicant of a project they own. University staff
    /// only see applicants enrolled at their university.
    pub async fn get_applicants(
        &self,
        project_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<ApplicantWithUser>> {
        let project = self.load_project(project_id).await?;
        if actor.role.is_company_entity() && actor.company_id != Some(project.organization_id) {
            return Err(Error::Unauthorized("You do not own this project".to_string()));
        }

        let applicants = self.store.applicants_for_projects(&[project_id]).await?;
        let users = self.users_by_id(&applicants).await?;

        let university_filter = actor
            .role
            .is_university_entity()
            .then_some(actor.university_id);
        Ok(applicants
            .into_iter()
            .filter_map(|applicant| {
                let user = users.get(&applicant.user_id).cloned();
                match university_filter {
                    Some(uni) => {
                        let enrolled = user.as_ref().map_or(false, |u| {
                            uni.is_some() && u.university_id == uni
                        });
                        enrolled.then_some(ApplicantWithUser { applicant, user })
                    }
                    None => Some(ApplicantWithUser { applicant, user }),
                }
            })
            .collect())
    }

    pub async fn get_applicant(
        &self,
        applicant_id: Uuid,
        actor: &Actor,
    ) -> Result<VirtualProjectApplicant> {
        let applicant = self.load_applicant(applicant_id).await?;

        if actor.role.is_company_entity() {
            let project = self.load_project(applicant.project_id).await?;
            if actor.company_id != Some(project.organization_id) {
                return Err(Error::Unauthorized("You do not own this project".to_string()));
            }
        } else if actor.role.is_university_entity() {
            let user = self.store.get_user(applicant.user_id).await?;
            let enrolled = user
                .and_then(|u| u.university_id)
                .map_or(false, |uni| actor.university_id == Some(uni));
            if !enrolled {
                return Err(Error::Unauthorized("You do not own this applicant".to_string()));
            }
        } else if actor.role == Role::Student && applicant.user_id != actor.user_id {
            return Err(Error::Unauthorized(
                "You can only view your own applications".to_string(),
            ));
        }
        Ok(applicant)
    }

    /// Students get their own progress alongside the project. Only the owning
    /// company sees which universities approved it.
    pub async fn find_one(&self, project_id: Uuid, actor: &Actor) -> Result<ProjectView> {
        let mut project = self.load_project(project_id).await?;

        if actor.role.is_company_entity() {
            if actor.company_id != Some(project.organization_id) {
                return Err(Error::Unauthorized("You do not own this project".to_string()));
            }
            return Ok(ProjectView {
                project,
                applicant: None,
                progress: None,
            });
        }

        if actor.role == Role::Student
            && !actor
                .university_id
                .map_or(false, |uni| project.is_approved_by(uni))
        {
            return Err(Error::Unauthorized(
                "Your university has not approved this project".to_string(),
            ));
        }
        project.approving_unis.clear();

        if actor.role != Role::Student {
            return Ok(ProjectView {
                project,
                applicant: None,
                progress: None,
            });
        }

        let applicant = self
            .store
            .find_applicant(project_id, actor.user_id)
            .await?;
        let progress = applicant.as_ref().map(|a| Progress {
            completed: a.completed_tasks(),
            total: project.tasks.len(),
        });
        Ok(ProjectView {
            project,
            applicant,
            progress,
        })
    }

    /// Projects visible to the actor: a company's own projects, or the ones
    /// the actor's university approved.
    pub async fn list(
        &self,
        actor: &Actor,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<VirtualProject>> {
        let (skip, limit) = self.settings.paginate(page, limit);
        if let Some(company_id) = actor.company_id {
            let projects = self
                .store
                .projects_for_organization(company_id, None)
                .await?;
            return Ok(projects.into_iter().skip(skip).take(limit).collect());
        }
        let university_id = actor
            .university_id
            .ok_or_else(|| Error::BadRequest("You are not enrolled at a university".to_string()))?;
        let mut projects = self
            .store
            .projects_approved_by(university_id, skip, limit)
            .await?;
        for project in &mut projects {
            project.approving_unis.clear();
        }
        Ok(projects)
    }

    /// The student's projects with task progress, newest application first.
    pub async fn find_in_progress(
        &self,
        user_id: Uuid,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<InProgressProject>> {
        let (skip, limit) = self.settings.paginate(page, limit);
        let applicants = self.store.applicants_for_user(user_id, skip, limit).await?;

        let mut out = Vec::with_capacity(applicants.len());
        for applicant in applicants {
            let Some(project) = self.store.get_project(applicant.project_id).await? else {
                tracing::warn!(applicant_id = %applicant.id, "applicant references a missing project");
                continue;
            };
            out.push(InProgressProject {
                applicant_id: applicant.id,
                project_id: project.id,
                completed: applicant.completed_tasks(),
                total: project.tasks.len(),
                title: project.title,
                estimated_duration: project.estimated_duration,
                status: project.status,
                organization_id: project.organization_id,
                difficulty: project.difficulty,
            });
        }
        Ok(out)
    }

    /// Finished submissions across the company's projects, most recent first.
    pub async fn completed_projects(
        &self,
        company_id: Uuid,
        recruiter_id: Option<Uuid>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<CompletedSubmission>> {
        let mut completed: Vec<VirtualProjectApplicant> = self
            .company_applicants(company_id, recruiter_id)
            .await?
            .into_iter()
            .filter(|a| a.status)
            .collect();
        completed.sort_by(|a, b| b.submission_date.cmp(&a.submission_date));

        let (skip, limit) = self.settings.paginate(page, limit);
        let completed: Vec<VirtualProjectApplicant> =
            completed.into_iter().skip(skip).take(limit).collect();

        let users = self.users_by_id(&completed).await?;
        let uni_ids: Vec<Uuid> = users
            .values()
            .filter_map(|u| u.university_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let uni_names: HashMap<Uuid, String> = self
            .store
            .get_universities(&uni_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        Ok(completed
            .into_iter()
            .map(|a| {
                let user = users.get(&a.user_id);
                CompletedSubmission {
                    applicant_id: a.id,
                    project_id: a.project_id,
                    user_id: a.user_id,
                    first_name: user.map(|u| u.first_name.clone()),
                    last_name: user.map(|u| u.last_name.clone()),
                    profile_picture: user.and_then(|u| u.profile_picture.clone()),
                    university: user
                        .and_then(|u| u.university_id)
                        .and_then(|uni| uni_names.get(&uni).cloned()),
                    submission_date: a.submission_date,
                }
            })
            .collect())
    }

    pub async fn top_unis(
        &self,
        company_id: Uuid,
        recruiter_id: Option<Uuid>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<UniversityCount>> {
        let applicants = self.company_applicants(company_id, recruiter_id).await?;
        let applicant_ids: Vec<Uuid> = applicants.iter().map(|a| a.user_id).collect();

        let users: Vec<UserProfile> = self.users_by_id(&applicants).await?.into_values().collect();
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

    pub async fn submission_in_month(
        &self,
        company_id: Uuid,
        recruiter_id: Option<Uuid>,
        month: u32,
        year: i32,
    ) -> Result<SubmissionsMonth> {
        let (start, end) = time::month_window(year, month)?;
        let applicants = self.company_applicants(company_id, recruiter_id).await?;
        Ok(SubmissionsMonth {
            applications_by_day: stats::per_day(
                applicants.iter().map(|a| a.created_at),
                start,
                end,
            ),
            completed: stats::per_day(
                applicants
                    .iter()
                    .filter(|a| a.status)
                    .filter_map(|a| a.submission_date),
                start,
                end,
            ),
        })
    }

    pub async fn get_stats(&self, company_id: Uuid) -> Result<ProjectStats> {
        let projects = self
            .store
            .projects_for_organization(company_id, None)
            .await?;
        let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let applicants = self.store.applicants_for_projects(&ids).await?;

        Ok(ProjectStats {
            total_projects: projects.len(),
            active_projects: projects
                .iter()
                .filter(|p| p.status == JobStatus::Active)
                .count(),
            expired_projects: projects
                .iter()
                .filter(|p| p.status == JobStatus::Expired)
                .count(),
            total_applications: applicants.len(),
            completed_applications: applicants.iter().filter(|a| a.status).count(),
        })
    }

    pub async fn find_and_expire(&self, before: DateTime<Utc>) -> Result<u64> {
        let expired = self.store.expire_projects_before(before).await?;
        if expired > 0 {
            tracing::info!(expired, cutoff = %before, "projects expired");
        }
        Ok(expired)
    }

    pub async fn submission_profile(
        &self,
        applicant_id: Uuid,
        actor: &Actor,
    ) -> Result<SubmissionProfile> {
        let submission = self
            .store
            .get_applicant(applicant_id)
            .await?
            .ok_or_else(|| Error::NotFound("Submission not found".to_string()))?;
        let project = self.load_project(submission.project_id).await?;
        if actor.company_id != Some(project.organization_id) {
            return Err(Error::Unauthorized(
                "Sorry you are not authorized to view this application".to_string(),
            ));
        }
        let profile = self.store.get_user(submission.user_id).await?;
        Ok(SubmissionProfile {
            submission,
            profile,
        })
    }

    async fn load_project(&self, id: Uuid) -> Result<VirtualProject> {
        self.store
            .get_project(id)
            .await?
            .ok_or_else(|| Error::NotFound("Project not found".to_string()))
    }

    async fn load_applicant(&self, id: Uuid) -> Result<VirtualProjectApplicant> {
        self.store
            .get_applicant(id)
            .await?
            .ok_or_else(|| Error::NotFound("Applicant not found".to_string()))
    }

    async fn company_applicants(
        &self,
        company_id: Uuid,
        recruiter_id: Option<Uuid>,
    ) -> Result<Vec<VirtualProjectApplicant>> {
        let ids: Vec<Uuid> = self
            .store
            .projects_for_organization(company_id, recruiter_id)
            .await?
            .iter()
            .map(|p| p.id)
            .collect();
        self.store.applicants_for_projects(&ids).await
    }

    async fn users_by_id(
        &self,
        applicants: &[VirtualProjectApplicant],
    ) -> Result<HashMap<Uuid, UserProfile>> {
        let ids: Vec<Uuid> = applicants
            .iter()
            .map(|a| a.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        Ok(self
            .store
            .get_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect())
    }
}
