use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use super::{
    ApplicationQuery, ApplicationStore, EventQuery, EventStore, JobStore, ProjectStore, UserStore,
};
use crate::error::{Error, Result};
use crate::models::{
    application::Application,
    audit::AuditEntry,
    event::{Event, EventInvitation},
    job::Job,
    project_applicant::{ApplicantTask, VirtualProjectApplicant},
    user::{University, UserProfile},
    virtual_project::{ProjectTask, VirtualProject},
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_column<T>(column: &str, raw: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse()
        .map_err(|e| Error::Internal(format!("corrupt {} column: {}", column, e)))
}

fn duplicate_as(err: sqlx::Error, message: &str) -> Error {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            Error::BadRequest(message.to_string())
        }
        other => other.into(),
    }
}

fn like_patterns(query: &EventQuery) -> Vec<String> {
    query
        .title_words()
        .into_iter()
        .map(|w| format!("%{}%", w.replace('%', "\\%").replace('_', "\\_")))
        .collect()
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    role: String,
    profile_picture: Option<String>,
    university_id: Option<Uuid>,
    company_id: Option<Uuid>,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            role: parse_column("users.role", &row.role)?,
            profile_picture: row.profile_picture,
            university_id: row.university_id,
            company_id: row.company_id,
        })
    }
}

#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    company_id: Uuid,
    user_id: Uuid,
    title: String,
    status: String,
    applicants: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = Error;

    fn try_from(row: JobRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            company_id: row.company_id,
            user_id: row.user_id,
            title: row.title,
            status: parse_column("jobs.status", &row.status)?,
            applicants: row.applicants,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    user_id: Uuid,
    rating: Option<f64>,
    stage: String,
    resume: String,
    shortlist_date: Option<DateTime<Utc>>,
    interview_date: Option<DateTime<Utc>>,
    interview_venue: Option<String>,
    created_at: DateTime<Utc>,
    history: Json<Vec<AuditEntry>>,
    version: i64,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = Error;

    fn try_from(row: ApplicationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            job_id: row.job_id,
            user_id: row.user_id,
            rating: row.rating,
            stage: parse_column("applications.stage", &row.stage)?,
            resume: row.resume,
            shortlist_date: row.shortlist_date,
            interview_date: row.interview_date,
            interview_venue: row.interview_venue,
            created_at: row.created_at,
            history: row.history.0,
            version: row.version,
        })
    }
}

#[derive(FromRow)]
struct ProjectRow {
    id: Uuid,
    title: String,
    overview: String,
    thumbnail: String,
    intro_vid: Option<String>,
    estimated_duration: String,
    difficulty: Option<String>,
    industry_type: String,
    status: String,
    tasks: Json<Vec<ProjectTask>>,
    organization_id: Uuid,
    recruiter: Uuid,
    approving_unis: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for VirtualProject {
    type Error = Error;

    fn try_from(row: ProjectRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            title: row.title,
            overview: row.overview,
            thumbnail: row.thumbnail,
            intro_vid: row.intro_vid,
            estimated_duration: row.estimated_duration,
            difficulty: row.difficulty,
            industry_type: row.industry_type,
            status: parse_column("virtual_projects.status", &row.status)?,
            tasks: row.tasks.0,
            organization_id: row.organization_id,
            recruiter: row.recruiter,
            approving_unis: row.approving_unis,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ApplicantRow {
    id: Uuid,
    user_id: Uuid,
    project_id: Uuid,
    status: bool,
    tasks: Json<Vec<ApplicantTask>>,
    submission_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    history: Json<Vec<AuditEntry>>,
    version: i64,
}

impl From<ApplicantRow> for VirtualProjectApplicant {
    fn from(row: ApplicantRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            project_id: row.project_id,
            status: row.status,
            tasks: row.tasks.0,
            submission_date: row.submission_date,
            created_at: row.created_at,
            history: row.history.0,
            version: row.version,
        }
    }
}

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    event_type: String,
    visibility: String,
    start_at: DateTime<Utc>,
    end_at: Option<DateTime<Utc>>,
    host: Uuid,
    company_id: Option<Uuid>,
    university: Uuid,
    venue: Option<String>,
    event_link: Option<String>,
    interested: Vec<Uuid>,
    going: Vec<Uuid>,
    not_interested: Vec<Uuid>,
    cover_photo: String,
    status: String,
    history: Json<Vec<AuditEntry>>,
    created_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = Error;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            event_type: parse_column("events.event_type", &row.event_type)?,
            visibility: parse_column("events.visibility", &row.visibility)?,
            start: row.start_at,
            end: row.end_at,
            host: row.host,
            company_id: row.company_id,
            university: row.university,
            venue: row.venue,
            event_link: row.event_link,
            interested: row.interested,
            going: row.going,
            not_interested: row.not_interested,
            cover_photo: row.cover_photo,
            status: parse_column("events.status", &row.status)?,
            history: row.history.0,
            created_at: row.created_at,
            version: row.version,
        })
    }
}

#[derive(FromRow)]
struct InvitationRow {
    id: Uuid,
    status: String,
    event_id: Uuid,
    invited_by: Uuid,
    invited: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvitationRow> for EventInvitation {
    type Error = Error;

    fn try_from(row: InvitationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            status: parse_column("event_invitations.status", &row.status)?,
            event_id: row.event_id,
            invited_by: row.invited_by,
            invited: row.invited,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = Error>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, company_id, user_id, title, status, applicants, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(job.id)
        .bind(job.company_id)
        .bind(job.user_id)
        .bind(&job.title)
        .bind(job.status.as_str())
        .bind(job.applicants)
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Job::try_from).transpose()
    }

    async fn job_ids(&self, company_id: Uuid, recruiter_id: Option<Uuid>) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM jobs
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR user_id = $2)
            "#,
        )
        .bind(company_id)
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn increment_applicants(&self, job_id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE jobs SET applicants = applicants + 1 WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserProfile::try_from).transpose()
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn get_universities(&self, ids: &[Uuid]) -> Result<Vec<University>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM universities WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| University { id, name })
            .collect())
    }
}

const APPLICATION_FILTER: &str = r#"
    WHERE ($1::uuid[] IS NULL OR job_id = ANY($1))
      AND ($2::uuid IS NULL OR user_id = $2)
      AND ($3::text IS NULL OR stage = $3)
"#;

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert_application(&self, app: &Application) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO applications (
                id, job_id, user_id, rating, stage, resume, shortlist_date,
                interview_date, interview_venue, created_at, history, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(app.id)
        .bind(app.job_id)
        .bind(app.user_id)
        .bind(app.rating)
        .bind(app.stage.as_str())
        .bind(&app.resume)
        .bind(app.shortlist_date)
        .bind(app.interview_date)
        .bind(&app.interview_venue)
        .bind(app.created_at)
        .bind(Json(&app.history))
        .bind(app.version)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_as(e, "You have already applied to this job"))?;
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Application::try_from).transpose()
    }

    async fn find_application(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE job_id = $1 AND user_id = $2",
        )
        .bind(job_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Application::try_from).transpose()
    }

    async fn find_applications(&self, query: &ApplicationQuery) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT * FROM applications {} ORDER BY created_at DESC",
            APPLICATION_FILTER
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(query.job_ids.as_deref())
            .bind(query.user_id)
            .bind(query.stage.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn list_applications(
        &self,
        query: &ApplicationQuery,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<Application>, i64)> {
        let sql = format!(
            "SELECT * FROM applications {} ORDER BY created_at DESC OFFSET $4 LIMIT $5",
            APPLICATION_FILTER
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(query.job_ids.as_deref())
            .bind(query.user_id)
            .bind(query.stage.map(|s| s.as_str()))
            .bind(i64::try_from(skip).unwrap_or(i64::MAX))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM applications {}", APPLICATION_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(query.job_ids.as_deref())
            .bind(query.user_id)
            .bind(query.stage.map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await?;

        Ok((convert_all(rows)?, total))
    }

    async fn save_application(&self, app: &Application, expected_version: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET rating = $3,
                stage = $4,
                shortlist_date = $5,
                interview_date = $6,
                interview_venue = $7,
                history = $8,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(app.id)
        .bind(expected_version)
        .bind(app.rating)
        .bind(app.stage.as_str())
        .bind(app.shortlist_date)
        .bind(app.interview_date)
        .bind(&app.interview_venue)
        .bind(Json(&app.history))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_user_applications(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM applications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn insert_project(&self, project: &VirtualProject) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO virtual_projects (
                id, title, overview, thumbnail, intro_vid, estimated_duration, difficulty,
                industry_type, status, tasks, organization_id, recruiter, approving_unis,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.overview)
        .bind(&project.thumbnail)
        .bind(&project.intro_vid)
        .bind(&project.estimated_duration)
        .bind(&project.difficulty)
        .bind(&project.industry_type)
        .bind(project.status.as_str())
        .bind(Json(&project.tasks))
        .bind(project.organization_id)
        .bind(project.recruiter)
        .bind(&project.approving_unis)
        .bind(project.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<VirtualProject>> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM virtual_projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(VirtualProject::try_from).transpose()
    }

    async fn projects_for_organization(
        &self,
        organization_id: Uuid,
        recruiter_id: Option<Uuid>,
    ) -> Result<Vec<VirtualProject>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT * FROM virtual_projects
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR recruiter = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id)
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn projects_approved_by(
        &self,
        university_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<VirtualProject>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT * FROM virtual_projects
            WHERE $1 = ANY(approving_unis)
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(university_id)
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn add_approving_university(
        &self,
        project_id: Uuid,
        university_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE virtual_projects
            SET approving_unis = CASE
                WHEN $2 = ANY(approving_unis) THEN approving_unis
                ELSE array_append(approving_unis, $2)
            END
            WHERE id = $1
            "#,
        )
        .bind(project_id)
        .bind(university_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn expire_projects_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE virtual_projects
            SET status = 'expired'
            WHERE created_at < $1 AND status <> 'expired'
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_applicant(&self, applicant: &VirtualProjectApplicant) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO project_applicants (
                id, user_id, project_id, status, tasks, submission_date, created_at,
                history, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(applicant.id)
        .bind(applicant.user_id)
        .bind(applicant.project_id)
        .bind(applicant.status)
        .bind(Json(&applicant.tasks))
        .bind(applicant.submission_date)
        .bind(applicant.created_at)
        .bind(Json(&applicant.history))
        .bind(applicant.version)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_as(e, "You have already applied to this project"))?;
        Ok(())
    }

    async fn get_applicant(&self, id: Uuid) -> Result<Option<VirtualProjectApplicant>> {
        let row =
            sqlx::query_as::<_, ApplicantRow>("SELECT * FROM project_applicants WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn find_applicant(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<VirtualProjectApplicant>> {
        let row = sqlx::query_as::<_, ApplicantRow>(
            "SELECT * FROM project_applicants WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn applicants_for_projects(
        &self,
        project_ids: &[Uuid],
    ) -> Result<Vec<VirtualProjectApplicant>> {
        let rows = sqlx::query_as::<_, ApplicantRow>(
            r#"
            SELECT * FROM project_applicants
            WHERE project_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn applicants_for_user(
        &self,
        user_id: Uuid,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<VirtualProjectApplicant>> {
        let rows = sqlx::query_as::<_, ApplicantRow>(
            r#"
            SELECT * FROM project_applicants
            WHERE user_id = $1
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn save_applicant(
        &self,
        applicant: &VirtualProjectApplicant,
        expected_version: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE project_applicants
            SET status = $3,
                tasks = $4,
                submission_date = $5,
                history = $6,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(applicant.id)
        .bind(expected_version)
        .bind(applicant.status)
        .bind(Json(&applicant.tasks))
        .bind(applicant.submission_date)
        .bind(Json(&applicant.history))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (
                id, title, description, event_type, visibility, start_at, end_at, host,
                company_id, university, venue, event_link, interested, going, not_interested,
                cover_photo, status, history, created_at, version
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_type.as_str())
        .bind(event.visibility.as_str())
        .bind(event.start)
        .bind(event.end)
        .bind(event.host)
        .bind(event.company_id)
        .bind(event.university)
        .bind(&event.venue)
        .bind(&event.event_link)
        .bind(&event.interested)
        .bind(&event.going)
        .bind(&event.not_interested)
        .bind(&event.cover_photo)
        .bind(event.status.as_str())
        .bind(Json(&event.history))
        .bind(event.created_at)
        .bind(event.version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Event::try_from).transpose()
    }

    async fn save_event(&self, event: &Event, expected_version: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $3,
                description = $4,
                event_type = $5,
                visibility = $6,
                start_at = $7,
                end_at = $8,
                venue = $9,
                event_link = $10,
                interested = $11,
                going = $12,
                not_interested = $13,
                cover_photo = $14,
                status = $15,
                history = $16,
                university = $17,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(event.id)
        .bind(expected_version)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_type.as_str())
        .bind(event.visibility.as_str())
        .bind(event.start)
        .bind(event.end)
        .bind(&event.venue)
        .bind(&event.event_link)
        .bind(&event.interested)
        .bind(&event.going)
        .bind(&event.not_interested)
        .bind(&event.cover_photo)
        .bind(event.status.as_str())
        .bind(Json(&event.history))
        .bind(event.university)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_events(
        &self,
        query: &EventQuery,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT * FROM events
            WHERE status <> 'blocked'
              AND (visibility = 'public' OR id = ANY($1))
              AND title ILIKE ALL($2)
              AND ($3::timestamptz IS NULL OR start_at >= $3)
              AND ($4::timestamptz IS NULL OR end_at <= $4)
              AND ($5::uuid IS NULL OR host = $5)
              AND ($6::uuid IS NULL OR company_id = $6)
              AND ($7::uuid IS NULL OR university = $7)
              AND ($8::text IS NULL OR event_type = $8)
            ORDER BY start_at ASC
            OFFSET $9 LIMIT $10
            "#,
        )
        .bind(&query.invited_event_ids)
        .bind(like_patterns(query))
        .bind(query.starts_after)
        .bind(query.ends_before)
        .bind(query.host)
        .bind(query.company_id)
        .bind(query.university_id)
        .bind(query.event_type.map(|t| t.as_str()))
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn count_university_events(&self, university_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE university = $1")
            .bind(university_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT * FROM events
            WHERE status <> 'blocked' AND start_at >= $1 AND start_at < $2
            ORDER BY start_at ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn insert_invitation(&self, invitation: &EventInvitation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO event_invitations (id, status, event_id, invited_by, invited, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(invitation.id)
        .bind(invitation.status.as_str())
        .bind(invitation.event_id)
        .bind(invitation.invited_by)
        .bind(invitation.invited)
        .bind(invitation.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn has_invitation(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM event_invitations WHERE event_id = $1 AND invited = $2
            )
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn invitations_for_user(&self, user_id: Uuid) -> Result<Vec<EventInvitation>> {
        let rows = sqlx::query_as::<_, InvitationRow>(
            "SELECT * FROM event_invitations WHERE invited = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn invitations_for_event(&self, event_id: Uuid) -> Result<Vec<EventInvitation>> {
        let rows = sqlx::query_as::<_, InvitationRow>(
            "SELECT * FROM event_invitations WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }
}
