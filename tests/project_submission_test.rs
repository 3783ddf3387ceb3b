use std::sync::Arc;

use careers_backend::config::EngineSettings;
use careers_backend::dto::project_dto::{
    AssignGradePayload, CreateProjectPayload, CreateTaskPayload, SubmitTaskPayload,
};
use careers_backend::models::job::JobStatus;
use careers_backend::models::user::{Actor, Role, UserProfile};
use careers_backend::models::virtual_project::VirtualProject;
use careers_backend::services::project_service::ProjectService;
use careers_backend::store::memory::MemoryStore;
use careers_backend::store::{ProjectStore, Store};
use chrono::{Duration, Utc};
use uuid::Uuid;

struct Fixture {
    store: Arc<MemoryStore>,
    projects: ProjectService,
    company: Actor,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn Store> = store.clone();
    Fixture {
        projects: ProjectService::new(dyn_store, EngineSettings::default()),
        company: Actor::company(Uuid::new_v4(), Role::CompanyAdmin, Uuid::new_v4()),
        store,
    }
}

fn task(name: &str, required: u32) -> CreateTaskPayload {
    CreateTaskPayload {
        name: name.into(),
        description: format!("{} description", name),
        explanatory_vid: None,
        duration: "3 days".into(),
        time: None,
        attachments: vec![],
        required_submissions: required,
    }
}

async fn publish(fx: &Fixture, required: &[u32]) -> VirtualProject {
    let payload = CreateProjectPayload {
        title: "Payments dashboard".into(),
        overview: "Build a reporting view".into(),
        thumbnail: "thumb.png".into(),
        intro_vid: None,
        estimated_duration: "2 weeks".into(),
        difficulty: Some("medium".into()),
        industry_type: "fintech".into(),
        tasks: required
            .iter()
            .enumerate()
            .map(|(i, n)| task(&format!("task {}", i + 1), *n))
            .collect(),
    };
    fx.projects
        .create_project(payload, &fx.company)
        .await
        .expect("create project")
}

fn files(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("uploads/{}-{}.zip", prefix, i)).collect()
}

async fn submit(
    fx: &Fixture,
    project_id: Uuid,
    user_id: Uuid,
    task_id: Uuid,
    submissions: Vec<String>,
) -> careers_backend::error::Result<careers_backend::models::project_applicant::VirtualProjectApplicant> {
    fx.projects
        .submit_task(
            project_id,
            user_id,
            SubmitTaskPayload {
                task_id,
                submissions,
            },
        )
        .await
}

#[tokio::test]
async fn submissions_stop_at_the_required_count() {
    let fx = fixture();
    let project = publish(&fx, &[3]).await;
    let task_id = project.tasks[0].id;
    let student = Uuid::new_v4();
    fx.projects.apply(project.id, student).await.unwrap();

    let applicant = submit(&fx, project.id, student, task_id, files("a", 2)).await.unwrap();
    assert!(!applicant.task(task_id).unwrap().status);

    let err = submit(&fx, project.id, student, task_id, files("b", 2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_state");
    let stored = fx
        .store
        .find_applicant(project.id, student)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.task(task_id).unwrap().submissions.len(), 2);

    let applicant = submit(&fx, project.id, student, task_id, files("c", 1)).await.unwrap();
    let entry = applicant.task(task_id).unwrap();
    assert!(entry.status);
    assert_eq!(entry.submissions.len(), 3);
}

#[tokio::test]
async fn applicant_completes_after_the_last_task() {
    let fx = fixture();
    let project = publish(&fx, &[1, 2]).await;
    let (a, b) = (project.tasks[0].id, project.tasks[1].id);
    let student = Uuid::new_v4();
    fx.projects.apply(project.id, student).await.unwrap();

    let applicant = submit(&fx, project.id, student, a, files("a", 1)).await.unwrap();
    assert!(!applicant.status);
    assert!(applicant.submission_date.is_none());

    let before = Utc::now();
    let applicant = submit(&fx, project.id, student, b, files("b", 2)).await.unwrap();
    assert!(applicant.status);
    let submitted = applicant.submission_date.expect("submission date set");
    assert!(submitted >= before && submitted <= Utc::now());
}

#[tokio::test]
async fn unassigned_student_cannot_submit() {
    let fx = fixture();
    let project = publish(&fx, &[1]).await;
    let err = submit(&fx, project.id, Uuid::new_v4(), project.tasks[0].id, files("x", 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "bad_request");
    assert_eq!(err.to_string(), "Bad request: You are not assigned to this project");
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let fx = fixture();
    let project = publish(&fx, &[1]).await;
    let student = Uuid::new_v4();
    fx.projects.apply(project.id, student).await.unwrap();

    let err = submit(&fx, project.id, student, Uuid::new_v4(), files("x", 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn applying_twice_or_to_an_expired_project_fails() {
    let fx = fixture();
    let project = publish(&fx, &[1]).await;
    let student = Uuid::new_v4();
    fx.projects.apply(project.id, student).await.unwrap();
    let err = fx.projects.apply(project.id, student).await.unwrap_err();
    assert_eq!(err.kind(), "bad_request");

    let expired = fx
        .projects
        .find_and_expire(Utc::now() + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(expired, 1);
    let stored = fx.store.get_project(project.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Expired);

    let err = fx.projects.apply(project.id, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_state");
}

#[tokio::test]
async fn grading_is_limited_to_the_owning_company() {
    let fx = fixture();
    let project = publish(&fx, &[1]).await;
    let task_id = project.tasks[0].id;
    let student = Uuid::new_v4();
    let applicant = fx.projects.apply(project.id, student).await.unwrap();
    submit(&fx, project.id, student, task_id, files("final", 1)).await.unwrap();

    let before = fx.store.get_applicant(applicant.id).await.unwrap().unwrap();
    let outsider = Actor::company(Uuid::new_v4(), Role::CompanyAdmin, Uuid::new_v4());
    let err = fx
        .projects
        .assign_grade(applicant.id, AssignGradePayload { task_id, grade: 4.0 }, &outsider)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
    assert_eq!(fx.store.get_applicant(applicant.id).await.unwrap().unwrap(), before);

    let graded = fx
        .projects
        .assign_grade(applicant.id, AssignGradePayload { task_id, grade: 4.0 }, &fx.company)
        .await
        .unwrap();
    assert_eq!(graded.task(task_id).unwrap().grade, Some(4.0));
    assert_eq!(graded.history.len(), 1);
    assert_eq!(graded.history[0].changed_field, format!("Graded TASK: {}", task_id));
}

#[tokio::test]
async fn students_need_university_approval_to_view() {
    let fx = fixture();
    let project = publish(&fx, &[1, 1]).await;
    let uni = Uuid::new_v4();
    let student = Actor::student(Uuid::new_v4(), Some(uni));

    let err = fx.projects.find_one(project.id, &student).await.unwrap_err();
    assert_eq!(err.kind(), "unauthorized");

    fx.projects.approve(project.id, uni).await.unwrap();
    fx.projects.apply(project.id, student.user_id).await.unwrap();
    submit(&fx, project.id, student.user_id, project.tasks[0].id, files("a", 1))
        .await
        .unwrap();

    let view = fx.projects.find_one(project.id, &student).await.unwrap();
    assert!(view.project.approving_unis.is_empty());
    let progress = view.progress.expect("progress for students");
    assert_eq!((progress.completed, progress.total), (1, 2));

    let owner_view = fx.projects.find_one(project.id, &fx.company).await.unwrap();
    assert_eq!(owner_view.project.approving_unis, vec![uni]);
}

#[tokio::test]
async fn university_staff_only_see_their_students() {
    let fx = fixture();
    let project = publish(&fx, &[1]).await;
    let ours = Uuid::new_v4();
    let theirs = Uuid::new_v4();

    let mut enrolled = Vec::new();
    for uni in [ours, theirs] {
        let user = UserProfile {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Okafor".into(),
            role: Role::Student,
            profile_picture: None,
            university_id: Some(uni),
            company_id: None,
        };
        fx.store.insert_user(user.clone()).await;
        fx.projects.apply(project.id, user.id).await.unwrap();
        enrolled.push(user.id);
    }

    let counselor = Actor::university(Uuid::new_v4(), Role::UniCounselor, ours);
    let visible = fx.projects.get_applicants(project.id, &counselor).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].applicant.user_id, enrolled[0]);

    let all = fx.projects.get_applicants(project.id, &fx.company).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn in_progress_and_stats_reflect_completion() {
    let fx = fixture();
    let project = publish(&fx, &[1]).await;
    let finisher = Uuid::new_v4();
    let starter = Uuid::new_v4();
    fx.projects.apply(project.id, finisher).await.unwrap();
    fx.projects.apply(project.id, starter).await.unwrap();
    submit(&fx, project.id, finisher, project.tasks[0].id, files("done", 1))
        .await
        .unwrap();

    let mine = fx.projects.find_in_progress(finisher, None, None).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!((mine[0].completed, mine[0].total), (1, 1));

    let company = fx.company.company_id.unwrap();
    let stats = fx.projects.get_stats(company).await.unwrap();
    assert_eq!(stats.total_projects, 1);
    assert_eq!(stats.active_projects, 1);
    assert_eq!(stats.total_applications, 2);
    assert_eq!(stats.completed_applications, 1);

    let completed = fx
        .projects
        .completed_projects(company, None, None, None)
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].user_id, finisher);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_never_exceed_the_cap() {
    let fx = Arc::new(fixture());
    let project = publish(&fx, &[3]).await;
    let task_id = project.tasks[0].id;
    let student = Uuid::new_v4();
    fx.projects.apply(project.id, student).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..6 {
        let fx = fx.clone();
        let project_id = project.id;
        handles.push(tokio::spawn(async move {
            submit(&fx, project_id, student, task_id, files(&format!("w{}", i), 1)).await
        }));
    }
    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 3);

    let stored = fx
        .store
        .find_applicant(project.id, student)
        .await
        .unwrap()
        .unwrap();
    let entry = stored.task(task_id).unwrap();
    assert_eq!(entry.submissions.len(), 3);
    assert!(entry.status);
}
