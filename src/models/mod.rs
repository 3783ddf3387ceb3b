pub mod application;
pub mod audit;
pub mod event;
pub mod job;
pub mod project_applicant;
pub mod user;
pub mod virtual_project;
