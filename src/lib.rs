pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::config::EngineSettings;
use crate::services::{
    application_service::ApplicationService, event_service::EventService,
    job_service::JobService, notification_service::Notifier, project_service::ProjectService,
};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: Arc<str>,
    pub settings: EngineSettings,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub project_service: ProjectService,
    pub event_service: EventService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        settings: EngineSettings,
        jwt_secret: &str,
    ) -> Self {
        let job_service = JobService::new(store.clone());
        let application_service = ApplicationService::new(store.clone(), settings);
        let project_service = ProjectService::new(store.clone(), settings);
        let event_service = EventService::new(store, notifier, settings);

        Self {
            jwt_secret: Arc::from(jwt_secret),
            settings,
            job_service,
            application_service,
            project_service,
            event_service,
        }
    }
}
