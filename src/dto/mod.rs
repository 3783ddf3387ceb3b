pub mod application_dto;
pub mod event_dto;
pub mod project_dto;
pub mod stats_dto;
