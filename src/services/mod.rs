pub mod application_service;
pub mod event_service;
pub mod job_service;
pub mod notification_service;
pub mod project_service;
pub mod stats;

use uuid::Uuid;

use crate::error::Error;

/// Returned when every compare-and-set attempt on a document lost its race.
pub(crate) fn write_conflict(entity: &str, id: Uuid) -> Error {
    tracing::warn!(entity, %id, "giving up after repeated write conflicts");
    Error::Conflict(format!(
        "{} {} is being modified concurrently, please retry",
        entity, id
    ))
}
