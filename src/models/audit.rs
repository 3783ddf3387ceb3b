use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One field-level mutation recorded on an entity. Entries are only ever
/// appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(rename = "changedField")]
    pub changed_field: String,
    #[serde(rename = "updatedValue")]
    pub updated_value: String,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        changed_field: impl Into<String>,
        updated_value: impl ToString,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            changed_field: changed_field.into(),
            updated_value: updated_value.to_string(),
            user_id,
            timestamp,
        }
    }
}

/// Entities carrying an append-only audit trail.
pub trait Audited {
    fn history(&self) -> &[AuditEntry];

    fn history_mut(&mut self) -> &mut Vec<AuditEntry>;

    fn record(
        &mut self,
        changed_field: impl Into<String>,
        updated_value: impl ToString,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    ) {
        self.history_mut().push(AuditEntry::new(
            changed_field,
            updated_value,
            user_id,
            timestamp,
        ));
    }
}
