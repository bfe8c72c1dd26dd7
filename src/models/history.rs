use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FIELD_IS_DELETED: &str = "isDeleted";
pub const FIELD_COMMENT: &str = "comentario";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_STATUS: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Created,
    Deleted,
    Restored,
    Updated
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub old_value: String,
    pub new_value: String
}

impl FieldChange {
    pub fn new(field: &str, old_value: impl ToString, new_value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            old_value: old_value.to_string(),
            new_value: new_value.to_string()
        }
    }
}

/// One audited state transition of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Starts at 1 and increases by one with every entry of the same transaction.
    pub version: u32,
    pub action: HistoryAction,
    pub at: DateTime<Utc>,
    pub actor: String,
    pub changes: Vec<FieldChange>
}
