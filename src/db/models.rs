use serde::{Deserialize, Serialize};

/// An uploaded log and the name it was registered under.
///
/// Names are not unique; lookups by name return the earliest record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: i64,
    pub name: String,
    /// Filesystem location of the stored artifact
    pub path: String,
    /// Upload time, epoch millis (0 for rows written before the column existed)
    pub created_at: i64,
}
