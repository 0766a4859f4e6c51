use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Work recorded before touching the object store so it can be replayed
/// after a partial failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationKind {
    /// An object was (or is about to be) written; it is orphaned unless a
    /// file row references it.
    Upload { storage_key: String },
    /// Objects and rows scheduled for removal.
    Delete {
        file_ids: Vec<Uuid>,
        storage_keys: Vec<String>,
    },
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Upload { .. } => "upload",
            OperationKind::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: OperationKind,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_tagged() {
        let kind = OperationKind::Upload {
            storage_key: "u/1_a.txt".to_string(),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["kind"], "upload");
        let back: OperationKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, kind);
    }
}
