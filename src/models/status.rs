use serde::{Deserialize, Serialize};

/// Status of an operation on the render processor or queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpStatus {
    Creating,
    Queued,
    Active,
    Crashed,
    Stopped,
    /// Submitted by a newer version of the software; cannot be processed.
    #[serde(rename = "Too New")]
    TooNew,
    Done,
}

impl OpStatus {
    /// True once no further progress will ever be reported.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OpStatus::Crashed | OpStatus::Stopped | OpStatus::TooNew | OpStatus::Done
        )
    }
}

/// One progress snapshot from the render processor. Every poll returns a
/// fresh value; nothing here is ever mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenderStatus {
    pub status: OpStatus,
    /// Set when the operation failed, including a Done run with bad frames.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub complete: i64,
    #[serde(default)]
    pub remaining: i64,
    #[serde(default)]
    pub failed: i64,
    /// Fraction complete, 0.0 to 1.0.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub progress_message: Option<String>,
}

/// One log entry fetched from the render processor after completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenderLogItem {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub frame: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!OpStatus::Queued.is_terminal());
        assert!(!OpStatus::Active.is_terminal());
        assert!(OpStatus::Done.is_terminal());
        assert!(OpStatus::Crashed.is_terminal());
        assert!(OpStatus::Stopped.is_terminal());
    }

    #[test]
    fn snapshot_decodes_with_missing_fields() {
        let status: RenderStatus =
            serde_json::from_value(serde_json::json!({ "Status": "Active" })).unwrap();
        assert_eq!(status.status, OpStatus::Active);
        assert_eq!(status.complete, 0);
        assert!(status.error.is_none());
    }

    #[test]
    fn too_new_wire_name() {
        let status: OpStatus = serde_json::from_value(serde_json::json!("Too New")).unwrap();
        assert_eq!(status, OpStatus::TooNew);
    }
}
