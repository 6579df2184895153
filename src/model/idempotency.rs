use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdempotencyStatus {
    InProgress,
    Completed,
}

/// The value stored under an idempotency key.
///
/// Serialized as `{"status":"IN_PROGRESS"}` while the guarded operation runs and
/// `{"status":"COMPLETED","response":"<body>"}` afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub status: IdempotencyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl IdempotencyRecord {
    pub fn in_progress() -> Self {
        Self {
            status: IdempotencyStatus::InProgress,
            response: None,
        }
    }

    pub fn completed(response: impl Into<String>) -> Self {
        Self {
            status: IdempotencyStatus::Completed,
            response: Some(response.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wire_format() {
        let pending = serde_json::to_string(&IdempotencyRecord::in_progress()).unwrap();
        assert_eq!(pending, r#"{"status":"IN_PROGRESS"}"#);

        let done = serde_json::to_string(&IdempotencyRecord::completed("{\"id\":1}")).unwrap();
        assert_eq!(done, r#"{"status":"COMPLETED","response":"{\"id\":1}"}"#);
    }

    #[test]
    fn test_record_accepts_empty_response() {
        let record: IdempotencyRecord =
            serde_json::from_str(r#"{"status":"IN_PROGRESS","response":""}"#).unwrap();
        assert_eq!(record.status, IdempotencyStatus::InProgress);
        assert_eq!(record.response.as_deref(), Some(""));
    }
}
