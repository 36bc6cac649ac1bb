use serde::{Deserialize, Serialize};

/// Response wrapper used by every backend endpoint:
/// `{"success": bool, "data": T | null, "message"?: string}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_success_envelope() {
        let env: ApiEnvelope<Value> =
            serde_json::from_str(r#"{"success": true, "data": {"moods": []}}"#).unwrap();
        assert!(env.success);
        assert_eq!(env.data.unwrap()["moods"], Value::Array(vec![]));
        assert!(env.message.is_none());
    }

    #[test]
    fn test_failure_envelope_with_null_data() {
        let env: ApiEnvelope<Value> = serde_json::from_str(
            r#"{"success": false, "data": null, "message": "Task not found"}"#,
        )
        .unwrap();
        assert!(!env.success);
        assert!(env.data.is_none());
        assert_eq!(env.message.as_deref(), Some("Task not found"));
    }

    #[test]
    fn test_missing_success_is_rejected() {
        assert!(serde_json::from_str::<ApiEnvelope<Value>>(r#"{"data": {}}"#).is_err());
    }
}
