//! Wire messages exchanged with editor views.

use serde::{Deserialize, Serialize};

/// A labeled request from a view. `args` is positional and its shape depends
/// on the label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub request_id: u64,
    pub label: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

/// The reply correlated to a request. A `null` result means the operation
/// degraded to a no-op.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub request_id: u64,
    pub result: serde_json::Value,
}

/// Everything a session can push to a view channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewMessage {
    Response(Response),
    /// Full serialized document state, sent to every attached view after
    /// each mutation, undo, redo or revert.
    #[serde(rename_all = "camelCase")]
    Update { label: String, text: String },
}

impl ViewMessage {
    pub fn update(text: String) -> Self {
        Self::Update {
            label: "update".to_string(),
            text,
        }
    }
}

impl Request {
    pub fn new(request_id: u64, label: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            request_id,
            label: label.into(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_round_trips_camel_case() {
        let text = r#"{"requestId": 4, "label": "rename-entry", "args": [1, "Hit009"]}"#;
        let request: Request = serde_json::from_str(text).unwrap();
        assert_eq!(request.request_id, 4);
        assert_eq!(request.label, "rename-entry");
        assert_eq!(request.args, vec![json!(1), json!("Hit009")]);
    }

    #[test]
    fn test_missing_args_default_to_empty() {
        let request: Request =
            serde_json::from_str(r#"{"requestId": 1, "label": "undo"}"#).unwrap();
        assert!(request.args.is_empty());
    }

    #[test]
    fn test_update_message_shape() {
        let message = ViewMessage::update("a = 1\n".to_string());
        let encoded = serde_json::to_value(&message).unwrap();
        assert_eq!(encoded["kind"], "update");
        assert_eq!(encoded["label"], "update");
        assert_eq!(encoded["text"], "a = 1\n");
    }
}
