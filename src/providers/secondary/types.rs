//! Types for the secondary SMS API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /messages`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessageRequest<'a> {
    /// Recipient in `+<country code><subscriber>` form.
    pub to: &'a str,
    pub from: &'a str,
    pub text: &'a str,
}

/// Identifier as returned by the API, which may use strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Text(String),
    Number(u64),
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(id) => f.write_str(id),
            Self::Number(id) => write!(f, "{}", id),
        }
    }
}

/// Monetary amount, sent as a number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Numeric value, if it parses.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Response to a send request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub id: Option<RemoteId>,
    #[serde(default)]
    pub message_id: Option<RemoteId>,
    #[serde(default, rename = "messageId")]
    pub message_id_camel: Option<RemoteId>,
    #[serde(default)]
    pub cost: Option<Amount>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl SendMessageResponse {
    /// Message identifier under whichever key the gateway used.
    pub fn remote_id(&self) -> Option<&RemoteId> {
        self.id
            .as_ref()
            .or(self.message_id.as_ref())
            .or(self.message_id_camel.as_ref())
    }

    /// Error text if the body describes a failure despite a success status.
    pub fn error_message(&self) -> Option<String> {
        let status_failed = self
            .status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("error"));

        let from_field = match &self.error {
            None | Some(Value::Null) | Some(Value::Bool(false)) => None,
            Some(Value::String(message)) => Some(message.clone()),
            Some(value @ Value::Object(map)) => Some(
                map.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            ),
            Some(other) => Some(other.to_string()),
        };

        from_field.or_else(|| status_failed.then(|| "status: error".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_keys_and_shapes() {
        let response: SendMessageResponse = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(response.remote_id(), Some(&RemoteId::Text("abc".to_string())));

        let response: SendMessageResponse =
            serde_json::from_str(r#"{"message_id":42}"#).unwrap();
        assert_eq!(response.remote_id().unwrap().to_string(), "42");

        let response: SendMessageResponse =
            serde_json::from_str(r#"{"messageId":"m-1","cost":"0.05"}"#).unwrap();
        assert_eq!(response.remote_id().unwrap().to_string(), "m-1");
        assert_eq!(response.cost.and_then(|c| c.value()), Some(0.05));
    }

    #[test]
    fn test_id_under_several_keys() {
        let response: SendMessageResponse =
            serde_json::from_str(r#"{"id":"a","message_id":"b","messageId":"c"}"#).unwrap();
        assert_eq!(response.remote_id().unwrap().to_string(), "a");

        let response: SendMessageResponse =
            serde_json::from_str(r#"{"message_id":"b","messageId":"c"}"#).unwrap();
        assert_eq!(response.remote_id().unwrap().to_string(), "b");
    }

    #[test]
    fn test_error_message() {
        let ok: SendMessageResponse =
            serde_json::from_str(r#"{"id":"1","status":"queued"}"#).unwrap();
        assert_eq!(ok.error_message(), None);

        let ok: SendMessageResponse = serde_json::from_str(r#"{"id":"1","error":null}"#).unwrap();
        assert_eq!(ok.error_message(), None);

        let failed: SendMessageResponse =
            serde_json::from_str(r#"{"error":"Insufficient balance"}"#).unwrap();
        assert_eq!(failed.error_message().as_deref(), Some("Insufficient balance"));

        let failed: SendMessageResponse =
            serde_json::from_str(r#"{"error":{"code":7,"message":"Invalid number"}}"#).unwrap();
        assert_eq!(failed.error_message().as_deref(), Some("Invalid number"));

        let failed: SendMessageResponse = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(failed.error_message().as_deref(), Some("status: error"));
    }
}
