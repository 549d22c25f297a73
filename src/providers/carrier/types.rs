//! Types for the carrier SMS API.

use serde::{Deserialize, Serialize};

/// Status group the carrier assigns to messages accepted for delivery.
pub const PENDING_GROUP: u32 = 1;

/// Body of `POST /sms/2/text/advanced`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendSmsRequest<'a> {
    pub messages: Vec<OutgoingMessage<'a>>,
}

impl<'a> SendSmsRequest<'a> {
    /// Request carrying a single message to a single destination.
    pub fn single(from: &'a str, to: &'a str, text: &'a str) -> Self {
        Self {
            messages: vec![OutgoingMessage {
                from,
                destinations: vec![Destination { to }],
                text,
            }],
        }
    }
}

/// One message of a send request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage<'a> {
    /// Sender id shown to the recipient.
    pub from: &'a str,
    pub destinations: Vec<Destination<'a>>,
    pub text: &'a str,
}

/// Recipient of a message, in international format without `+`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination<'a> {
    pub to: &'a str,
}

/// Response to a send request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSmsResponse {
    #[serde(default)]
    pub bulk_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

/// Per-destination result of a send request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    pub status: MessageStatus,
}

/// Delivery status reported for a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatus {
    /// Status group; [`PENDING_GROUP`] means accepted.
    pub group_id: u32,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub request_error: RequestError,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestError {
    pub service_exception: ServiceException,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceException {
    #[serde(default)]
    pub message_id: Option<String>,
    pub text: String,
}

impl ErrorResponse {
    /// Extract the carrier's error text from a raw body.
    pub fn message_from_body(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body)
            .ok()
            .map(|e| e.request_error.service_exception.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = SendSmsRequest::single("Clinic", "38267051141", "Test");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "messages": [{
                    "from": "Clinic",
                    "destinations": [{ "to": "38267051141" }],
                    "text": "Test"
                }]
            })
        );
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "bulkId": "2034072219640523072",
            "messages": [{
                "to": "38267051141",
                "status": {
                    "groupId": 1,
                    "groupName": "PENDING",
                    "id": 26,
                    "name": "PENDING_ACCEPTED",
                    "description": "Message sent to next instance"
                },
                "messageId": "2250be2d4219-3af1-78856-aabe-1362af1edfd2"
            }]
        }"#;

        let response: SendSmsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.messages[0].status.group_id, PENDING_GROUP);
        assert_eq!(
            response.messages[0].message_id.as_deref(),
            Some("2250be2d4219-3af1-78856-aabe-1362af1edfd2")
        );
    }

    #[test]
    fn test_error_message_from_body() {
        let body = r#"{"requestError":{"serviceException":{
            "messageId":"UNAUTHORIZED","text":"Invalid login details"}}}"#;
        assert_eq!(
            ErrorResponse::message_from_body(body).as_deref(),
            Some("Invalid login details")
        );
        assert_eq!(ErrorResponse::message_from_body("Bad Gateway"), None);
    }
}
