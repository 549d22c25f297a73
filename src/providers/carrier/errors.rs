//! Error types for the carrier provider.

use crate::errors::{ClassifiedError, FailureKind};
use crate::providers::http::{body_value, request_failure_kind, status_failure_kind};
use thiserror::Error;
use url::Url;

/// Errors raised by the carrier REST provider.
#[derive(Debug, Error)]
pub enum CarrierError {
    /// A required setting is absent; no request was made.
    #[error("Carrier provider is not configured: {setting} is not set")]
    MissingConfiguration { setting: &'static str },

    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// The base URL cannot carry a path.
    #[error("Invalid carrier endpoint: {endpoint}")]
    InvalidEndpoint { endpoint: Url },

    /// Failed to send HTTP request.
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("Failed to read response: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Carrier API returned HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    /// The 2xx body is not a send response.
    #[error("Failed to deserialize carrier response: {source}")]
    DeserializeJson {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The send response listed no messages.
    #[error("Carrier response contained no messages")]
    EmptyResponse { raw: serde_json::Value },

    /// The message was not accepted for delivery.
    #[error("Message rejected by carrier: {name} (group {group_id}): {description}")]
    Rejected {
        group_id: u32,
        name: String,
        description: String,
        raw: serde_json::Value,
    },
}

/// Result type for carrier operations.
pub type Result<T> = std::result::Result<T, CarrierError>;

impl ClassifiedError for CarrierError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::MissingConfiguration { .. }
            | Self::BuildHttpClient(_)
            | Self::InvalidEndpoint { .. } => FailureKind::Configuration,
            Self::HttpRequest(e) => request_failure_kind(e),
            Self::ParseResponse(_) => FailureKind::Transport,
            Self::Http { status, .. } => status_failure_kind(*status),
            Self::DeserializeJson { .. } | Self::EmptyResponse { .. } | Self::Rejected { .. } => {
                FailureKind::Protocol
            }
        }
    }

    fn diagnostics(&self) -> Option<serde_json::Value> {
        match self {
            Self::Http { status, body, .. } => Some(serde_json::json!({
                "status": status,
                "body": body_value(body),
            })),
            Self::DeserializeJson { body, .. } => Some(body_value(body)),
            Self::EmptyResponse { raw } | Self::Rejected { raw, .. } => Some(raw.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = CarrierError::MissingConfiguration {
            setting: "SMS_CARRIER_API_TOKEN",
        };
        assert_eq!(err.failure_kind(), FailureKind::Configuration);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("SMS_CARRIER_API_TOKEN"));

        let err = CarrierError::Http {
            status: 500,
            message: "Internal Server Error".to_string(),
            body: "oops".to_string(),
        };
        assert_eq!(err.failure_kind(), FailureKind::Transport);
        assert!(err.is_retryable());
        assert_eq!(
            err.diagnostics(),
            Some(serde_json::json!({ "status": 500, "body": "oops" }))
        );

        let err = CarrierError::Rejected {
            group_id: 5,
            name: "REJECTED_DESTINATION".to_string(),
            description: "Destination blocked".to_string(),
            raw: serde_json::json!({}),
        };
        assert_eq!(err.failure_kind(), FailureKind::Protocol);
    }
}
