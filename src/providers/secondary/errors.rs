//! Error types for the secondary provider.

use crate::errors::{ClassifiedError, FailureKind};
use crate::providers::http::{body_value, request_failure_kind, status_failure_kind};
use thiserror::Error;
use url::Url;

/// Errors raised by the secondary REST provider.
#[derive(Debug, Error)]
pub enum SecondaryError {
    /// A required setting is absent; no request was made.
    #[error("Secondary provider is not configured: {setting} is not set")]
    MissingConfiguration { setting: &'static str },

    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// The base URL cannot carry a path.
    #[error("Invalid secondary endpoint: {endpoint}")]
    InvalidEndpoint { endpoint: Url },

    /// Failed to send HTTP request.
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("Failed to read response: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// The API answered with a status other than 200 or 201.
    #[error("Secondary API returned HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    /// The success body is not a send response.
    #[error("Failed to deserialize secondary response: {source}")]
    DeserializeJson {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The API reported an error inside a success response.
    #[error("Secondary API reported an error: {message}")]
    Service {
        message: String,
        raw: serde_json::Value,
    },
}

/// Result type for secondary provider operations.
pub type Result<T> = std::result::Result<T, SecondaryError>;

impl ClassifiedError for SecondaryError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::MissingConfiguration { .. }
            | Self::BuildHttpClient(_)
            | Self::InvalidEndpoint { .. } => FailureKind::Configuration,
            Self::HttpRequest(e) => request_failure_kind(e),
            Self::ParseResponse(_) => FailureKind::Transport,
            Self::Http { status, .. } => status_failure_kind(*status),
            Self::DeserializeJson { .. } | Self::Service { .. } => FailureKind::Protocol,
        }
    }

    fn diagnostics(&self) -> Option<serde_json::Value> {
        match self {
            Self::Http { status, body, .. } => Some(serde_json::json!({
                "status": status,
                "body": body_value(body),
            })),
            Self::DeserializeJson { body, .. } => Some(body_value(body)),
            Self::Service { raw, .. } => Some(raw.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = SecondaryError::MissingConfiguration {
            setting: "SMS_SECONDARY_API_KEY",
        };
        assert_eq!(err.failure_kind(), FailureKind::Configuration);

        let err = SecondaryError::Service {
            message: "Insufficient balance".to_string(),
            raw: serde_json::json!({ "error": "Insufficient balance" }),
        };
        assert_eq!(err.failure_kind(), FailureKind::Protocol);
        assert_eq!(
            err.diagnostics(),
            Some(serde_json::json!({ "error": "Insufficient balance" }))
        );

        let err = SecondaryError::Http {
            status: 503,
            message: "Service Unavailable".to_string(),
            body: String::new(),
        };
        assert!(err.is_retryable());
    }
}
