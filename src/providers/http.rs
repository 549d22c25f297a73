//! Plumbing shared by the REST providers.

use crate::errors::FailureKind;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

/// Build the default middleware client used when none is supplied.
pub(crate) fn default_http_client() -> Result<ClientWithMiddleware, reqwest::Error> {
    let client = reqwest::Client::builder().build()?;
    Ok(ClientBuilder::new(client).build())
}

/// Classify a failed request by whether it ever produced a response.
pub(crate) fn request_failure_kind(error: &reqwest_middleware::Error) -> FailureKind {
    match error {
        reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => FailureKind::Timeout,
        _ => FailureKind::Transport,
    }
}

/// Classify a non-success HTTP status.
///
/// Server-side and throttling statuses may clear up on a later run; client
/// errors will not.
pub(crate) fn status_failure_kind(status: u16) -> FailureKind {
    match StatusCode::from_u16(status) {
        Ok(code) if code.is_server_error() => FailureKind::Transport,
        Ok(StatusCode::TOO_MANY_REQUESTS) => FailureKind::Transport,
        Ok(StatusCode::REQUEST_TIMEOUT) => FailureKind::Timeout,
        Ok(StatusCode::UNAUTHORIZED) | Ok(StatusCode::FORBIDDEN) => FailureKind::Configuration,
        _ => FailureKind::Protocol,
    }
}

/// Response body as JSON when it parses, otherwise as a plain string.
pub(crate) fn body_value(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}
