//! Secondary SMS HTTP client.

use super::errors::{Result, SecondaryError};
use super::types::{SendMessageRequest, SendMessageResponse};
use crate::config::DEFAULT_HTTP_TIMEOUT;
use crate::providers::http::{body_value, default_http_client};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::Span;
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Secondary SMS HTTP client.
///
/// # Example
///
/// ```rust,ignore
/// use sms_relay::providers::secondary::SecondaryClient;
/// use url::Url;
///
/// let client = SecondaryClient::new(Url::parse("https://sms.example.com/v1")?, "your_key")?;
/// let (response, raw) = client.send_message("+38267051141", "Clinic", "Hello").await?;
/// ```
#[derive(Clone)]
pub struct SecondaryClient {
    http_client: ClientWithMiddleware,
    api_key: SecretString,
    endpoint: Url,
    timeout: Duration,
}

impl std::fmt::Debug for SecondaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondaryClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for configuring a [`SecondaryClient`].
pub struct SecondaryClientBuilder {
    api_key: SecretString,
    endpoint: Url,
    timeout: Duration,
    http_client: Option<ClientWithMiddleware>,
}

impl SecondaryClientBuilder {
    /// Create a new builder. The secondary API has no default location.
    pub fn new(endpoint: Url, api_key: SecretString) -> Self {
        Self {
            api_key,
            endpoint,
            timeout: DEFAULT_HTTP_TIMEOUT,
            http_client: None,
        }
    }

    /// Set the total timeout of each request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the [`SecondaryClient`].
    pub fn build(self) -> Result<SecondaryClient> {
        if self.endpoint.cannot_be_a_base() {
            return Err(SecondaryError::InvalidEndpoint {
                endpoint: self.endpoint,
            });
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => default_http_client().map_err(SecondaryError::BuildHttpClient)?,
        };

        Ok(SecondaryClient {
            http_client,
            api_key: self.api_key,
            endpoint: self.endpoint,
            timeout: self.timeout,
        })
    }
}

impl SecondaryClient {
    /// Create a new secondary client.
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Result<Self> {
        Self::builder(endpoint, api_key).build()
    }

    /// Create a builder for configuring the client.
    pub fn builder(endpoint: Url, api_key: impl Into<String>) -> SecondaryClientBuilder {
        let api_key: String = api_key.into();
        SecondaryClientBuilder::new(endpoint, SecretString::from(api_key))
    }

    fn messages_url(&self) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| SecondaryError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
            })?
            .pop_if_empty()
            .push("messages");
        Ok(url)
    }

    /// Submit one message.
    ///
    /// Only `200 OK` and `201 Created` count as accepted. Returns the parsed
    /// body together with the raw JSON.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SecondaryClient::send_message",
            skip_all,
            fields(to = %to, status)
        )
    )]
    pub async fn send_message(
        &self,
        to: &str,
        from: &str,
        text: &str,
    ) -> Result<(SendMessageResponse, serde_json::Value)> {
        let url = self.messages_url()?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .timeout(self.timeout)
            .json(&SendMessageRequest { to, from, text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.map_err(SecondaryError::ParseResponse)?;

        #[cfg(feature = "tracing")]
        Span::current().record("status", status.as_u16());

        if status != StatusCode::OK && status != StatusCode::CREATED {
            let parsed = serde_json::from_str::<SendMessageResponse>(&body).ok();
            let message = parsed
                .and_then(|p| p.error_message())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            return Err(SecondaryError::Http {
                status: status.as_u16(),
                message,
                body,
            });
        }

        // Some deployments answer 201 with an empty body.
        let raw = if body.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            body_value(&body)
        };
        let parsed: SendMessageResponse = serde_json::from_value(raw.clone())
            .map_err(|source| SecondaryError::DeserializeJson { source, body })?;

        if let Some(message) = parsed.error_message() {
            return Err(SecondaryError::Service { message, raw });
        }

        #[cfg(feature = "tracing")]
        Span::current().set_status(Status::Ok);

        Ok((parsed, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SecondaryClient {
        SecondaryClient::new(Url::parse(&server.uri()).unwrap(), "test_key").unwrap()
    }

    #[tokio::test]
    async fn test_send_message_created() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("authorization", "Bearer test_key"))
            .and(body_json(serde_json::json!({
                "to": "+38267051141",
                "from": "Clinic",
                "text": "Test"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "sec-1",
                "cost": 0.04
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (response, raw) = client(&mock_server)
            .send_message("+38267051141", "Clinic", "Test")
            .await
            .unwrap();

        assert_eq!(response.remote_id().unwrap().to_string(), "sec-1");
        assert_eq!(raw["cost"], 0.04);
    }

    #[tokio::test]
    async fn test_accepted_status_is_not_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(serde_json::json!({ "id": "x" })),
            )
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .send_message("+38267051141", "Clinic", "Test")
            .await
            .unwrap_err();

        assert!(matches!(err, SecondaryError::Http { status: 202, .. }));
    }

    #[tokio::test]
    async fn test_error_shaped_success_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error",
                "error": "Insufficient balance"
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .send_message("+38267051141", "Clinic", "Test")
            .await
            .unwrap_err();

        match err {
            SecondaryError::Service { message, .. } => assert_eq!(message, "Insufficient balance"),
            other => panic!("Expected Service error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_message_from_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "Invalid destination" }
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .send_message("+1", "Clinic", "Test")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Secondary API returned HTTP 400: Invalid destination");
    }

    #[tokio::test]
    async fn test_plain_text_success_body_is_protocol_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("queued"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .send_message("+38267051141", "Clinic", "Test")
            .await
            .unwrap_err();

        assert!(matches!(err, SecondaryError::DeserializeJson { .. }));
    }
}
