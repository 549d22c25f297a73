//! Carrier SMS HTTP client.

use super::errors::{CarrierError, Result};
use super::types::{ErrorResponse, SendSmsRequest, SendSmsResponse, SentMessage};
use crate::config::{DEFAULT_CARRIER_API_URL, DEFAULT_HTTP_TIMEOUT};
use crate::providers::http::default_http_client;
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

/// Path segments of the send endpoint below the base URL.
const SEND_PATH: [&str; 4] = ["sms", "2", "text", "advanced"];

/// Carrier SMS HTTP client.
///
/// Sends single messages through the carrier's advanced text endpoint with
/// bearer-token authentication.
///
/// # Example
///
/// ```rust,ignore
/// use sms_relay::providers::carrier::CarrierClient;
///
/// let client = CarrierClient::with_api_token("your_token")?;
/// let (message, raw) = client.send_message("Clinic", "38267051141", "Hello").await?;
/// println!("Status group: {}", message.status.group_id);
/// ```
#[derive(Clone)]
pub struct CarrierClient {
    http_client: ClientWithMiddleware,
    api_token: SecretString,
    endpoint: Url,
    timeout: Duration,
}

impl std::fmt::Debug for CarrierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierClient")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for configuring a [`CarrierClient`].
pub struct CarrierClientBuilder {
    api_token: SecretString,
    endpoint: Option<Url>,
    timeout: Duration,
    http_client: Option<ClientWithMiddleware>,
}

impl CarrierClientBuilder {
    /// Create a new builder with the given API token.
    pub fn new(api_token: SecretString) -> Self {
        Self {
            api_token,
            endpoint: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
            http_client: None,
        }
    }

    /// Set a custom API base URL.
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
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

    /// Build the [`CarrierClient`].
    pub fn build(self) -> Result<CarrierClient> {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| Url::parse(DEFAULT_CARRIER_API_URL).expect("Invalid default URL"));

        if endpoint.cannot_be_a_base() {
            return Err(CarrierError::InvalidEndpoint { endpoint });
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => default_http_client().map_err(CarrierError::BuildHttpClient)?,
        };

        Ok(CarrierClient {
            http_client,
            api_token: self.api_token,
            endpoint,
            timeout: self.timeout,
        })
    }
}

impl CarrierClient {
    /// Create a new carrier client.
    ///
    /// # Arguments
    /// * `endpoint` - Base URL of the carrier API
    /// * `api_token` - Bearer token for authentication
    pub fn new(endpoint: Url, api_token: impl Into<String>) -> Result<Self> {
        Self::builder(api_token).endpoint(endpoint).build()
    }

    /// Create a new client with the default API URL.
    pub fn with_api_token(api_token: impl Into<String>) -> Result<Self> {
        Self::builder(api_token).build()
    }

    /// Create a builder for configuring the client.
    pub fn builder(api_token: impl Into<String>) -> CarrierClientBuilder {
        let api_token: String = api_token.into();
        CarrierClientBuilder::new(SecretString::from(api_token))
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn send_url(&self) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CarrierError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
            })?
            .pop_if_empty()
            .extend(SEND_PATH);
        Ok(url)
    }

    /// Submit one message to one destination.
    ///
    /// `to` is the international number without `+`. Returns the first
    /// message entry of the response together with the raw body.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "CarrierClient::send_message",
            skip_all,
            fields(to = %to, message_id)
        )
    )]
    pub async fn send_message(
        &self,
        from: &str,
        to: &str,
        text: &str,
    ) -> Result<(SentMessage, serde_json::Value)> {
        let url = self.send_url()?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(self.api_token.expose_secret())
            .timeout(self.timeout)
            .json(&SendSmsRequest::single(from, to, text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.map_err(CarrierError::ParseResponse)?;

        if !status.is_success() {
            let message = ErrorResponse::message_from_body(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });
            return Err(CarrierError::Http {
                status: status.as_u16(),
                message,
                body,
            });
        }

        let raw: serde_json::Value = serde_json::from_str(&body)
            .map_err(|source| CarrierError::DeserializeJson {
                source,
                body: body.clone(),
            })?;
        let parsed: SendSmsResponse = serde_json::from_value(raw.clone())
            .map_err(|source| CarrierError::DeserializeJson { source, body })?;

        let message = parsed
            .messages
            .into_iter()
            .next()
            .ok_or_else(|| CarrierError::EmptyResponse { raw: raw.clone() })?;

        #[cfg(feature = "tracing")]
        {
            Span::current()
                .record("message_id", message.message_id.as_deref().unwrap_or_default())
                .set_status(Status::Ok);
        }

        Ok((message, raw))
    }
}
