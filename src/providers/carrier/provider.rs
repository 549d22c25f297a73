//! Carrier provider implementation.

use super::client::{CarrierClient, CarrierClientBuilder};
use super::errors::{CarrierError, Result};
use super::types::PENDING_GROUP;
use crate::config::{CarrierConfig, env};
use crate::providers::traits::{Delivery, Provider};
use crate::types::{MessageId, NormalizedPhone};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Name reported for deliveries through the carrier API.
pub const PROVIDER_NAME: &str = "carrier";

/// Carrier REST provider.
///
/// Wraps a [`CarrierClient`] and accepts a message only if the carrier puts
/// it into one of the accepted status groups. A provider built from an
/// incomplete [`CarrierConfig`] still exists in the chain, but every send
/// fails with a configuration error before any request is made.
///
/// # Example
///
/// ```rust,ignore
/// use sms_relay::providers::carrier::{CarrierClient, CarrierProvider};
///
/// let client = CarrierClient::with_api_token("your_token")?;
/// let provider = CarrierProvider::new(client, "Clinic");
/// ```
#[derive(Debug, Clone)]
pub struct CarrierProvider {
    client: Option<CarrierClient>,
    sender_id: Option<String>,
    accepted_status_groups: Vec<u32>,
}

impl CarrierProvider {
    /// Create a provider from a ready client.
    pub fn new(client: CarrierClient, sender_id: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            sender_id: Some(sender_id.into()),
            accepted_status_groups: vec![PENDING_GROUP],
        }
    }

    /// Create a provider from configuration.
    ///
    /// Fails only if the HTTP client cannot be built; missing credentials are
    /// reported per send.
    pub fn from_config(config: &CarrierConfig) -> Result<Self> {
        let client = match &config.api_token {
            Some(token) => Some(
                CarrierClientBuilder::new(token.clone())
                    .endpoint(config.base_url.clone())
                    .timeout(config.timeout)
                    .build()?,
            ),
            None => None,
        };

        Ok(Self {
            client,
            sender_id: config.sender_id.clone(),
            accepted_status_groups: config.accepted_status_groups.clone(),
        })
    }

    /// Replace the status groups that count as accepted.
    pub fn with_accepted_status_groups(mut self, groups: Vec<u32>) -> Self {
        self.accepted_status_groups = groups;
        self
    }

    /// Get reference to the inner client, if configured.
    pub fn client(&self) -> Option<&CarrierClient> {
        self.client.as_ref()
    }

    /// Status groups that count as accepted.
    pub fn accepted_status_groups(&self) -> &[u32] {
        &self.accepted_status_groups
    }
}

impl Provider for CarrierProvider {
    type Error = CarrierError;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "CarrierProvider::send",
            skip_all,
            fields(phone = %phone)
        )
    )]
    async fn send(&self, phone: &NormalizedPhone, message: &str) -> Result<Delivery> {
        let client = self
            .client
            .as_ref()
            .ok_or(CarrierError::MissingConfiguration {
                setting: env::CARRIER_API_TOKEN,
            })?;
        let sender_id = self
            .sender_id
            .as_deref()
            .ok_or(CarrierError::MissingConfiguration {
                setting: env::SENDER_ID,
            })?;

        let (sent, raw) = client
            .send_message(sender_id, phone.without_plus(), message)
            .await?;

        let status = &sent.status;
        if !self.accepted_status_groups.contains(&status.group_id) {
            return Err(CarrierError::Rejected {
                group_id: status.group_id,
                name: status
                    .name
                    .clone()
                    .or_else(|| status.group_name.clone())
                    .unwrap_or_else(|| "UNKNOWN".to_string()),
                description: status.description.clone().unwrap_or_default(),
                raw,
            });
        }

        #[cfg(feature = "tracing")]
        debug!(group_id = status.group_id, "Carrier accepted message");

        let message_id = sent
            .message_id
            .map(MessageId::new)
            .unwrap_or_else(|| MessageId::local("carrier"));

        Ok(Delivery::new(message_id).with_raw(raw))
    }
}
