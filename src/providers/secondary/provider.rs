//! Secondary provider implementation.

use super::client::{SecondaryClient, SecondaryClientBuilder};
use super::errors::{Result, SecondaryError};
use crate::config::{SecondaryConfig, env};
use crate::providers::traits::{Delivery, Provider};
use crate::types::{MessageId, NormalizedPhone};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Name reported for deliveries through the secondary API.
pub const PROVIDER_NAME: &str = "secondary";

/// Secondary REST provider, the last resort of the standard chain.
///
/// Like the carrier provider it stays in the chain when unconfigured and
/// reports a configuration failure per send.
#[derive(Debug, Clone)]
pub struct SecondaryProvider {
    client: Option<SecondaryClient>,
    sender_id: Option<String>,
    missing: Option<&'static str>,
}

impl SecondaryProvider {
    /// Create a provider from a ready client.
    pub fn new(client: SecondaryClient, sender_id: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            sender_id: Some(sender_id.into()),
            missing: None,
        }
    }

    /// Create a provider from configuration.
    ///
    /// Fails only if the HTTP client cannot be built; missing settings are
    /// reported per send.
    pub fn from_config(config: &SecondaryConfig) -> Result<Self> {
        let (client, missing) = match (&config.base_url, &config.api_key) {
            (Some(base_url), Some(api_key)) => {
                let client = SecondaryClientBuilder::new(base_url.clone(), api_key.clone())
                    .timeout(config.timeout)
                    .build()?;
                (Some(client), None)
            }
            (None, _) => (None, Some(env::SECONDARY_API_URL)),
            (_, None) => (None, Some(env::SECONDARY_API_KEY)),
        };

        Ok(Self {
            client,
            sender_id: config.sender_id.clone(),
            missing,
        })
    }

    /// Get reference to the inner client, if configured.
    pub fn client(&self) -> Option<&SecondaryClient> {
        self.client.as_ref()
    }
}

impl Provider for SecondaryProvider {
    type Error = SecondaryError;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SecondaryProvider::send",
            skip_all,
            fields(phone = %phone)
        )
    )]
    async fn send(&self, phone: &NormalizedPhone, message: &str) -> Result<Delivery> {
        let client = self.client.as_ref().ok_or(SecondaryError::MissingConfiguration {
            setting: self.missing.unwrap_or(env::SECONDARY_API_KEY),
        })?;
        let sender_id = self
            .sender_id
            .as_deref()
            .ok_or(SecondaryError::MissingConfiguration {
                setting: env::SENDER_ID,
            })?;

        let (response, raw) = client
            .send_message(phone.as_str(), sender_id, message)
            .await?;

        let message_id = match response.remote_id() {
            Some(id) => MessageId::new(id.to_string()),
            None => {
                #[cfg(feature = "tracing")]
                debug!("Secondary response carried no message id");

                MessageId::local("secondary")
            }
        };
        let cost = response.cost.and_then(|amount| amount.value());

        Ok(Delivery::new(message_id).with_cost(cost).with_raw(raw))
    }
}
