//! Provider trait definition.

use crate::errors::ClassifiedError;
use crate::types::{MessageId, NormalizedPhone, ProviderOutcome};
use async_trait::async_trait;
use std::error::Error as StdError;
use std::future::Future;
use std::time::Instant;

/// What a provider reports back for an accepted message.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Identifier assigned by the provider, or synthesized locally.
    pub message_id: MessageId,
    /// Cost reported by the provider.
    pub cost: Option<f64>,
    /// Raw provider response kept for diagnostics.
    pub raw: Option<serde_json::Value>,
}

impl Delivery {
    /// Delivery with only a message id.
    pub fn new(message_id: MessageId) -> Self {
        Self {
            message_id,
            cost: None,
            raw: None,
        }
    }

    /// Attach the provider-reported cost.
    pub fn with_cost(mut self, cost: Option<f64>) -> Self {
        self.cost = cost;
        self
    }

    /// Attach the raw provider response.
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Core trait that all SMS providers must implement.
///
/// A provider makes exactly one delivery attempt per call and never retries
/// on its own. The phone number is already normalized.
///
/// # Note on async methods
///
/// `send` returns a `Send` future, making providers usable on multi-threaded
/// executors.
///
/// # Example
///
/// ```rust,ignore
/// use sms_relay::providers::{Delivery, Provider};
/// use sms_relay::{MessageId, NormalizedPhone};
///
/// struct LogOnly;
///
/// impl Provider for LogOnly {
///     type Error = MyError;
///
///     fn name(&self) -> &str {
///         "log_only"
///     }
///
///     async fn send(&self, phone: &NormalizedPhone, message: &str) -> Result<Delivery, MyError> {
///         println!("{phone}: {message}");
///         Ok(Delivery::new(MessageId::local("log")))
///     }
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait Provider: Send + Sync {
    /// Error type returned by provider operations.
    type Error: StdError + ClassifiedError + Send + Sync + 'static;

    /// Stable provider name, reported as `method` on success.
    fn name(&self) -> &str;

    /// Attempt to deliver `message` to `phone` once.
    fn send(
        &self,
        phone: &NormalizedPhone,
        message: &str,
    ) -> impl Future<Output = Result<Delivery, Self::Error>> + Send;
}

/// Object-safe view of a provider used by the dispatcher's ordered chain.
///
/// Every [`Provider`] is a strategy; errors never cross this boundary and
/// come back as failed [`ProviderOutcome`]s instead.
#[async_trait]
pub trait SmsStrategy: Send + Sync {
    /// Name recorded in outcomes.
    fn provider_name(&self) -> &str;

    /// Make one attempt and report it as an outcome.
    async fn attempt(&self, phone: &NormalizedPhone, message: &str) -> ProviderOutcome;
}

#[async_trait]
impl<P: Provider> SmsStrategy for P {
    fn provider_name(&self) -> &str {
        self.name()
    }

    async fn attempt(&self, phone: &NormalizedPhone, message: &str) -> ProviderOutcome {
        let started = Instant::now();
        let outcome = match self.send(phone, message).await {
            Ok(delivery) => ProviderOutcome::delivered(self.name(), delivery.message_id)
                .with_cost(delivery.cost)
                .with_raw(delivery.raw),
            Err(e) => ProviderOutcome::from_error(self.name(), &e),
        };
        outcome.with_elapsed(started.elapsed())
    }
}
