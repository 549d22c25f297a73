//! Fallback dispatcher implementation.

use super::error::DispatchError;
use super::traits::SmsSender;
use crate::config::{PhoneConfig, SmsConfig};
use crate::errors::FailureKind;
use crate::providers::carrier::{self, CarrierProvider};
use crate::providers::gsm_modem::GsmModemProvider;
use crate::providers::secondary::{self, SecondaryProvider};
use crate::providers::traits::{Provider, SmsStrategy};
use crate::serial::{SerialOpener, TokioSerialOpener};
use crate::types::{ProviderOutcome, SmsRequest, SmsResult};
use crate::utils::phone::PhoneNormalizer;
use crate::utils::retry::RetryConfig;
use backon::Retryable;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::{debug, error, info, warn};

/// Delivers SMS through an ordered chain of providers.
///
/// The phone number is normalized once, then each provider gets exactly one
/// attempt, strictly in order, until one accepts the message. Every failure
/// is recorded; when all providers fail the result lists them in attempted
/// order.
///
/// # Example
///
/// ```rust,ignore
/// use sms_relay::{SmsConfig, SmsDispatcher, SmsRequest, SmsSender};
///
/// let dispatcher = SmsDispatcher::from_config(&SmsConfig::from_env()?)?;
///
/// let result = dispatcher
///     .send_sms(&SmsRequest::new("067 051 141", "Your appointment is confirmed"))
///     .await;
///
/// match result.method() {
///     Some(method) => println!("Delivered via {method}"),
///     None => eprintln!("{}", result.error().unwrap_or_default()),
/// }
/// ```
#[derive(Clone)]
pub struct SmsDispatcher {
    normalizer: PhoneNormalizer,
    strategies: Vec<Arc<dyn SmsStrategy>>,
}

impl std::fmt::Debug for SmsDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsDispatcher")
            .field("normalizer", &self.normalizer)
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl SmsDispatcher {
    /// Create a new builder for an empty chain.
    pub fn builder() -> SmsDispatcherBuilder {
        SmsDispatcherBuilder::new()
    }

    /// Build the standard chain `carrier → gsm_modem → secondary`.
    ///
    /// Providers with incomplete settings stay in the chain and report a
    /// configuration failure when their turn comes.
    pub fn from_config(config: &SmsConfig) -> Result<Self, DispatchError> {
        Self::from_config_with_opener(config, TokioSerialOpener)
    }

    /// Build the standard chain with a custom serial device opener.
    pub fn from_config_with_opener<O>(config: &SmsConfig, opener: O) -> Result<Self, DispatchError>
    where
        O: SerialOpener + 'static,
    {
        let carrier = CarrierProvider::from_config(&config.carrier).map_err(|e| {
            DispatchError::ProviderSetup {
                provider: carrier::PROVIDER_NAME,
                source: Box::new(e),
            }
        })?;
        let modem = GsmModemProvider::with_opener(opener, config.modem.clone());
        let secondary = SecondaryProvider::from_config(&config.secondary).map_err(|e| {
            DispatchError::ProviderSetup {
                provider: secondary::PROVIDER_NAME,
                source: Box::new(e),
            }
        })?;

        #[cfg(feature = "tracing")]
        debug!(
            modem_candidates = config.modem.candidate_paths.len(),
            "Built standard provider chain"
        );

        Ok(Self::builder()
            .phone_config(config.phone.clone())
            .provider(carrier)
            .provider(modem)
            .provider(secondary)
            .build())
    }

    /// Get reference to the phone normalizer.
    pub fn normalizer(&self) -> &PhoneNormalizer {
        &self.normalizer
    }

    /// Provider names in chain order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.strategies
            .iter()
            .map(|strategy| strategy.provider_name())
            .collect()
    }

    /// Like [`SmsSender::send_sms`], but stops as soon as `cancel` fires.
    ///
    /// The provider in flight is dropped, which releases any serial device it
    /// held, and is recorded as a [`FailureKind::Cancelled`] failure. Later
    /// providers are not attempted.
    pub async fn send_sms_cancellable(
        &self,
        request: &SmsRequest,
        cancel: &CancellationToken,
    ) -> SmsResult {
        self.run_chain(request, Some(cancel)).await
    }

    /// Re-run the whole chain with exponential backoff while every provider
    /// failed and at least one failure was transient.
    ///
    /// Each run still makes one attempt per provider.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsDispatcher::send_sms_with_retry",
            skip_all,
            fields(max_runs = retry.max_runs())
        )
    )]
    pub async fn send_sms_with_retry(
        &self,
        request: &SmsRequest,
        retry: &RetryConfig,
    ) -> SmsResult {
        let outcome = (|| async move {
            let result = self.run_chain(request, None).await;
            if result.is_success() {
                Ok(result)
            } else {
                Err(result)
            }
        })
        .retry(retry.build_strategy())
        .when(SmsResult::is_retryable)
        .notify(|result, duration| {
            let _ = (result, duration);
            #[cfg(feature = "tracing")]
            warn!(
                error = %result.error().unwrap_or_default(),
                retry_after_secs = %duration.as_secs_f64(),
                "Re-running provider chain after transient failures"
            );
        })
        .await;

        outcome.unwrap_or_else(|failed| failed)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsDispatcher::send_sms",
            skip_all,
            fields(phone, kind = %request.kind, method)
        )
    )]
    async fn run_chain(
        &self,
        request: &SmsRequest,
        cancel: Option<&CancellationToken>,
    ) -> SmsResult {
        let phone = self.normalizer.normalize(&request.to);

        #[cfg(feature = "tracing")]
        {
            tracing::Span::current().record("phone", phone.as_str());
            debug!(providers = self.strategies.len(), "Dispatching SMS");
        }

        let mut failed = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let started = Instant::now();
            let attempt = strategy.attempt(&phone, &request.message);

            let outcome = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        let outcome = ProviderOutcome::failed(
                            strategy.provider_name(),
                            FailureKind::Cancelled,
                            "cancelled before the provider finished",
                        )
                        .with_elapsed(started.elapsed());

                        #[cfg(feature = "tracing")]
                        warn!(provider = strategy.provider_name(), "SMS dispatch cancelled");

                        failed.push(outcome);
                        return SmsResult::AllFailed { attempts: failed };
                    }
                    outcome = attempt => outcome,
                },
                None => attempt.await,
            };

            if outcome.success {
                #[cfg(feature = "tracing")]
                {
                    tracing::Span::current().record("method", outcome.provider_name.as_str());
                    info!(
                        provider = %outcome.provider_name,
                        failed_before = failed.len(),
                        elapsed_ms = outcome.elapsed_ms,
                        "SMS delivered"
                    );
                }

                return SmsResult::Delivered {
                    outcome,
                    failed_attempts: failed,
                };
            }

            #[cfg(feature = "tracing")]
            warn!(
                provider = %outcome.provider_name,
                kind = outcome.failure_kind.map(|k| k.as_str()).unwrap_or_default(),
                error = outcome.error.as_deref().unwrap_or_default(),
                "Provider failed, falling back"
            );

            failed.push(outcome);
        }

        let result = SmsResult::AllFailed { attempts: failed };

        #[cfg(feature = "tracing")]
        error!(error = %result.error().unwrap_or_default(), "All SMS providers failed");

        result
    }
}

impl SmsSender for SmsDispatcher {
    async fn send_sms(&self, request: &SmsRequest) -> SmsResult {
        self.run_chain(request, None).await
    }
}

/// Builder for [`SmsDispatcher`].
///
/// Providers are attempted in the order they are added.
///
/// # Example
///
/// ```rust,ignore
/// use sms_relay::SmsDispatcher;
///
/// let dispatcher = SmsDispatcher::builder()
///     .provider(secondary)
///     .provider(carrier)
///     .build();
/// ```
#[derive(Clone, Default)]
pub struct SmsDispatcherBuilder {
    normalizer: PhoneNormalizer,
    strategies: Vec<Arc<dyn SmsStrategy>>,
}

impl SmsDispatcherBuilder {
    /// Create a new builder with default phone settings and no providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the phone settings used for normalization.
    pub fn phone_config(mut self, config: PhoneConfig) -> Self {
        self.normalizer = PhoneNormalizer::new(config);
        self
    }

    /// Append a provider to the chain.
    pub fn provider<P: Provider + 'static>(mut self, provider: P) -> Self {
        self.strategies.push(Arc::new(provider));
        self
    }

    /// Append an already shared strategy to the chain.
    pub fn strategy(mut self, strategy: Arc<dyn SmsStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Build the [`SmsDispatcher`].
    pub fn build(self) -> SmsDispatcher {
        SmsDispatcher {
            normalizer: self.normalizer,
            strategies: self.strategies,
        }
    }
}
