//! Dispatcher-level error types.

use crate::errors::{ClassifiedError, FailureKind};
use crate::types::{ProviderOutcome, SmsResult, summarize_failures};
use std::error::Error as StdError;
use thiserror::Error;

/// Errors surfaced by the dispatcher.
///
/// [`SmsSender::send_sms`](super::SmsSender::send_sms) itself never fails;
/// these appear when building a dispatcher or when a caller converts an
/// [`SmsResult`] with [`SmsResult::into_result`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Every provider in the chain failed.
    #[error("{summary}")]
    AllProvidersFailed {
        /// One outcome per attempted provider, in attempted order.
        attempts: Vec<ProviderOutcome>,
        summary: String,
    },

    /// The chain is empty.
    #[error("No SMS providers configured")]
    NoProviders,

    /// A provider could not be constructed.
    #[error("Failed to set up {provider} provider: {source}")]
    ProviderSetup {
        provider: &'static str,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl DispatchError {
    /// Per-provider outcomes of a failed chain.
    pub fn attempts(&self) -> &[ProviderOutcome] {
        match self {
            Self::AllProvidersFailed { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

impl ClassifiedError for DispatchError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::AllProvidersFailed { attempts, .. } => attempts
                .last()
                .and_then(|attempt| attempt.failure_kind)
                .unwrap_or(FailureKind::Configuration),
            Self::NoProviders | Self::ProviderSetup { .. } => FailureKind::Configuration,
        }
    }

    fn is_retryable(&self) -> bool {
        self.attempts().iter().any(ProviderOutcome::is_retryable)
    }

    fn diagnostics(&self) -> Option<serde_json::Value> {
        match self {
            Self::AllProvidersFailed { attempts, .. } => serde_json::to_value(attempts).ok(),
            _ => None,
        }
    }
}

impl SmsResult {
    /// View the result as a `Result` for `?`-style callers.
    ///
    /// ```rust
    /// use sms_relay::{ProviderOutcome, MessageId, SmsResult};
    ///
    /// let result = SmsResult::Delivered {
    ///     outcome: ProviderOutcome::delivered("secondary", MessageId::new("m-1")),
    ///     failed_attempts: vec![],
    /// };
    /// let outcome = result.into_result().unwrap();
    /// assert_eq!(outcome.provider_name, "secondary");
    /// ```
    pub fn into_result(self) -> Result<ProviderOutcome, DispatchError> {
        match self {
            Self::Delivered { outcome, .. } => Ok(outcome),
            Self::AllFailed { attempts } if attempts.is_empty() => Err(DispatchError::NoProviders),
            Self::AllFailed { attempts } => Err(DispatchError::AllProvidersFailed {
                summary: summarize_failures(&attempts),
                attempts,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_all_failed() {
        let result = SmsResult::AllFailed {
            attempts: vec![
                ProviderOutcome::failed("carrier", FailureKind::Protocol, "rejected"),
                ProviderOutcome::failed("gsm_modem", FailureKind::Transport, "not found"),
            ],
        };

        let err = result.into_result().unwrap_err();
        assert_eq!(err.attempts().len(), 2);
        assert_eq!(err.failure_kind(), FailureKind::Transport);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("carrier: rejected"));
    }

    #[test]
    fn test_into_result_empty_chain() {
        let err = SmsResult::AllFailed { attempts: vec![] }
            .into_result()
            .unwrap_err();

        assert!(matches!(err, DispatchError::NoProviders));
        assert!(!err.is_retryable());
    }
}
