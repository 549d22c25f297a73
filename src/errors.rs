//! Error classification shared by every delivery provider.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Class of a failed delivery attempt.
///
/// Every provider-level error maps onto exactly one of these classes. The
/// dispatcher records the class on the attempt's [`ProviderOutcome`] so callers
/// can tell a missing credential apart from a flaky network or a modem that
/// answered `ERROR`.
///
/// [`ProviderOutcome`]: crate::types::ProviderOutcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required credential or setting is missing. Detected before any I/O.
    Configuration,
    /// Network failure, refused connection, or serial device open failure.
    Transport,
    /// A response arrived but did not have the expected shape or token.
    Protocol,
    /// No matching response within the allotted window.
    Timeout,
    /// The caller cancelled the send while this attempt was in flight.
    Cancelled,
}

impl FailureKind {
    /// Returns the stable string form used in logs and serialized outcomes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if running the chain again later might succeed.
    ///
    /// Configuration and protocol failures will repeat until someone fixes a
    /// setting or the provider changes its answer, so only transport and
    /// timeout failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport | Self::Timeout)
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for errors that can be classified into a [`FailureKind`].
///
/// # Examples
///
/// ```rust
/// use sms_relay::{ClassifiedError, FailureKind};
///
/// enum MyError {
///     MissingToken,
///     ConnectionReset,
/// }
///
/// impl ClassifiedError for MyError {
///     fn failure_kind(&self) -> FailureKind {
///         match self {
///             MyError::MissingToken => FailureKind::Configuration,
///             MyError::ConnectionReset => FailureKind::Transport,
///         }
///     }
/// }
///
/// assert!(!MyError::MissingToken.is_retryable());
/// assert!(MyError::ConnectionReset.is_retryable());
/// ```
pub trait ClassifiedError {
    /// Returns the failure class of this error.
    fn failure_kind(&self) -> FailureKind;

    /// Returns true if a later attempt might succeed.
    ///
    /// Default implementation defers to [`FailureKind::is_retryable`].
    fn is_retryable(&self) -> bool {
        self.failure_kind().is_retryable()
    }

    /// Structured diagnostics attached to the failed outcome, if any.
    ///
    /// Providers use this to preserve the raw response they received.
    fn diagnostics(&self) -> Option<serde_json::Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(FailureKind::Transport.is_retryable());
        assert!(FailureKind::Timeout.is_retryable());
        assert!(!FailureKind::Configuration.is_retryable());
        assert!(!FailureKind::Protocol.is_retryable());
        assert!(!FailureKind::Cancelled.is_retryable());
    }

    #[test]
    fn test_serialized_form() {
        let json = serde_json::to_string(&FailureKind::Configuration).unwrap();
        assert_eq!(json, "\"configuration\"");
        assert_eq!(FailureKind::Timeout.to_string(), "timeout");
    }
}
