//! Core types for SMS delivery.

use crate::errors::{ClassifiedError, FailureKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// MessageKind
// =============================================================================

/// Error when parsing a message kind.
#[derive(Debug, Clone, Error)]
#[error("unknown message kind '{0}'")]
pub struct UnknownMessageKind(pub String);

/// Business purpose of an outbound message.
///
/// The delivery engine treats every kind the same way; the kind is carried
/// for logging and for collaborators that read it back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Appointment confirmation or change.
    Appointment,
    /// Service status notification.
    StatusUpdate,
    /// Reminder about an upcoming event.
    Reminder,
    /// Free-form message.
    #[default]
    Custom,
}

impl MessageKind {
    /// Returns the snake_case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appointment => "appointment",
            Self::StatusUpdate => "status_update",
            Self::Reminder => "reminder",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for MessageKind {
    type Err = UnknownMessageKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "appointment" => Ok(Self::Appointment),
            "status_update" | "status-update" => Ok(Self::StatusUpdate),
            "reminder" => Ok(Self::Reminder),
            "custom" => Ok(Self::Custom),
            _ => Err(UnknownMessageKind(s.to_string())),
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SmsRequest
// =============================================================================

/// A request to deliver one text message.
///
/// `to` is the raw phone number as the caller has it; the dispatcher
/// normalizes it before any provider sees it.
///
/// # Example
///
/// ```rust
/// use sms_relay::{MessageKind, SmsRequest};
///
/// let request = SmsRequest::new("067 123 456", "Your device is ready for pickup")
///     .with_kind(MessageKind::StatusUpdate);
/// assert_eq!(request.kind, MessageKind::StatusUpdate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRequest {
    /// Raw recipient phone number.
    pub to: String,
    /// Message text.
    pub message: String,
    /// Business purpose of the message.
    #[serde(default)]
    pub kind: MessageKind,
}

impl SmsRequest {
    /// Create a new request of kind [`MessageKind::Custom`].
    pub fn new(to: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            message: message.into(),
            kind: MessageKind::Custom,
        }
    }

    /// Set the message kind.
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }
}

// =============================================================================
// DialCode
// =============================================================================

/// Error when parsing a dial code.
#[derive(Debug, Clone, Error)]
pub enum DialCodeError {
    /// Dial code contains non-digit characters.
    #[error("dial code must contain only digits")]
    NonDigit,
    /// Dial code is empty.
    #[error("dial code cannot be empty")]
    Empty,
}

/// Country calling code (e.g., "382" for Montenegro).
///
/// Dial codes are stored without the leading '+' sign.
///
/// # Example
///
/// ```rust
/// use sms_relay::DialCode;
///
/// let dc = DialCode::new("+382").unwrap();
/// assert_eq!(dc.to_string(), "382");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DialCode(pub(crate) String);

impl DialCode {
    /// Create a new DialCode from a string.
    ///
    /// The input can include a leading '+' which will be stripped.
    pub fn new(s: impl AsRef<str>) -> Result<Self, DialCodeError> {
        let n = s.as_ref().trim().trim_start_matches('+');
        if n.is_empty() {
            return Err(DialCodeError::Empty);
        }
        if !n.chars().all(|c| c.is_ascii_digit()) {
            return Err(DialCodeError::NonDigit);
        }
        Ok(Self(n.to_string()))
    }

    /// Get the dial code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DialCode {
    type Err = DialCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for DialCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for DialCode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        DialCode::new(raw).map_err(de::Error::custom)
    }
}

impl Serialize for DialCode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

// =============================================================================
// NormalizedPhone
// =============================================================================

/// Phone number in canonical international form (`+<countrycode><subscriber>`).
///
/// Only [`PhoneNormalizer`](crate::utils::phone::PhoneNormalizer) constructs
/// values of this type, so holding one means normalization already happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    pub(crate) fn from_normalized(number: String) -> Self {
        Self(number)
    }

    /// Get the number as a string slice, including the leading '+'.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the number without the leading '+'.
    ///
    /// Some REST gateways expect the bare digit form.
    pub fn without_plus(&self) -> &str {
        self.0.strip_prefix('+').unwrap_or(&self.0)
    }
}

impl Display for NormalizedPhone {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NormalizedPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// MessageId
// =============================================================================

/// Identifier of an accepted message.
///
/// REST providers return their own identifiers; the GSM modem transport does
/// not, so the modem provider synthesizes a local one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Create a new MessageId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a locally unique identifier with the given prefix.
    pub fn local(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, uuid::Uuid::new_v4().simple()))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// ProviderOutcome
// =============================================================================

/// Result of one delivery attempt through one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutcome {
    /// Whether the provider accepted the message.
    pub success: bool,
    /// Name of the provider that made this attempt.
    pub provider_name: String,
    /// Identifier of the accepted message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    /// Cost reported by the provider, in the provider's currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Human-readable failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure class, set on failed attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    /// Raw provider response kept for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
    /// Wall time spent in this attempt.
    pub elapsed_ms: u64,
}

impl ProviderOutcome {
    /// Outcome of an accepted message.
    pub fn delivered(provider: impl Into<String>, message_id: MessageId) -> Self {
        Self {
            success: true,
            provider_name: provider.into(),
            message_id: Some(message_id),
            cost: None,
            error: None,
            failure_kind: None,
            raw: None,
            elapsed_ms: 0,
        }
    }

    /// Outcome of a failed attempt.
    pub fn failed(
        provider: impl Into<String>,
        kind: FailureKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            provider_name: provider.into(),
            message_id: None,
            cost: None,
            error: Some(error.into()),
            failure_kind: Some(kind),
            raw: None,
            elapsed_ms: 0,
        }
    }

    /// Outcome of a failed attempt built from a classified provider error.
    pub fn from_error<E>(provider: impl Into<String>, error: &E) -> Self
    where
        E: std::error::Error + ClassifiedError,
    {
        let mut outcome = Self::failed(provider, error.failure_kind(), error.to_string());
        outcome.raw = error.diagnostics();
        outcome
    }

    /// Attach the provider-reported cost.
    pub fn with_cost(mut self, cost: Option<f64>) -> Self {
        self.cost = cost;
        self
    }

    /// Attach the raw provider response.
    pub fn with_raw(mut self, raw: Option<serde_json::Value>) -> Self {
        self.raw = raw;
        self
    }

    /// Record how long the attempt took.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns true if another run of the chain might change this outcome.
    pub fn is_retryable(&self) -> bool {
        !self.success && self.failure_kind.is_some_and(|kind| kind.is_retryable())
    }
}

// =============================================================================
// SmsResult
// =============================================================================

/// Final answer of the fallback dispatcher for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum SmsResult {
    /// A provider accepted the message.
    Delivered {
        /// The accepting provider's outcome.
        outcome: ProviderOutcome,
        /// Failed attempts that preceded it, in attempted order.
        failed_attempts: Vec<ProviderOutcome>,
    },
    /// Every provider in the chain failed.
    AllFailed {
        /// One outcome per attempted provider, in attempted order.
        attempts: Vec<ProviderOutcome>,
    },
}

impl SmsResult {
    /// Returns true if a provider accepted the message.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Name of the provider that delivered the message.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Delivered { outcome, .. } => Some(outcome.provider_name.as_str()),
            Self::AllFailed { .. } => None,
        }
    }

    /// Identifier of the delivered message.
    pub fn message_id(&self) -> Option<&MessageId> {
        match self {
            Self::Delivered { outcome, .. } => outcome.message_id.as_ref(),
            Self::AllFailed { .. } => None,
        }
    }

    /// Cost of the delivered message, if the provider reported one.
    pub fn cost(&self) -> Option<f64> {
        match self {
            Self::Delivered { outcome, .. } => outcome.cost,
            Self::AllFailed { .. } => None,
        }
    }

    /// Every attempt in attempted order, the successful one last.
    pub fn attempts(&self) -> Vec<&ProviderOutcome> {
        match self {
            Self::Delivered {
                outcome,
                failed_attempts,
            } => failed_attempts
                .iter()
                .chain(std::iter::once(outcome))
                .collect(),
            Self::AllFailed { attempts } => attempts.iter().collect(),
        }
    }

    /// Summary of every failure, `None` on success.
    pub fn error(&self) -> Option<String> {
        match self {
            Self::Delivered { .. } => None,
            Self::AllFailed { attempts } => Some(summarize_failures(attempts)),
        }
    }

    /// Returns true if all providers failed and at least one failure was
    /// transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Delivered { .. } => false,
            Self::AllFailed { attempts } => attempts.iter().any(ProviderOutcome::is_retryable),
        }
    }

    /// Convert into the flat response shape consumed by collaborators.
    pub fn to_response(&self) -> SmsResponse {
        SmsResponse {
            success: self.is_success(),
            message_id: self.message_id().map(|id| id.to_string()),
            cost: self.cost(),
            method: self.method().unwrap_or(NO_METHOD).to_string(),
            error: self.error(),
            attempts: self.attempts().into_iter().cloned().collect(),
        }
    }
}

/// `method` reported when no provider delivered the message.
pub const NO_METHOD: &str = "none";

pub(crate) fn summarize_failures(attempts: &[ProviderOutcome]) -> String {
    if attempts.is_empty() {
        return "no SMS providers configured".to_string();
    }

    let details = attempts
        .iter()
        .map(|attempt| {
            format!(
                "{}: {}",
                attempt.provider_name,
                attempt.error.as_deref().unwrap_or("unknown error")
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!("All SMS providers failed ({})", details)
}

/// Flat, serializable view of an [`SmsResult`].
///
/// Field names follow the camelCase contract used by the surrounding
/// application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsResponse {
    /// Whether any provider accepted the message.
    pub success: bool,
    /// Identifier of the delivered message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Cost reported by the delivering provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Name of the delivering provider, or `"none"`.
    pub method: String,
    /// Failure summary when nothing was delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Every attempt in attempted order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<ProviderOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_parse() {
        assert_eq!(
            "appointment".parse::<MessageKind>().unwrap(),
            MessageKind::Appointment
        );
        assert_eq!(
            "Status_Update".parse::<MessageKind>().unwrap(),
            MessageKind::StatusUpdate
        );
        assert!("fax".parse::<MessageKind>().is_err());
    }

    #[test]
    fn test_request_kind_defaults_to_custom() {
        let request: SmsRequest =
            serde_json::from_str(r#"{"to":"067051141","message":"Test"}"#).unwrap();
        assert_eq!(request.kind, MessageKind::Custom);
    }

    #[test]
    fn test_dial_code() {
        assert_eq!(DialCode::new("+382").unwrap().as_str(), "382");
        assert!(matches!(DialCode::new(""), Err(DialCodeError::Empty)));
        assert!(matches!(DialCode::new("38a"), Err(DialCodeError::NonDigit)));
    }

    #[test]
    fn test_local_message_id_is_unique() {
        let a = MessageId::local("gsm");
        let b = MessageId::local("gsm");
        assert!(a.as_str().starts_with("gsm-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_delivered_result_response() {
        let result = SmsResult::Delivered {
            outcome: ProviderOutcome::delivered("secondary", MessageId::from("abc"))
                .with_cost(Some(0.05)),
            failed_attempts: vec![ProviderOutcome::failed(
                "carrier",
                FailureKind::Transport,
                "HTTP 500",
            )],
        };

        let response = result.to_response();
        assert!(response.success);
        assert_eq!(response.method, "secondary");
        assert_eq!(response.message_id.as_deref(), Some("abc"));
        assert_eq!(response.cost, Some(0.05));
        assert_eq!(response.attempts.len(), 2);
        assert_eq!(response.attempts[0].provider_name, "carrier");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["messageId"], "abc");
        assert_eq!(json["attempts"][0]["providerName"], "carrier");
        assert_eq!(json["attempts"][1]["providerName"], "secondary");
        assert_eq!(json["attempts"][0]["failureKind"], "transport");
    }

    #[test]
    fn test_all_failed_result_response() {
        let result = SmsResult::AllFailed {
            attempts: vec![
                ProviderOutcome::failed("carrier", FailureKind::Configuration, "missing token"),
                ProviderOutcome::failed("gsm_modem", FailureKind::Transport, "device not found"),
            ],
        };

        assert!(!result.is_success());
        assert!(result.is_retryable());
        let response = result.to_response();
        assert_eq!(response.method, NO_METHOD);
        let error = response.error.unwrap();
        assert!(error.contains("carrier: missing token"));
        assert!(error.contains("gsm_modem: device not found"));
    }

    #[test]
    fn test_configuration_only_failures_are_not_retryable() {
        let result = SmsResult::AllFailed {
            attempts: vec![ProviderOutcome::failed(
                "carrier",
                FailureKind::Configuration,
                "missing token",
            )],
        };
        assert!(!result.is_retryable());
    }
}
