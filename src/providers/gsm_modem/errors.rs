//! Error types for the GSM modem provider.

use crate::errors::{ClassifiedError, FailureKind};
use crate::serial::AtError;
use thiserror::Error;

/// Result type for GSM modem operations.
pub type Result<T> = std::result::Result<T, GsmModemError>;

/// Errors raised while sending through a locally attached GSM modem.
#[derive(Debug, Error)]
pub enum GsmModemError {
    /// No candidate device answered the discovery probe.
    #[error("GSM modem not found ({})", describe_probed(probed))]
    DeviceNotFound { probed: Vec<String> },

    /// The discovered device could not be opened for the send sequence.
    #[error("Failed to open GSM modem at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: AtError,
    },

    /// A step of the send sequence failed; later steps were not attempted.
    #[error("GSM modem step {step} ({command}) failed: {source}")]
    Step {
        step: usize,
        command: String,
        #[source]
        source: AtError,
    },
}

impl GsmModemError {
    /// One-based index of the failed send step, if a step failed.
    pub fn failed_step(&self) -> Option<usize> {
        match self {
            Self::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl ClassifiedError for GsmModemError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::DeviceNotFound { .. } => FailureKind::Transport,
            Self::Open { source, .. } | Self::Step { source, .. } => source.failure_kind(),
        }
    }

    fn diagnostics(&self) -> Option<serde_json::Value> {
        match self {
            Self::DeviceNotFound { probed } => Some(serde_json::json!({ "probed": probed })),
            Self::Open { path, .. } => Some(serde_json::json!({ "device": path })),
            Self::Step {
                step,
                command,
                source,
            } => Some(serde_json::json!({
                "step": step,
                "command": command,
                "response": source.response(),
            })),
        }
    }
}

fn describe_probed(probed: &[String]) -> String {
    if probed.is_empty() {
        "no candidate device present".to_string()
    } else {
        format!("no answer from {}", probed.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_not_found_message() {
        let err = GsmModemError::DeviceNotFound { probed: vec![] };
        assert_eq!(err.to_string(), "GSM modem not found (no candidate device present)");
        assert_eq!(err.failure_kind(), FailureKind::Transport);
        assert!(err.is_retryable());

        let err = GsmModemError::DeviceNotFound {
            probed: vec!["/dev/ttyUSB0".into(), "/dev/ttyUSB1".into()],
        };
        assert!(err.to_string().contains("/dev/ttyUSB0, /dev/ttyUSB1"));
    }

    #[test]
    fn test_step_failure_diagnostics() {
        let err = GsmModemError::Step {
            step: 3,
            command: "AT+CMGS=\"+38267051141\"".to_string(),
            source: AtError::Rejected {
                command: "AT+CMGS=\"+38267051141\"".to_string(),
                expected: ">",
                response: "\r\nERROR\r\n".to_string(),
            },
        };

        assert_eq!(err.failed_step(), Some(3));
        assert_eq!(err.failure_kind(), FailureKind::Protocol);
        assert!(!err.is_retryable());

        let raw = err.diagnostics().unwrap();
        assert_eq!(raw["step"], 3);
        assert_eq!(raw["response"], "\r\nERROR\r\n");
    }
}
