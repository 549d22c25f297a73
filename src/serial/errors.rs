//! Error types for serial devices and AT commands.

use crate::errors::{ClassifiedError, FailureKind};
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a serial device handle.
#[derive(Debug, Error)]
pub enum SerialError {
    /// The device could not be opened (missing device, permissions, busy).
    #[error("Failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// The handle was already closed.
    #[error("Serial port {path} is closed")]
    Closed { path: String },

    /// Reading from or writing to the device failed.
    #[error("I/O error on serial port {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while executing one AT command.
#[derive(Debug, Error)]
pub enum AtError {
    /// The device failed below the protocol level.
    #[error(transparent)]
    Serial(#[from] SerialError),

    /// The modem answered with an `ERROR` token instead of the expected one.
    #[error("{command} rejected by modem (expected '{expected}'): {}", compact(response))]
    Rejected {
        command: String,
        expected: &'static str,
        response: String,
    },

    /// No line carrying the expected token arrived in time.
    #[error(
        "{command} timed out after {:.1}s waiting for '{expected}' (received: {})",
        timeout.as_secs_f64(),
        compact(response)
    )]
    Timeout {
        command: String,
        expected: &'static str,
        timeout: Duration,
        response: String,
    },

    /// The device stopped producing data before the expected token arrived.
    #[error(
        "Serial port closed while {command} waited for '{expected}' (received: {})",
        compact(response)
    )]
    Disconnected {
        command: String,
        expected: &'static str,
        response: String,
    },
}

impl AtError {
    /// Raw text received from the modem before the failure, if any.
    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Serial(_) => None,
            Self::Rejected { response, .. }
            | Self::Timeout { response, .. }
            | Self::Disconnected { response, .. } => Some(response.as_str()),
        }
    }
}

impl ClassifiedError for SerialError {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Transport
    }
}

impl ClassifiedError for AtError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Serial(e) => e.failure_kind(),
            Self::Rejected { .. } => FailureKind::Protocol,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Disconnected { .. } => FailureKind::Transport,
        }
    }
}

/// Render a modem transcript on one line for error messages.
fn compact(response: &str) -> String {
    let joined = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");

    if joined.is_empty() {
        "<nothing>".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let rejected = AtError::Rejected {
            command: "AT+CMGS".to_string(),
            expected: ">",
            response: "+CMS ERROR: 500\r\n".to_string(),
        };
        assert_eq!(rejected.failure_kind(), FailureKind::Protocol);
        assert_eq!(rejected.response(), Some("+CMS ERROR: 500\r\n"));

        let timeout = AtError::Timeout {
            command: "AT".to_string(),
            expected: "OK",
            timeout: Duration::from_secs(2),
            response: String::new(),
        };
        assert_eq!(timeout.failure_kind(), FailureKind::Timeout);
        assert!(timeout.to_string().contains("<nothing>"));
    }

    #[test]
    fn test_compact_transcript() {
        assert_eq!(compact("AT\r\n\r\nERROR\r\n"), "AT | ERROR");
    }
}
