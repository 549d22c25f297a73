//! Locating an answering modem among candidate serial devices.

use super::errors::{GsmModemError, Result};
use crate::serial::{OK_TOKEN, SerialAtTransport, SerialOpener};
use std::future::Future;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Serial paths where USB GSM modems usually show up on this platform.
pub fn default_candidate_paths() -> Vec<String> {
    let paths: &[&str] = if cfg!(target_os = "windows") {
        &["COM3", "COM4", "COM5", "COM6"]
    } else if cfg!(target_os = "macos") {
        &[
            "/dev/tty.usbserial",
            "/dev/tty.usbmodem",
            "/dev/cu.usbserial",
            "/dev/cu.usbmodem",
        ]
    } else {
        &[
            "/dev/ttyUSB0",
            "/dev/ttyUSB1",
            "/dev/ttyUSB2",
            "/dev/ttyUSB3",
            "/dev/ttyACM0",
            "/dev/ttyACM1",
            "/dev/serial0",
        ]
    };

    paths.iter().map(|path| path.to_string()).collect()
}

/// Probe candidates in order and return the first one that answers.
///
/// Candidates after the first answering one are never probed.
pub async fn first_responding<C, T, F, Fut>(
    candidates: impl IntoIterator<Item = C>,
    mut probe: F,
) -> Option<T>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for candidate in candidates {
        if let Some(found) = probe(candidate).await {
            return Some(found);
        }
    }
    None
}

/// Find the first existing candidate device that answers `AT` with `OK`.
///
/// Each probe opens and closes the device on its own.
pub async fn find_modem<O: SerialOpener>(
    transport: &SerialAtTransport<O>,
    candidates: &[String],
    probe_timeout: Duration,
) -> Result<String> {
    let present: Vec<String> = candidates
        .iter()
        .filter(|path| transport.opener().exists(path))
        .cloned()
        .collect();

    let found = first_responding(present.clone(), |path: String| async move {
        match transport.send_command(&path, "AT", OK_TOKEN, probe_timeout).await {
            Ok(_) => Some(path),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                debug!(path = %path, error = %_e, "Candidate did not answer probe");
                None
            }
        }
    })
    .await;

    found.ok_or_else(|| GsmModemError::DeviceNotFound { probed: present })
}
