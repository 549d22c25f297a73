//! GSM modem provider implementation.

use super::discovery::find_modem;
use super::errors::{GsmModemError, Result};
use crate::config::ModemConfig;
use crate::providers::traits::{Delivery, Provider};
use crate::serial::{
    AtStep, OK_TOKEN, PROMPT_TOKEN, SerialAtTransport, SerialDeviceHandle, SerialOpener,
    TokioSerialOpener,
};
use crate::types::{MessageId, NormalizedPhone};
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Name reported for deliveries through a local modem.
pub const PROVIDER_NAME: &str = "gsm_modem";

/// Sends SMS through a GSM modem attached to a serial port.
///
/// Every send discovers the modem anew among the configured candidate paths,
/// then runs the text-mode sequence `AT`, `AT+CMGF=1`, `AT+CMGS="<phone>"`
/// and the message body. Sends through clones of one provider never overlap.
///
/// # Example
///
/// ```rust,ignore
/// use sms_relay::ModemConfig;
/// use sms_relay::providers::gsm_modem::GsmModemProvider;
///
/// let provider = GsmModemProvider::new(
///     ModemConfig::default().with_candidate_paths(["/dev/ttyUSB2"]),
/// );
/// ```
#[derive(Clone)]
pub struct GsmModemProvider<O: SerialOpener = TokioSerialOpener> {
    transport: SerialAtTransport<O>,
    config: ModemConfig,
    device_lock: Arc<Mutex<()>>,
}

impl<O: SerialOpener> std::fmt::Debug for GsmModemProvider<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GsmModemProvider")
            .field("candidate_paths", &self.config.candidate_paths)
            .field("baud_rate", &self.config.baud_rate)
            .finish()
    }
}

impl GsmModemProvider<TokioSerialOpener> {
    /// Create a provider using the system's serial ports.
    pub fn new(config: ModemConfig) -> Self {
        Self::with_opener(TokioSerialOpener, config)
    }
}

impl<O: SerialOpener> GsmModemProvider<O> {
    /// Create a provider that opens devices through `opener`.
    pub fn with_opener(opener: O, config: ModemConfig) -> Self {
        Self {
            transport: SerialAtTransport::new(opener, config.baud_rate),
            config,
            device_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get reference to the modem configuration.
    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Find the device that will be used for the next send.
    pub async fn discover(&self) -> Result<String> {
        find_modem(
            &self.transport,
            &self.config.candidate_paths,
            self.config.probe_timeout,
        )
        .await
    }

    fn send_steps(&self, phone: &NormalizedPhone, message: &str) -> [AtStep; 4] {
        let timeout = self.config.command_timeout;
        [
            AtStep::command("AT", OK_TOKEN, timeout),
            AtStep::command("AT+CMGF=1", OK_TOKEN, timeout),
            AtStep::command(format!("AT+CMGS=\"{}\"", phone), PROMPT_TOKEN, timeout),
            AtStep::message_body(message, timeout),
        ]
    }

    async fn run_steps(
        &self,
        handle: &mut SerialDeviceHandle<O::Port>,
        steps: &[AtStep],
    ) -> Result<()> {
        for (index, step) in steps.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.settle_delay).await;
            }

            self.transport
                .execute(handle, step)
                .await
                .map_err(|source| GsmModemError::Step {
                    step: index + 1,
                    command: step.label(),
                    source,
                })?;

            #[cfg(feature = "tracing")]
            debug!(step = index + 1, command = %step.label(), "Modem step completed");
        }
        Ok(())
    }
}

impl<O: SerialOpener> Provider for GsmModemProvider<O> {
    type Error = GsmModemError;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "GsmModemProvider::send",
            skip_all,
            fields(phone = %phone)
        )
    )]
    async fn send(&self, phone: &NormalizedPhone, message: &str) -> Result<Delivery> {
        let _guard = self.device_lock.lock().await;

        let path = self.discover().await?;
        let mut handle = self
            .transport
            .open(&path)
            .map_err(|source| GsmModemError::Open {
                path: path.clone(),
                source,
            })?;

        let steps = self.send_steps(phone, message);
        let result = self.run_steps(&mut handle, &steps).await;
        handle.close().await;
        result?;

        #[cfg(feature = "tracing")]
        info!(device = %path, "SMS sent through GSM modem");

        Ok(Delivery::new(MessageId::local("gsm"))
            .with_raw(serde_json::json!({ "device": path })))
    }
}
