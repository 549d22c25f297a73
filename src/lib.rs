//! # SMS Relay
//!
//! Multi-provider SMS delivery with ordered fallback.
//!
//! A message goes out through the first provider that accepts it: the
//! carrier's REST API, then a GSM modem on a local serial port, then an
//! independent REST gateway. Every attempt is recorded, so a failed
//! delivery explains itself provider by provider.
//!
//! ## Supported Providers
//!
//! | Provider | Name | Transport |
//! |----------|------|-----------|
//! | [`CarrierProvider`] | `carrier` | HTTPS, bearer token |
//! | [`GsmModemProvider`] | `gsm_modem` | Serial AT commands, SMS text mode |
//! | [`SecondaryProvider`] | `secondary` | HTTPS, bearer key |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sms_relay::{SmsConfig, SmsDispatcher, SmsRequest, SmsSender};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads SMS_CARRIER_API_TOKEN, SMS_SERIAL_PORTS, ... once
//!     let config = SmsConfig::from_env()?;
//!     let dispatcher = SmsDispatcher::from_config(&config)?;
//!
//!     let result = dispatcher
//!         .send_sms(&SmsRequest::new("067 051 141", "Your appointment is tomorrow at 10:00"))
//!         .await;
//!
//!     // Serializable {success, messageId, cost, method, error, attempts}
//!     println!("{}", serde_json::to_string_pretty(&result.to_response())?);
//!
//!     // Or bail out with `?`
//!     let outcome = result.into_result()?;
//!     println!("Sent via {}", outcome.provider_name);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SmsDispatcher          (normalizes the number once, walks the chain)
//!         │
//!         ▼
//! Vec<dyn SmsStrategy>   (one attempt each, errors become outcomes)
//!         │
//!         ├── CarrierProvider    ── CarrierClient   (reqwest-middleware)
//!         ├── GsmModemProvider   ── SerialAtTransport ── SerialOpener
//!         └── SecondaryProvider  ── SecondaryClient (reqwest-middleware)
//! ```
//!
//! ## Features
//!
//! - `tracing` - OpenTelemetry tracing instrumentation (enabled by default)

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod providers;
pub mod serial;
pub mod types;
pub mod utils;

// Re-export commonly used types at the crate root
pub use config::{CarrierConfig, ConfigError, ModemConfig, PhoneConfig, SecondaryConfig, SmsConfig};
pub use dispatcher::{DispatchError, SmsDispatcher, SmsDispatcherBuilder, SmsSender};
pub use errors::{ClassifiedError, FailureKind};
pub use providers::{
    CarrierProvider, Delivery, GsmModemProvider, Provider, SecondaryProvider, SmsStrategy,
};
pub use types::{
    DialCode, MessageId, MessageKind, NormalizedPhone, ProviderOutcome, SmsRequest, SmsResponse,
    SmsResult,
};
pub use utils::phone::PhoneNormalizer;
pub use utils::retry::RetryConfig;

pub use tokio_util::sync::CancellationToken;
