//! GSM modem provider.
//!
//! Delivers messages through a USB GSM modem speaking the Hayes AT command
//! set in SMS text mode.

pub mod discovery;
pub mod errors;
pub mod provider;

pub use discovery::{default_candidate_paths, find_modem, first_responding};
pub use errors::GsmModemError;
pub use provider::{GsmModemProvider, PROVIDER_NAME};
