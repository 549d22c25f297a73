//! Carrier REST provider.
//!
//! The primary route: the national carrier's bulk SMS API.

pub mod client;
pub mod errors;
pub mod provider;
pub mod types;

pub use client::{CarrierClient, CarrierClientBuilder};
pub use errors::CarrierError;
pub use provider::{CarrierProvider, PROVIDER_NAME};
