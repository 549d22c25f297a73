//! Secondary REST provider.
//!
//! An independent SMS gateway used when both the carrier and the local modem
//! failed.

pub mod client;
pub mod errors;
pub mod provider;
pub mod types;

pub use client::{SecondaryClient, SecondaryClientBuilder};
pub use errors::SecondaryError;
pub use provider::{PROVIDER_NAME, SecondaryProvider};
