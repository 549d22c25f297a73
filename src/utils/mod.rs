//! Helpers shared across providers.

pub mod phone;
pub mod retry;
