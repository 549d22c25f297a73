//! SMS provider implementations.

pub(crate) mod http;
pub(crate) mod traits;

pub mod carrier;
pub mod gsm_modem;
pub mod secondary;

pub use carrier::CarrierProvider;
pub use gsm_modem::GsmModemProvider;
pub use secondary::SecondaryProvider;
pub use traits::{Delivery, Provider, SmsStrategy};
