//! Ordered provider fallback.

pub(crate) mod error;
pub(crate) mod structure;
pub(crate) mod traits;

pub use error::DispatchError;
pub use structure::{SmsDispatcher, SmsDispatcherBuilder};
pub use traits::SmsSender;
