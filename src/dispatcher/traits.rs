//! Sender trait definition.

use crate::types::{SmsRequest, SmsResult};
use std::future::Future;

/// Trait for SMS sending front-ends.
///
/// This is the boundary used by the rest of an application: it takes a raw
/// request and always returns a result value, never an error.
pub trait SmsSender: Send + Sync {
    /// Deliver `request` through the first provider that accepts it.
    ///
    /// Failures of individual providers are recorded in the returned
    /// [`SmsResult`]; nothing is retried.
    fn send_sms(&self, request: &SmsRequest) -> impl Future<Output = SmsResult> + Send;
}
