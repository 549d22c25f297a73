//! Backoff settings for re-running the whole delivery chain.

use backon::ExponentialBuilder;
use std::time::Duration;

/// Backoff settings for [`SmsDispatcher::send_sms_with_retry`].
///
/// Providers are never retried individually. A re-run walks the complete
/// fallback chain again, which can take several modem command timeouts, so
/// the delays are measured in seconds and jittered: many messages failing on
/// the same outage should not all come back at the same instant.
///
/// ```rust
/// use sms_relay::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_min_delay(Duration::from_secs(10))
///     .with_max_retries(1);
/// assert_eq!(config.max_runs(), 2);
///
/// assert_eq!(RetryConfig::none().max_runs(), 1);
/// ```
///
/// [`SmsDispatcher::send_sms_with_retry`]: crate::SmsDispatcher::send_sms_with_retry
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Delay before the first re-run (default: 5 seconds).
    pub min_delay: Duration,
    /// Upper bound for the delay between re-runs (default: 60 seconds).
    pub max_delay: Duration,
    /// Exponential backoff factor (default: 3.0).
    pub factor: f32,
    /// Maximum number of chain re-runs after the first one (default: 2).
    pub max_retries: usize,
    /// Randomize each delay (default: true).
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            factor: 3.0,
            max_retries: 2,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A single chain run with no re-runs.
    pub fn none() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Set the delay before the first re-run.
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    /// Set the maximum delay between re-runs.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the exponential backoff factor.
    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }

    /// Set the maximum number of chain re-runs.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enable or disable delay jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Upper bound on how many times the chain runs, the first run included.
    pub fn max_runs(&self) -> usize {
        self.max_retries + 1
    }

    /// Build the backoff strategy.
    pub fn build_strategy(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay.max(self.min_delay))
            .with_factor(self.factor)
            .with_max_times(self.max_retries);

        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backon::BackoffBuilder;

    #[test]
    fn test_delays_without_jitter() {
        let delays: Vec<Duration> = RetryConfig::default()
            .with_jitter(false)
            .build_strategy()
            .build()
            .collect();

        assert_eq!(delays, vec![Duration::from_secs(5), Duration::from_secs(15)]);
    }

    #[test]
    fn test_max_delay_caps_growth() {
        let delays: Vec<Duration> = RetryConfig::default()
            .with_jitter(false)
            .with_max_retries(4)
            .with_max_delay(Duration::from_secs(20))
            .build_strategy()
            .build()
            .collect();

        assert_eq!(delays.len(), 4);
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(20)));
        assert_eq!(delays[3], Duration::from_secs(20));
    }

    #[test]
    fn test_none_never_reruns() {
        let config = RetryConfig::none();
        assert_eq!(config.max_runs(), 1);
        assert_eq!(config.build_strategy().build().count(), 0);
    }

    #[test]
    fn test_jitter_stays_above_base_delay() {
        let delays: Vec<Duration> = RetryConfig::default().build_strategy().build().collect();

        assert_eq!(delays.len(), 2);
        assert!(delays[0] >= Duration::from_secs(5));
        assert!(delays[0] < Duration::from_secs(10));
    }
}
