//! Delivery configuration.
//!
//! Configuration is read once, at startup, and handed to the providers
//! explicitly. Nothing in this crate reads the environment after that.

use crate::providers::gsm_modem::discovery::default_candidate_paths;
use crate::types::{DialCode, DialCodeError};
use secrecy::SecretString;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default carrier API base URL.
pub const DEFAULT_CARRIER_API_URL: &str = "https://api.infobip.com";

/// Default country calling code used by the phone normalizer.
pub const DEFAULT_COUNTRY_CODE: &str = "382";

/// Default serial baud rate for the GSM modem.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default total timeout for one REST call.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable names read by [`SmsConfig::from_env`].
pub mod env {
    pub const CARRIER_API_URL: &str = "SMS_CARRIER_API_URL";
    pub const CARRIER_API_TOKEN: &str = "SMS_CARRIER_API_TOKEN";
    pub const CARRIER_ACCEPTED_GROUPS: &str = "SMS_CARRIER_ACCEPTED_GROUPS";
    pub const SECONDARY_API_URL: &str = "SMS_SECONDARY_API_URL";
    pub const SECONDARY_API_KEY: &str = "SMS_SECONDARY_API_KEY";
    pub const SENDER_ID: &str = "SMS_SENDER_ID";
    pub const SERIAL_PORTS: &str = "SMS_SERIAL_PORTS";
    pub const SERIAL_BAUD_RATE: &str = "SMS_SERIAL_BAUD_RATE";
    pub const COUNTRY_CODE: &str = "SMS_COUNTRY_CODE";
    pub const HTTP_TIMEOUT_SECS: &str = "SMS_HTTP_TIMEOUT_SECS";
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A URL variable could not be parsed.
    #[error("{var} is not a valid URL ('{value}'): {source}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// A numeric variable could not be parsed.
    #[error("{var} must be a number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    /// The country code is not a valid dial code.
    #[error("{var} is not a valid country code: {source}")]
    InvalidCountryCode {
        var: &'static str,
        #[source]
        source: DialCodeError,
    },
}

// =============================================================================
// PhoneConfig
// =============================================================================

/// Settings for phone number normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneConfig {
    /// Country calling code prepended to national numbers.
    pub country_code: DialCode,
    /// Domestic trunk prefix replaced by the country code.
    pub trunk_prefix: String,
    /// Leading digits of national mobile numbers written without the trunk prefix.
    pub mobile_prefixes: Vec<String>,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            country_code: DialCode(DEFAULT_COUNTRY_CODE.to_string()),
            trunk_prefix: "0".to_string(),
            mobile_prefixes: vec!["6".to_string()],
        }
    }
}

impl PhoneConfig {
    /// Set the country calling code.
    pub fn with_country_code(mut self, country_code: DialCode) -> Self {
        self.country_code = country_code;
        self
    }

    /// Set the mobile leading digits.
    pub fn with_mobile_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mobile_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// CarrierConfig
// =============================================================================

/// Settings for the carrier REST provider.
#[derive(Debug, Clone)]
pub struct CarrierConfig {
    /// API base URL.
    pub base_url: Url,
    /// Bearer token. Missing token makes every send fail with a configuration error.
    pub api_token: Option<SecretString>,
    /// Sender identifier shown to the recipient.
    pub sender_id: Option<String>,
    /// Status groups that count as "accepted" (default: `[1]`).
    pub accepted_status_groups: Vec<u32>,
    /// Total timeout for one request.
    pub timeout: Duration,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_CARRIER_API_URL).expect("Invalid default URL"),
            api_token: None,
            sender_id: None,
            accepted_status_groups: vec![1],
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl CarrierConfig {
    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Set the bearer token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(Into::<String>::into(token)));
        self
    }

    /// Set the sender identifier.
    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Set the accepted status groups.
    pub fn with_accepted_status_groups(mut self, groups: Vec<u32>) -> Self {
        self.accepted_status_groups = groups;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// SecondaryConfig
// =============================================================================

/// Settings for the secondary REST gateway.
#[derive(Debug, Clone)]
pub struct SecondaryConfig {
    /// API base URL. There is no public default for this gateway.
    pub base_url: Option<Url>,
    /// Bearer API key.
    pub api_key: Option<SecretString>,
    /// Sender identifier shown to the recipient.
    pub sender_id: Option<String>,
    /// Total timeout for one request.
    pub timeout: Duration,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            sender_id: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl SecondaryConfig {
    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the bearer API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(Into::<String>::into(api_key)));
        self
    }

    /// Set the sender identifier.
    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// ModemConfig
// =============================================================================

/// Settings for the GSM modem provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemConfig {
    /// Serial device paths probed in order during discovery.
    pub candidate_paths: Vec<String>,
    /// Serial baud rate (8N1 framing is fixed).
    pub baud_rate: u32,
    /// Timeout for each step of the send sequence (default: 10 seconds).
    pub command_timeout: Duration,
    /// Timeout for the discovery `AT` probe (default: 2 seconds).
    pub probe_timeout: Duration,
    /// Pause between consecutive AT steps (default: 500 ms).
    pub settle_delay: Duration,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            candidate_paths: default_candidate_paths(),
            baud_rate: DEFAULT_BAUD_RATE,
            command_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(2),
            settle_delay: Duration::from_millis(500),
        }
    }
}

impl ModemConfig {
    /// Set the candidate device paths.
    pub fn with_candidate_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidate_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the per-step command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the discovery probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the pause between AT steps.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

// =============================================================================
// SmsConfig
// =============================================================================

/// Complete configuration for the delivery chain.
#[derive(Debug, Clone, Default)]
pub struct SmsConfig {
    /// Phone normalization settings.
    pub phone: PhoneConfig,
    /// Carrier REST provider settings.
    pub carrier: CarrierConfig,
    /// GSM modem provider settings.
    pub modem: ModemConfig,
    /// Secondary REST gateway settings.
    pub secondary: SecondaryConfig,
}

impl SmsConfig {
    /// Load configuration from process environment variables.
    ///
    /// Unset variables fall back to defaults; missing credentials are not an
    /// error here because each provider reports them when it is attempted.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = SmsConfig::default();

        if let Some(value) = get(env::COUNTRY_CODE) {
            let country_code =
                DialCode::new(&value).map_err(|source| ConfigError::InvalidCountryCode {
                    var: env::COUNTRY_CODE,
                    source,
                })?;
            config.phone.country_code = country_code;
        }

        let http_timeout = match get(env::HTTP_TIMEOUT_SECS) {
            Some(value) => Duration::from_secs(parse_number(env::HTTP_TIMEOUT_SECS, &value)?),
            None => DEFAULT_HTTP_TIMEOUT,
        };
        let sender_id = get(env::SENDER_ID);

        if let Some(value) = get(env::CARRIER_API_URL) {
            config.carrier.base_url = parse_url(env::CARRIER_API_URL, &value)?;
        }
        config.carrier.api_token = get(env::CARRIER_API_TOKEN).map(SecretString::from);
        if let Some(value) = get(env::CARRIER_ACCEPTED_GROUPS) {
            config.carrier.accepted_status_groups = value
                .split(',')
                .map(str::trim)
                .filter(|group| !group.is_empty())
                .map(|group| parse_number(env::CARRIER_ACCEPTED_GROUPS, group))
                .collect::<Result<_, _>>()?;
        }
        config.carrier.sender_id = sender_id.clone();
        config.carrier.timeout = http_timeout;

        if let Some(value) = get(env::SECONDARY_API_URL) {
            config.secondary.base_url = Some(parse_url(env::SECONDARY_API_URL, &value)?);
        }
        config.secondary.api_key = get(env::SECONDARY_API_KEY).map(SecretString::from);
        config.secondary.sender_id = sender_id;
        config.secondary.timeout = http_timeout;

        if let Some(value) = get(env::SERIAL_PORTS) {
            config.modem.candidate_paths = value
                .split(',')
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = get(env::SERIAL_BAUD_RATE) {
            config.modem.baud_rate = parse_number(env::SERIAL_BAUD_RATE, &value)?;
        }

        Ok(config)
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        var,
        value: value.to_string(),
        source,
    })
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}
