//! Phone number normalization.

use crate::config::PhoneConfig;
use crate::types::NormalizedPhone;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]+").unwrap());

/// Converts local and international phone strings into `+<countrycode><subscriber>`.
///
/// Normalization never fails: input that matches none of the known shapes is
/// passed through with a `+` in front, and the providers reject it if it is
/// truly invalid. Normalizing an already normalized number returns it unchanged.
///
/// # Example
///
/// ```rust
/// use sms_relay::PhoneNormalizer;
///
/// let normalizer = PhoneNormalizer::default();
/// assert_eq!(normalizer.normalize("067 123 456").as_str(), "+38267123456");
/// assert_eq!(normalizer.normalize("67123456").as_str(), "+38267123456");
/// assert_eq!(normalizer.normalize("+382 67 051 141").as_str(), "+38267051141");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PhoneNormalizer {
    config: PhoneConfig,
}

impl PhoneNormalizer {
    /// Create a normalizer for the given country settings.
    pub fn new(config: PhoneConfig) -> Self {
        Self { config }
    }

    /// Get reference to the normalization settings.
    pub fn config(&self) -> &PhoneConfig {
        &self.config
    }

    /// Normalize a raw phone string.
    pub fn normalize(&self, raw: &str) -> NormalizedPhone {
        let raw = raw.trim();
        let digits = NON_DIGITS.replace_all(raw, "");
        let country_code = self.config.country_code.as_str();

        let normalized = if digits.starts_with(country_code) {
            format!("+{}", digits)
        } else if let Some(rest) = self.strip_trunk_prefix(&digits) {
            format!("+{}{}", country_code, rest)
        } else if self.has_mobile_prefix(&digits) {
            format!("+{}{}", country_code, digits)
        } else if raw.starts_with('+') {
            raw.to_string()
        } else {
            format!("+{}", raw)
        };

        NormalizedPhone::from_normalized(normalized)
    }

    fn strip_trunk_prefix<'a>(&self, digits: &'a str) -> Option<&'a str> {
        let trunk = self.config.trunk_prefix.as_str();
        if trunk.is_empty() {
            return None;
        }
        digits.strip_prefix(trunk)
    }

    fn has_mobile_prefix(&self, digits: &str) -> bool {
        self.config
            .mobile_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && digits.starts_with(prefix.as_str()))
    }
}

/// Normalize a phone string with the default country settings.
pub fn normalize(raw: &str) -> NormalizedPhone {
    PhoneNormalizer::default().normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DialCode;

    #[test]
    fn test_trunk_prefix_is_replaced() {
        assert_eq!(normalize("067123456").as_str(), "+38267123456");
        assert_eq!(normalize("067051141").as_str(), "+38267051141");
    }

    #[test]
    fn test_mobile_prefix_gets_country_code() {
        assert_eq!(normalize("67123456").as_str(), "+38267123456");
    }

    #[test]
    fn test_international_number_unchanged() {
        assert_eq!(normalize("+38267051141").as_str(), "+38267051141");
        assert_eq!(normalize("38267051141").as_str(), "+38267051141");
    }

    #[test]
    fn test_formatting_characters_are_stripped() {
        assert_eq!(normalize("(067) 123-456").as_str(), "+38267123456");
        assert_eq!(normalize(" +382 67 123 456 ").as_str(), "+38267123456");

        let mixed = normalize("0\u{0666}7123456");
        assert_eq!(mixed.as_str(), "+3827123456");
        assert!(mixed.without_plus().bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_unknown_shapes_fall_through() {
        assert_eq!(normalize("44 20 7946 0958").as_str(), "+44 20 7946 0958");
        assert_eq!(normalize("+1 555 0100").as_str(), "+1 555 0100");
        assert_eq!(normalize("").as_str(), "+");
        assert_eq!(normalize("not a number").as_str(), "+not a number");
    }

    #[test]
    fn test_idempotence() {
        let inputs = [
            "067123456",
            "67123456",
            "+38267051141",
            "(067) 123-456",
            "0",
            "6",
            "44 20 7946 0958",
            "+1 555 0100",
            "not a number",
            "",
            "  0 ",
            "0\u{0666}7123456",
            "\u{0666}\u{0667}",
        ];

        for input in inputs {
            let once = normalize(input);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "normalization of {:?} is not idempotent", input);
        }
    }

    #[test]
    fn test_custom_country() {
        let normalizer = PhoneNormalizer::new(
            PhoneConfig::default()
                .with_country_code(DialCode::new("381").unwrap())
                .with_mobile_prefixes(["6"]),
        );
        assert_eq!(normalizer.normalize("0641234567").as_str(), "+381641234567");
        assert_eq!(normalizer.normalize("641234567").as_str(), "+381641234567");
    }
}
