//! Live delivery tests against real providers.
//!
//! These tests send real messages and are ignored by default.
//!
//! # Setup
//!
//! 1. Copy the example env file:
//!    ```bash
//!    cp tests/.env.example .env
//!    ```
//!
//! 2. Fill in the credentials and `SMS_LIVE_TEST_RECIPIENT`
//!
//! 3. Run the tests:
//!    ```bash
//!    cargo test --test live_delivery -- --ignored --nocapture
//!    ```
//!
//! **WARNING**: Every test sends a real SMS and may cost money!

use sms_relay::{
    CarrierProvider, GsmModemProvider, PhoneNormalizer, Provider, RetryConfig, SecondaryProvider,
    SmsConfig, SmsDispatcher, SmsRequest, SmsSender,
};
use std::env;
use std::time::Duration;

/// Load configuration and the recipient from the environment or `.env`.
fn live_setup() -> (SmsConfig, String) {
    dotenvy::dotenv().ok();

    let config = SmsConfig::from_env().expect("Invalid SMS_* configuration");
    let recipient = env::var("SMS_LIVE_TEST_RECIPIENT").expect(
        "SMS_LIVE_TEST_RECIPIENT environment variable must be set.\n\
         Either:\n\
         1. Copy tests/.env.example to .env and fill it in\n\
         2. Run with: SMS_LIVE_TEST_RECIPIENT=067... cargo test --test live_delivery -- --ignored",
    );
    (config, recipient)
}

fn test_message(via: &str) -> String {
    format!("sms-relay live test via {}", via)
}

// =============================================================================
// Single Provider Tests
// =============================================================================

#[tokio::test]
#[ignore = "requires carrier credentials and sends a real SMS"]
async fn test_carrier_delivery() {
    let (config, recipient) = live_setup();
    let provider = CarrierProvider::from_config(&config.carrier).expect("Failed to build provider");
    let phone = PhoneNormalizer::new(config.phone.clone()).normalize(&recipient);

    let delivery = provider
        .send(&phone, &test_message("carrier"))
        .await
        .expect("Carrier delivery failed");

    println!("Carrier accepted message {}", delivery.message_id);
    assert!(!delivery.message_id.as_str().is_empty());
}

#[tokio::test]
#[ignore = "requires an attached GSM modem and sends a real SMS"]
async fn test_gsm_modem_delivery() {
    let (config, recipient) = live_setup();
    let provider = GsmModemProvider::new(config.modem.clone());
    let phone = PhoneNormalizer::new(config.phone.clone()).normalize(&recipient);

    let delivery = provider
        .send(&phone, &test_message("gsm_modem"))
        .await
        .expect("GSM modem delivery failed");

    println!("Modem sent message {} ({:?})", delivery.message_id, delivery.raw);
    assert!(delivery.message_id.as_str().starts_with("gsm-"));
}

#[tokio::test]
#[ignore = "requires secondary gateway credentials and sends a real SMS"]
async fn test_secondary_delivery() {
    let (config, recipient) = live_setup();
    let provider =
        SecondaryProvider::from_config(&config.secondary).expect("Failed to build provider");
    let phone = PhoneNormalizer::new(config.phone.clone()).normalize(&recipient);

    let delivery = provider
        .send(&phone, &test_message("secondary"))
        .await
        .expect("Secondary delivery failed");

    println!(
        "Secondary accepted message {} (cost {:?})",
        delivery.message_id, delivery.cost
    );
}

// =============================================================================
// Dispatcher Tests
// =============================================================================

#[tokio::test]
#[ignore = "requires provider credentials and sends a real SMS"]
async fn test_dispatcher_delivery() {
    let (config, recipient) = live_setup();
    let dispatcher = SmsDispatcher::from_config(&config).expect("Failed to build dispatcher");

    let result = dispatcher
        .send_sms(&SmsRequest::new(recipient, test_message("dispatcher")))
        .await;

    println!(
        "{}",
        serde_json::to_string_pretty(&result.to_response()).unwrap()
    );
    assert!(result.is_success(), "{}", result.error().unwrap_or_default());
}

#[tokio::test]
#[ignore = "requires provider credentials and sends a real SMS"]
async fn test_dispatcher_delivery_with_retry() {
    let (config, recipient) = live_setup();
    let dispatcher = SmsDispatcher::from_config(&config).expect("Failed to build dispatcher");
    let retry = RetryConfig::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(10))
        .with_max_retries(2);

    let result = dispatcher
        .send_sms_with_retry(
            &SmsRequest::new(recipient, test_message("dispatcher with retry")),
            &retry,
        )
        .await;

    assert!(result.is_success(), "{}", result.error().unwrap_or_default());
}
