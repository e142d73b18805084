mod common;

use common::test_config;
use memebot::{BotConfig, ConfigError};

#[test]
fn a_complete_config_validates() {
    let mut config = test_config();
    config.target_users = vec!["alice_99".to_owned(), "bob".to_owned()];
    assert!(config.validate().is_ok());
}

#[test]
fn defaults_match_the_documented_knobs() {
    let config = BotConfig::default();
    assert_eq!(config.poll_interval_secs, 120);
    assert_eq!(config.mention_fetch_limit, 20);
    assert_eq!(config.target_fetch_limit, 3);
    assert_eq!(config.freshness_window_secs, 2 * 60 * 60);
    assert_eq!(config.max_thread_depth, 10);
    assert_eq!(config.openai_model, "gpt-4");
    assert!(config.response_template.contains("{coinName}"));
    assert!(config.response_template.contains("{reasoning}"));
}

#[test]
fn validation_aggregates_every_violation() {
    let config = BotConfig {
        username: "way-too-long-and-invalid-handle!".to_owned(),
        target_users: vec!["ok_user".to_owned(), "bad handle".to_owned()],
        ..BotConfig::default()
    };

    let ConfigError::Invalid(message) = config.validate().unwrap_err();
    assert!(message.contains("username"));
    assert!(message.contains("bad handle"));
    assert!(!message.contains("ok_user"));
    assert!(message.contains("agent_id"));
    assert!(message.contains("openai_api_key"));
}

#[test]
fn handles_longer_than_fifteen_chars_are_rejected() {
    let mut config = test_config();
    config.username = "a".repeat(16);
    assert!(config.validate().is_err());
    config.username = "a".repeat(15);
    assert!(config.validate().is_ok());
}

#[test]
fn zero_thread_depth_is_rejected() {
    let mut config = test_config();
    config.max_thread_depth = 0;
    assert!(config.validate().is_err());
}
