//! Tests for TOML configuration loading.

use booking_engine::{EngineConfig, EngineError};

#[test]
fn defaults_apply_to_empty_document() {
    let config: EngineConfig = "".parse().expect("empty config is valid");
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.max_repeat_count, 500);
    assert_eq!(config.timezone, "UTC");
}

#[test]
fn fields_are_read() {
    let config: EngineConfig = "max_repeat_count = 52\ntimezone = \"America/Sao_Paulo\"\n"
        .parse()
        .expect("should parse");
    assert_eq!(config.max_repeat_count, 52);
    assert_eq!(config.tz().unwrap(), chrono_tz::America::Sao_Paulo);
    assert!(config.today().is_ok());
}

#[test]
fn invalid_timezone_rejected() {
    let err = "timezone = \"Mars/Olympus\"".parse::<EngineConfig>().unwrap_err();
    assert!(matches!(err, EngineError::Config(ref msg) if msg.contains("Mars/Olympus")));
}

#[test]
fn repeat_limit_out_of_range_rejected() {
    assert!("max_repeat_count = 0".parse::<EngineConfig>().is_err());
    assert!("max_repeat_count = 501".parse::<EngineConfig>().is_err());
}

#[test]
fn malformed_toml_rejected() {
    assert!(matches!("max_repeat_count = ".parse::<EngineConfig>(), Err(EngineError::Config(_))));
}

#[test]
fn missing_file_is_a_config_error() {
    let err = EngineConfig::from_file("/nonexistent/rooms.toml").unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}
