//! Configuration tests

use super::*;
use tempfile::NamedTempFile;

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(config.version, parsed.version);
    assert_eq!(config.plugins.enabled, parsed.plugins.enabled);
}

#[test]
fn test_default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_config_round_trip_through_file() {
    let mut config = Config::default();
    config.api_keys.openweathermap = "abc123".to_string();
    config.plugins.settings.weather.city_id = 2643743;

    let temp_file = NamedTempFile::new().unwrap();
    config.save_to_file(temp_file.path()).unwrap();

    let loaded = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(loaded.api_keys.openweathermap, "abc123");
    assert_eq!(loaded.plugins.settings.weather.city_id, 2643743);
}

#[test]
fn test_unsupported_version_is_rejected() {
    let mut config = Config::default();
    config.version = "2.0".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_default_plugin_must_be_enabled() {
    let mut config = Config::default();
    config.plugins.enabled = vec!["weather".to_string()];
    config.plugins.default = "clock".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_plugin_name_is_rejected() {
    let mut config = Config::default();
    config.plugins.enabled.push("news".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_empty_enabled_list_is_rejected() {
    let mut config = Config::default();
    config.plugins.enabled.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_dimensions_are_rejected() {
    let mut config = Config::default();
    config.display.width = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_odd_rotation_is_rejected() {
    let mut config = Config::default();
    config.display.rotation = 45;
    assert!(config.validate().is_err());
}

#[test]
fn test_partial_yaml_fills_defaults() {
    let yaml = "version: \"1.0\"\nplugins:\n  enabled: [clock]\n  default: clock\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.display.width, 800);
    assert_eq!(config.scheduler.tick_secs, 5);
}
