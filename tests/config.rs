use std::fs;

use kestrel::{ConfigError, SimConfig};
use pretty_assertions::assert_eq;

#[test]
fn test_load_full_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kestrel.yaml");
    fs::write(
        &path,
        "timestep: 0.02\ntelemetry:\n  port: 14550\n  update_rate: 25.0\n",
    )
    .unwrap();

    let config = SimConfig::from_file(&path).unwrap();
    assert_eq!(config.timestep, 0.02);
    assert_eq!(config.telemetry.port, 14550);
    assert_eq!(config.telemetry.update_rate, 25.0);
}

#[test]
fn test_missing_file_is_a_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SimConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileError(_)));
}

#[test]
fn test_invalid_timestep_in_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kestrel.yaml");
    fs::write(&path, "timestep: -0.01\n").unwrap();

    let err = SimConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_yaml_round_trip() {
    let config = SimConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    assert_eq!(SimConfig::from_yaml(&yaml).unwrap(), config);
}
