//! Unit tests for configuration parsing and validation.

use std::time::Duration;

use pushgate::config::GlobalConfig;

#[test]
fn defaults_match_documented_values() {
    let config = GlobalConfig::default();

    assert_eq!(config.http_host, "127.0.0.1");
    assert_eq!(config.http_port, 8000);
    assert_eq!(config.heartbeat_seconds, 25);
    assert_eq!(config.queue_capacity, 64);
    assert!(config.aggressive_direct_list);
    assert_eq!(config.server_name, "calculator-server");
    assert_eq!(config.server_version, "1.0.0");
}

#[test]
fn empty_toml_yields_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("empty config is valid");
    assert_eq!(config, GlobalConfig::default());
}

#[test]
fn fields_can_be_overridden() {
    let config = GlobalConfig::from_toml_str(
        r#"
        http_port = 9100
        heartbeat_seconds = 10
        queue_capacity = 4
        aggressive_direct_list = false
        list_changed_delay_ms = 100
        "#,
    )
    .expect("valid config");

    assert_eq!(config.http_port, 9100);
    assert_eq!(config.heartbeat_interval(), Duration::from_secs(10));
    assert_eq!(config.queue_capacity, 4);
    assert!(!config.aggressive_direct_list);
    assert_eq!(config.list_changed_delay(), Duration::from_millis(100));
}

#[test]
fn delay_accessors_convert_milliseconds() {
    let config = GlobalConfig::default();

    assert_eq!(config.list_changed_delay(), Duration::from_millis(500));
    assert_eq!(config.direct_list_delay(), Duration::from_millis(1000));
    assert_eq!(
        config.direct_list_followup_delay(),
        Duration::from_millis(500)
    );
}

#[test]
fn zero_queue_capacity_is_rejected() {
    let err = GlobalConfig::from_toml_str("queue_capacity = 0").unwrap_err();
    assert!(err.to_string().contains("queue_capacity"));
}

#[test]
fn zero_heartbeat_is_rejected() {
    let err = GlobalConfig::from_toml_str("heartbeat_seconds = 0").unwrap_err();
    assert!(err.to_string().contains("heartbeat_seconds"));
}

#[test]
fn empty_server_name_is_rejected() {
    let err = GlobalConfig::from_toml_str(r#"server_name = """#).unwrap_err();
    assert!(err.to_string().contains("server_name"));
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = GlobalConfig::from_toml_str("http_port = \"not a number\"").unwrap_err();
    assert!(err.to_string().starts_with("config:"), "got {err}");
}

#[test]
fn missing_file_is_a_config_error() {
    let err = GlobalConfig::load_from_path("/nonexistent/pushgate.toml").unwrap_err();
    assert!(err.to_string().contains("failed to read config"));
}
