use knx_link_config::{AppConfig, ConfigError, KnxMode};
use std::collections::HashMap;

fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_vars(|key| vars.get(key).cloned())
}

#[test]
fn defaults_without_variables() {
    let config = load(&[]).expect("config");
    assert_eq!(config.listen_addr(), "0.0.0.0:3672");
    assert!(config.allowed_addresses.is_empty());
    assert!(config.notify_rejected);
    assert_eq!(config.queue_capacity, 1024);
    assert_eq!(config.read_buffer_size, 512);
    assert_eq!(config.knx.mode, KnxMode::Tunneling);
    assert_eq!(config.knx.port, 3671);
    assert!(config.knx.uses_discovery());
}

#[test]
fn reads_all_variables() {
    let config = load(&[
        ("KNX_LINK_SERVER_ADDR", "127.0.0.1"),
        ("KNX_LINK_SERVER_PORT", "4000"),
        ("KNX_LINK_ALLOWED_ADDRESSES", "10.0.0.1, 10.0.0.2"),
        ("KNX_LINK_NOTIFY_REJECTED", "false"),
        ("KNX_LINK_QUEUE_CAPACITY", "8"),
        ("KNX_LINK_READ_BUFFER_SIZE", "64"),
        ("KNX_LINK_KNX_MODE", "routing"),
        ("KNX_LINK_KNX_NAT", "on"),
        ("KNX_LINK_KNX_ADDRESS", "192.168.1.10"),
        ("KNX_LINK_KNX_PORT", "3700"),
    ])
    .expect("config");

    assert_eq!(config.listen_addr(), "127.0.0.1:4000");
    assert_eq!(config.allowed_addresses, vec!["10.0.0.1", "10.0.0.2"]);
    assert!(!config.notify_rejected);
    assert_eq!(config.queue_capacity, 8);
    assert_eq!(config.read_buffer_size, 64);
    assert_eq!(config.knx.mode, KnxMode::Routing);
    assert!(config.knx.nat);
    assert_eq!(config.knx.address, Some("192.168.1.10".parse().unwrap()));
    assert_eq!(config.knx.port, 3700);
}

#[test]
fn empty_values_fall_back_to_defaults() {
    let config = load(&[("KNX_LINK_SERVER_PORT", ""), ("KNX_LINK_KNX_ADDRESS", " ")])
        .expect("config");
    assert_eq!(config.server_port, 3672);
    assert_eq!(config.knx.address, None);
}

#[test]
fn rejects_invalid_values() {
    assert!(matches!(
        load(&[("KNX_LINK_SERVER_PORT", "70000")]),
        Err(ConfigError::Invalid(key, _)) if key == "KNX_LINK_SERVER_PORT"
    ));
    assert!(matches!(
        load(&[("KNX_LINK_READ_BUFFER_SIZE", "8")]),
        Err(ConfigError::Invalid(key, _)) if key == "KNX_LINK_READ_BUFFER_SIZE"
    ));
    assert!(matches!(
        load(&[("KNX_LINK_QUEUE_CAPACITY", "0")]),
        Err(ConfigError::Invalid(..))
    ));
    assert!(matches!(
        load(&[("KNX_LINK_KNX_MODE", "multicast")]),
        Err(ConfigError::Invalid(..))
    ));
}

#[test]
fn from_env_reads_process_environment() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::set_var("KNX_LINK_SERVER_PORT", "3999");
    }
    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.server_port, 3999);
}
