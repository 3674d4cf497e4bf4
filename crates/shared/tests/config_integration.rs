//! 配置与可观测性集成测试

use rule_shared::config::{AppConfig, ObservabilityConfig};
use rule_shared::observability;
use std::fs;
use std::path::PathBuf;

fn config_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rule-shared-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_layered_files_override_in_order() {
    let dir = config_dir("layered");
    fs::write(
        dir.join("default.toml"),
        r#"
        [observability]
        log_level = "warn"

        [engine]
        string_ordering = "ordinal"
        debug_trace = false
        "#,
    )
    .unwrap();
    fs::write(
        dir.join("staging.toml"),
        r#"
        [engine]
        debug_trace = true
        "#,
    )
    .unwrap();
    fs::write(
        dir.join("rule-engine.toml"),
        r#"
        [engine]
        string_ordering = "case_insensitive"
        "#,
    )
    .unwrap();

    let config = AppConfig::load_from("rule-engine", "staging", &dir).unwrap();
    fs::remove_dir_all(&dir).unwrap();

    assert_eq!(config.environment, "staging");
    assert_eq!(config.observability.log_level, "warn");
    assert!(config.engine.debug_trace);
    assert_eq!(config.engine.string_ordering, "case_insensitive");
    assert!(!config.is_production());
}

#[test]
fn test_invalid_file_is_reported() {
    let dir = config_dir("invalid");
    fs::write(dir.join("default.toml"), "[engine\nstring_ordering = ").unwrap();

    let result = AppConfig::load_from("rule-engine", "test", &dir);
    fs::remove_dir_all(&dir).unwrap();

    assert!(result.is_err());
}

#[test]
fn test_observability_init_once() {
    let config = ObservabilityConfig {
        log_level: "debug".to_string(),
        json_logs: true,
    };

    let guard = observability::init("rule-engine-test", &config).unwrap();
    assert_eq!(guard.service_name(), "rule-engine-test");

    // 全局订阅者只能安装一次
    assert!(observability::init("rule-engine-test", &config).is_err());
}
