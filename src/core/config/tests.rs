use super::data::{path_display, Config, ConfigKey, SettingError, DEFAULT_SYSTEM_INSTRUCTION};
use super::io::ConfigError;
use crate::core::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.model_or_default(), DEFAULT_MODEL);
    assert_eq!(config.base_url_or_default(), DEFAULT_BASE_URL);
    assert_eq!(
        config.system_instruction_or_default(),
        DEFAULT_SYSTEM_INSTRUCTION
    );
    assert_eq!(config.theme_name(), "dark");
    assert!(config.markdown_enabled());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config
        .set_value(ConfigKey::Model, "gemini-2.5-pro")
        .expect("set model");
    config
        .set_value(ConfigKey::Markdown, "off")
        .expect("set markdown");
    config.save_to_path(&config_path).expect("save failed");

    let loaded = Config::load_from_path(&config_path).expect("load failed");
    assert_eq!(loaded.model.as_deref(), Some("gemini-2.5-pro"));
    assert_eq!(loaded.markdown, Some(false));
    assert!(!loaded.markdown_enabled());

    let mut loaded = loaded;
    loaded.unset_value(ConfigKey::Model);
    loaded.save_to_path(&config_path).expect("resave failed");

    let reloaded = Config::load_from_path(&config_path).expect("reload failed");
    assert_eq!(reloaded.model, None);
    assert_eq!(reloaded.model_or_default(), DEFAULT_MODEL);
    assert_eq!(reloaded.markdown, Some(false));
}

#[test]
fn invalid_toml_reports_parse_error_with_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "model = [unterminated").expect("write");

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at "));
}

#[test]
fn blank_values_fall_back_to_defaults() {
    let config = Config {
        model: Some("   ".into()),
        system_instruction: Some(String::new()),
        ..Default::default()
    };
    assert_eq!(config.model_or_default(), DEFAULT_MODEL);
    assert_eq!(
        config.system_instruction_or_default(),
        DEFAULT_SYSTEM_INSTRUCTION
    );
}

#[test]
fn config_keys_accept_both_spellings() {
    assert_eq!(ConfigKey::parse("base_url"), Some(ConfigKey::BaseUrl));
    assert_eq!(ConfigKey::parse(" Base-URL "), Some(ConfigKey::BaseUrl));
    assert_eq!(
        ConfigKey::parse("system-instruction"),
        Some(ConfigKey::SystemInstruction)
    );
    assert_eq!(ConfigKey::parse("provider"), None);
}

#[test]
fn set_value_validates_input() {
    let mut config = Config::default();

    assert!(matches!(
        config.set_value(ConfigKey::Theme, "solarized"),
        Err(SettingError::InvalidValue {
            key: ConfigKey::Theme,
            ..
        })
    ));
    assert!(config.set_value(ConfigKey::Markdown, "maybe").is_err());
    assert!(config.set_value(ConfigKey::Model, "  ").is_err());

    config.set_value(ConfigKey::Theme, "LIGHT").expect("theme");
    assert_eq!(config.theme.as_deref(), Some("light"));
    config.set_value(ConfigKey::Markdown, "true").expect("markdown");
    assert_eq!(config.markdown, Some(true));
}

#[test]
fn unknown_key_message_lists_available_keys() {
    let message = SettingError::UnknownKey("colour".into()).to_string();
    assert!(message.contains("colour"));
    assert!(message.contains("model, base-url, system-instruction, theme, markdown"));
}

#[test]
fn summary_marks_defaults() {
    let config = Config {
        theme: Some("light".into()),
        ..Default::default()
    };
    let lines = config.summary_lines();
    assert_eq!(lines[0], format!("model: {DEFAULT_MODEL} (default)"));
    assert_eq!(lines[3], "theme: light");
    assert_eq!(lines[4], "markdown: on");
}

#[test]
fn path_display_is_plain_outside_home() {
    assert_eq!(path_display("/definitely/not/home"), "/definitely/not/home");
}
