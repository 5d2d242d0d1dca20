use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful and friendly assistant. Your responses should be informative, well-structured, and concise.";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Gemini model id, e.g. "gemini-2.5-flash"
    pub model: Option<String>,
    /// Root of the Generative Language REST API
    pub base_url: Option<String>,
    pub system_instruction: Option<String>,
    /// UI theme name ("dark" or "light")
    pub theme: Option<String>,
    /// Enable markdown rendering in the chat area
    pub markdown: Option<bool>,
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

/// Keys accepted by `set` and `unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Model,
    BaseUrl,
    SystemInstruction,
    Theme,
    Markdown,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::Model,
        ConfigKey::BaseUrl,
        ConfigKey::SystemInstruction,
        ConfigKey::Theme,
        ConfigKey::Markdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::Model => "model",
            ConfigKey::BaseUrl => "base-url",
            ConfigKey::SystemInstruction => "system-instruction",
            ConfigKey::Theme => "theme",
            ConfigKey::Markdown => "markdown",
        }
    }

    /// Accepts both dashed and underscored spellings.
    pub fn parse(key: &str) -> Option<Self> {
        let normalized = key.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|k| k.as_str() == normalized)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    UnknownKey(String),
    InvalidValue { key: ConfigKey, message: String },
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => {
                let known: Vec<&str> = ConfigKey::ALL.iter().map(|k| k.as_str()).collect();
                write!(
                    f,
                    "Unknown config key '{key}'. Available keys: {}",
                    known.join(", ")
                )
            }
            SettingError::InvalidValue { key, message } => {
                write!(f, "Invalid value for {key}: {message}")
            }
        }
    }
}

impl std::error::Error for SettingError {}

impl Config {
    pub fn model_or_default(&self) -> &str {
        non_blank(self.model.as_deref()).unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url_or_default(&self) -> &str {
        non_blank(self.base_url.as_deref()).unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn system_instruction_or_default(&self) -> &str {
        non_blank(self.system_instruction.as_deref()).unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
    }

    pub fn theme_name(&self) -> &str {
        non_blank(self.theme.as_deref()).unwrap_or("dark")
    }

    pub fn markdown_enabled(&self) -> bool {
        self.markdown.unwrap_or(true)
    }

    pub fn set_value(&mut self, key: ConfigKey, value: &str) -> Result<(), SettingError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SettingError::InvalidValue {
                key,
                message: "value must not be empty".to_string(),
            });
        }
        match key {
            ConfigKey::Model => self.model = Some(trimmed.to_string()),
            ConfigKey::BaseUrl => self.base_url = Some(trimmed.to_string()),
            ConfigKey::SystemInstruction => self.system_instruction = Some(trimmed.to_string()),
            ConfigKey::Theme => match trimmed.to_ascii_lowercase().as_str() {
                name @ ("dark" | "light") => self.theme = Some(name.to_string()),
                _ => {
                    return Err(SettingError::InvalidValue {
                        key,
                        message: format!("'{trimmed}' is not one of: dark, light"),
                    })
                }
            },
            ConfigKey::Markdown => self.markdown = Some(parse_toggle(key, trimmed)?),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::Model => self.model = None,
            ConfigKey::BaseUrl => self.base_url = None,
            ConfigKey::SystemInstruction => self.system_instruction = None,
            ConfigKey::Theme => self.theme = None,
            ConfigKey::Markdown => self.markdown = None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_toggle(key: ConfigKey, value: &str) -> Result<bool, SettingError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(SettingError::InvalidValue {
            key,
            message: format!("'{value}' is not on/off"),
        }),
    }
}
