//! Layered configuration: built-in defaults, then `Config.toml` if present,
//! then `PODIUM__`-prefixed environment variables
//! (e.g. `PODIUM__CHAT__TYPING_DELAY_MS=0`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::engine::EngineOptions;
use crate::language::Language;
use crate::session::ServiceOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSettings {
    /// Replaces the built-in catalog when set.
    #[serde(default)]
    pub catalog_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub default_language: Language,
    pub max_messages: usize,
    pub typing_delay_ms: u64,
    pub session_ttl_secs: u64,
    pub auto_switch_language: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub data: DataSettings,
    pub chat: ChatSettings,
}

impl Settings {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_messages: self.chat.max_messages,
            auto_switch_language: self.chat.auto_switch_language,
        }
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            typing_delay: Duration::from_millis(self.chat.typing_delay_ms),
            state_ttl: Duration::from_secs(self.chat.session_ttl_secs),
            default_language: self.chat.default_language,
        }
    }
}

pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from("Config")
}

/// `name` is a file path without extension; the file is optional.
pub fn load_settings_from(name: &str) -> Result<Settings, ConfigError> {
    Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("chat.default_language", "en")?
        .set_default("chat.max_messages", 50)?
        .set_default("chat.typing_delay_ms", 1500)?
        .set_default("chat.session_ttl_secs", 3600)?
        .set_default("chat.auto_switch_language", false)?
        .add_source(File::with_name(name).required(false))
        .add_source(
            Environment::with_prefix("PODIUM")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_file() {
        let settings = load_settings_from("does-not-exist/podium").unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.chat.default_language, Language::En);
        assert_eq!(settings.chat.max_messages, 50);
        assert!(!settings.chat.auto_switch_language);
        assert!(settings.data.catalog_file.is_none());
        assert_eq!(settings.service_options().typing_delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("podium-settings-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("podium.toml");
        fs::write(
            &path,
            "[chat]\ndefault_language = \"sw\"\ntyping_delay_ms = 0\n\n[server]\nport = 9090\n",
        )
        .unwrap();

        let name = dir.join("podium");
        let settings = load_settings_from(name.to_str().unwrap()).unwrap();
        assert_eq!(settings.chat.default_language, Language::Sw);
        assert_eq!(settings.server.port, 9090);
        assert!(settings.service_options().typing_delay.is_zero());
        assert_eq!(settings.chat.session_ttl_secs, 3600);
        fs::remove_dir_all(dir).ok();
    }
}
