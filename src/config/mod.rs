mod ai;
mod basic;

pub use ai::AiConfig;
pub use basic::BasicConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Chat-completions backend used for feedback and insights (see `ai` table).
    #[serde(default)]
    pub ai: AiConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "LEARNIFY_";

impl Config {
    /// Builds a Figment that merges defaults, a config TOML file and `LEARNIFY_*` env vars.
    ///
    /// Nested keys use a double underscore, e.g. `LEARNIFY_BASIC__LISTEN_PORT=9000`.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration by merging defaults, `config.toml` if present, and the environment.
    ///
    /// Note: this does **not** validate required fields like `basic.learnify_key`. Binaries should
    /// call `Config::from_toml()` instead (or validate explicitly) to avoid running with insecure
    /// defaults.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }

    /// Loads configuration from the TOML file (with defaults) and validates required fields.
    pub fn from_toml() -> Self {
        assert!(
            PathBuf::from(DEFAULT_CONFIG_FILE).is_file(),
            "config file not found: {DEFAULT_CONFIG_FILE}"
        );
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration from {DEFAULT_CONFIG_FILE}: {err}")
        });
        cfg.validate().unwrap_or_else(|msg| panic!("{msg}"));
        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.basic.learnify_key.trim().is_empty() {
            return Err("basic.learnify_key must be set and non-empty".to_string());
        }
        if self.ai.enabled && self.ai.api_key.trim().is_empty() {
            return Err("ai.api_key must be set when ai.enabled = true".to_string());
        }
        Ok(())
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_without_a_file() {
        let cfg = Config::default();
        assert_eq!(cfg.basic.listen_port, 8188);
        assert_eq!(cfg.basic.database_url, "sqlite://learnify.db");
        assert!(!cfg.ai.enabled);
        assert_eq!(cfg.ai.model, "gpt-4o");
    }

    #[test]
    fn empty_key_fails_validation() {
        let mut cfg = Config::default();
        assert!(cfg.validate().is_err());
        cfg.basic.learnify_key = "secret".to_string();
        assert!(cfg.validate().is_ok());
        cfg.ai.enabled = true;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn numeric_key_is_accepted() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string("[basic]\nlearnify_key = 12345\n"))
            .extract()
            .unwrap();
        assert_eq!(cfg.basic.learnify_key, "12345");
    }
}
