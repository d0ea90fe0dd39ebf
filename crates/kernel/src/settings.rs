use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "SHELFD_ENV";
const CONFIG_DIR_ENV: &str = "SHELFD_CONFIG_DIR";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub ollama: OllamaSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Default to repo root `config` directory.
                std::env::current_dir()
                    .map(|cwd| cwd.join("config"))
                    .expect("unable to resolve current directory")
            });

        let base_path = config_dir.join("base.toml");
        let environment_filename = format!("{}.toml", environment);
        let environment_path = config_dir.join(environment_filename);

        // Double-underscore separates nesting levels so multi-word fields
        // stay addressable, e.g. SHELFD_SERVER__REQUEST_TIMEOUT_MS or
        // SHELFD_OLLAMA__TIMEOUT_SECS.
        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("SHELFD")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = match environment.as_str() {
            "local" => Environment::Local,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(anyhow!(
                    "unsupported environment '{}'; expected local/staging/production",
                    other
                ));
            }
        };

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        60000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Location of the catalog snapshot file.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "StoreSettings::default_path")]
    pub path: PathBuf,
}

impl StoreSettings {
    fn default_path() -> PathBuf {
        PathBuf::from("data/library.json")
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

/// Connection details for the local LLM inference endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaSettings {
    #[serde(default = "OllamaSettings::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "OllamaSettings::default_model")]
    pub model: String,
    #[serde(default = "OllamaSettings::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl OllamaSettings {
    fn default_endpoint() -> String {
        "http://127.0.0.1:11434".to_string()
    }

    fn default_model() -> String {
        "llama3.2".to_string()
    }

    fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            model: Self::default_model(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_ollama_endpoint_is_local_daemon() {
        let settings = Settings::default();
        assert_eq!(settings.ollama.endpoint, "http://127.0.0.1:11434");
        assert_eq!(settings.ollama.model, "llama3.2");
    }

    #[test]
    fn default_store_path_is_relative_data_dir() {
        let settings = Settings::default();
        assert_eq!(settings.store.path, PathBuf::from("data/library.json"));
    }

    #[test]
    fn env_vars_override_nested_multi_word_fields() {
        // Point at a directory with no config files so only the
        // environment source contributes.
        std::env::set_var(
            "SHELFD_CONFIG_DIR",
            std::env::temp_dir().join("shelfd-no-config"),
        );
        std::env::set_var("SHELFD_SERVER__REQUEST_TIMEOUT_MS", "1234");
        std::env::set_var("SHELFD_OLLAMA__TIMEOUT_SECS", "7");

        let settings = Settings::load().unwrap();

        std::env::remove_var("SHELFD_CONFIG_DIR");
        std::env::remove_var("SHELFD_SERVER__REQUEST_TIMEOUT_MS");
        std::env::remove_var("SHELFD_OLLAMA__TIMEOUT_SECS");

        assert_eq!(settings.server.request_timeout_ms, 1234);
        assert_eq!(settings.ollama.timeout_secs, 7);
    }
}
