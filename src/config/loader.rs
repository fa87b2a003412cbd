//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Secrets file (chat variant only, optional TOML)
//! 3. Environment variables (documented names only, unprefixed)
//!
//! Loading never validates; callers run `validate()` before first use and
//! halt startup on failure.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{BatchConfig, ChatConfig};
use crate::constants::paths::DEFAULT_SECRETS_FILE;
use crate::types::{LogragError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolve batch configuration: defaults → env vars
    pub fn load_batch() -> Result<BatchConfig> {
        Self::batch_figment()
            .extract()
            .map_err(|e| LogragError::Config(format!("Configuration error: {}", e)))
    }

    /// Resolve chat configuration: defaults → secrets file → env vars
    pub fn load_chat(secrets: Option<&Path>) -> Result<ChatConfig> {
        let secrets = secrets
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_secrets_path);

        Self::chat_figment(&secrets)
            .extract()
            .map_err(|e| LogragError::Config(format!("Configuration error: {}", e)))
    }

    /// Resolve and validate batch configuration in one step
    pub fn resolve_batch() -> Result<BatchConfig> {
        let config = Self::load_batch()?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve and validate chat configuration in one step
    pub fn resolve_chat(secrets: Option<&Path>) -> Result<ChatConfig> {
        let config = Self::load_chat(secrets)?;
        config.validate()?;
        Ok(config)
    }

    fn batch_figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(BatchConfig::default()))
            .merge(Env::raw().only(&BatchConfig::ENV_KEYS))
    }

    fn chat_figment(secrets: &Path) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(ChatConfig::default()));

        if secrets.exists() {
            debug!("Loading secrets from: {}", secrets.display());
            figment = figment.merge(Toml::file(secrets));
        }

        // Environment takes precedence over the secrets file
        figment.merge(Env::raw().only(&ChatConfig::ENV_KEYS))
    }

    /// Default secrets file (.lograg/secrets.toml)
    pub fn default_secrets_path() -> PathBuf {
        PathBuf::from(DEFAULT_SECRETS_FILE)
    }

    /// Render resolved configuration for `config show`
    pub fn render(info: &serde_json::Value, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(info)?)
        } else {
            toml::to_string_pretty(info).map_err(|e| LogragError::Config(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_load_batch_defaults() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load_batch().unwrap();
            assert_eq!(config.batch_size, 10);
            assert_eq!(config.max_text_length, 8000);
            assert!(!config.enable_caching);
            Ok(())
        });
    }

    #[test]
    fn test_batch_env_override() {
        Jail::expect_with(|jail| {
            jail.set_env("BATCH_SIZE", "2");
            jail.set_env("ENABLE_CACHING", "true");
            jail.set_env("BEDROCK_MODEL_ID", "amazon.titan-embed-text-v2:0");
            let config = ConfigLoader::load_batch().unwrap();
            assert_eq!(config.batch_size, 2);
            assert!(config.enable_caching);
            assert_eq!(config.bedrock_model_id, "amazon.titan-embed-text-v2:0");
            Ok(())
        });
    }

    #[test]
    fn test_batch_invalid_env_fails_validation() {
        Jail::expect_with(|jail| {
            jail.set_env("MAX_TEXT_LENGTH", "0");
            jail.set_env("BEDROCK_MAX_RETRIES", "-1");
            let err = ConfigLoader::resolve_batch().unwrap_err();
            let message = err.to_string();
            assert!(message.contains("MAX_TEXT_LENGTH"));
            assert!(message.contains("BEDROCK_MAX_RETRIES"));
            Ok(())
        });
    }

    #[test]
    fn test_unparseable_env_is_config_error() {
        Jail::expect_with(|jail| {
            jail.set_env("BATCH_SIZE", "ten");
            let err = ConfigLoader::load_batch().unwrap_err();
            assert!(err.is_config());
            Ok(())
        });
    }

    #[test]
    fn test_chat_secrets_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "secrets.toml",
                r#"
                opensearch_host = "https://from-secrets.example.com"
                index_name = "secret-index"
                "#,
            )?;
            jail.set_env("INDEX_NAME", "env-index");

            let config = ConfigLoader::resolve_chat(Some(Path::new("secrets.toml"))).unwrap();
            assert_eq!(config.opensearch_host, "https://from-secrets.example.com");
            assert_eq!(config.index_name, "env-index");
            Ok(())
        });
    }

    #[test]
    fn test_chat_password_held_as_secret() {
        use secrecy::ExposeSecret;

        Jail::expect_with(|jail| {
            jail.create_file(
                "secrets.toml",
                r#"
                opensearch_host = "https://search.example.com"
                opensearch_username = "admin"
                opensearch_password = "hunter2"
                "#,
            )?;

            let config = ConfigLoader::resolve_chat(Some(Path::new("secrets.toml"))).unwrap();
            let password = config.opensearch_password.as_ref().unwrap();
            assert_eq!(password.expose_secret(), "hunter2");
            assert!(!format!("{:?}", config).contains("hunter2"));
            Ok(())
        });
    }

    #[test]
    fn test_chat_without_endpoint_fails() {
        Jail::expect_with(|_jail| {
            let err = ConfigLoader::resolve_chat(Some(Path::new("missing.toml"))).unwrap_err();
            assert!(err.to_string().contains("OPENSEARCH_HOST"));
            Ok(())
        });
    }

    #[test]
    fn test_render_formats() {
        let info = BatchConfig::default().debug_info();
        let json = ConfigLoader::render(&info, true).unwrap();
        assert!(json.contains("\"batch_size\": 10"));
        let toml = ConfigLoader::render(&info, false).unwrap();
        assert!(toml.contains("batch_size = 10"));
    }
}
