//! Configuration Types
//!
//! Both variants resolve a flat settings struct whose field names are the
//! lowercase form of the environment variables that override them.
//! Integer settings are signed so that invalid (negative) values survive
//! resolution and are reported by `validate()` instead of failing to parse.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

use crate::constants::search::PLACEHOLDER_ENDPOINT;
use crate::types::{ConfigViolations, Result};

// =============================================================================
// Derived Settings
// =============================================================================

/// Settings consumed by the embedding client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSettings {
    pub model_id: String,
    pub max_text_length: usize,
    pub caching_enabled: bool,
}

/// Settings consumed by the usage tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageLimits {
    pub tracking_enabled: bool,
    pub token_budget: u64,
    /// Per-hour request ceiling; `None` for the batch variant
    pub max_requests_per_hour: Option<u32>,
}

/// Settings for the managed model runtime client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub region: String,
    pub read_timeout: Duration,
    pub max_retries: u32,
}

/// Settings for the logging subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub debug: bool,
}

fn positive_usize(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(usize::MAX)
}

fn positive_u64(value: i64) -> u64 {
    u64::try_from(value.max(0)).unwrap_or(0)
}

fn positive_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn require_positive(violations: &mut Vec<String>, name: &str, value: i64) {
    if value <= 0 {
        violations.push(format!("{name} must be positive, got {value}"));
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn finish(violations: Vec<String>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigViolations::new(violations).into())
    }
}

// =============================================================================
// Batch Configuration
// =============================================================================

/// Configuration for the batch embedding function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    pub aws_region: String,
    pub bedrock_model_id: String,
    /// Read timeout for model calls (seconds)
    pub bedrock_timeout: i64,
    pub bedrock_max_retries: i64,
    /// Texts longer than this (in characters) are truncated before embedding
    pub max_text_length: i64,
    pub batch_size: i64,
    pub enable_caching: bool,
    pub enable_cost_tracking: bool,
    pub max_tokens_per_execution: i64,
    pub log_level: String,
    pub enable_detailed_logging: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            aws_region: "us-east-1".to_string(),
            bedrock_model_id: "amazon.titan-embed-text-v1".to_string(),
            bedrock_timeout: 30,
            bedrock_max_retries: 3,
            max_text_length: 8000,
            batch_size: 10,
            enable_caching: false,
            enable_cost_tracking: true,
            max_tokens_per_execution: 100_000,
            log_level: "INFO".to_string(),
            enable_detailed_logging: false,
        }
    }
}

impl BatchConfig {
    /// Environment variables read by the batch variant
    pub const ENV_KEYS: [&'static str; 11] = [
        "AWS_REGION",
        "BEDROCK_MODEL_ID",
        "BEDROCK_TIMEOUT",
        "BEDROCK_MAX_RETRIES",
        "MAX_TEXT_LENGTH",
        "BATCH_SIZE",
        "ENABLE_CACHING",
        "ENABLE_COST_TRACKING",
        "MAX_TOKENS_PER_EXECUTION",
        "LOG_LEVEL",
        "ENABLE_DETAILED_LOGGING",
    ];

    /// Check every invariant, reporting all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();
        require_positive(&mut violations, "MAX_TEXT_LENGTH", self.max_text_length);
        require_positive(&mut violations, "BATCH_SIZE", self.batch_size);
        require_positive(&mut violations, "BEDROCK_TIMEOUT", self.bedrock_timeout);
        require_positive(
            &mut violations,
            "MAX_TOKENS_PER_EXECUTION",
            self.max_tokens_per_execution,
        );
        if self.bedrock_max_retries < 0 {
            violations.push(format!(
                "BEDROCK_MAX_RETRIES must be non-negative, got {}",
                self.bedrock_max_retries
            ));
        }
        finish(violations)
    }

    pub fn batch_size(&self) -> usize {
        positive_usize(self.batch_size)
    }

    pub fn embedding_settings(&self) -> EmbeddingSettings {
        EmbeddingSettings {
            model_id: self.bedrock_model_id.clone(),
            max_text_length: positive_usize(self.max_text_length),
            caching_enabled: self.enable_caching,
        }
    }

    pub fn usage_limits(&self) -> UsageLimits {
        UsageLimits {
            tracking_enabled: self.enable_cost_tracking,
            token_budget: positive_u64(self.max_tokens_per_execution),
            max_requests_per_hour: None,
        }
    }

    pub fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            region: self.aws_region.clone(),
            read_timeout: Duration::from_secs(positive_u64(self.bedrock_timeout)),
            max_retries: positive_u32(self.bedrock_max_retries),
        }
    }

    pub fn logging_settings(&self) -> LoggingSettings {
        LoggingSettings {
            level: self.log_level.clone(),
            debug: self.enable_detailed_logging,
        }
    }

    /// Non-sensitive view for debug logging
    pub fn debug_info(&self) -> Value {
        json!({
            "aws_region": self.aws_region,
            "bedrock_model_id": self.bedrock_model_id,
            "bedrock_timeout": self.bedrock_timeout,
            "max_text_length": self.max_text_length,
            "batch_size": self.batch_size,
            "enable_caching": self.enable_caching,
            "enable_cost_tracking": self.enable_cost_tracking,
            "log_level": self.log_level,
        })
    }
}

// =============================================================================
// Chat Configuration
// =============================================================================

/// Configuration for the interactive chat session
///
/// Note: the search password is never serialized to output and is redacted in
/// debug output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub aws_region: String,
    pub opensearch_host: String,
    pub opensearch_username: Option<String>,
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub opensearch_password: Option<SecretString>,
    pub index_name: String,
    pub bedrock_model_id_embedding: String,
    pub bedrock_model_id_claude: String,
    pub bedrock_timeout: i64,
    pub bedrock_max_retries: i64,
    pub default_search_size: i64,
    pub max_search_size: i64,
    pub page_title: String,
    /// Questions longer than this (in characters) are truncated before embedding
    pub max_query_length: i64,
    pub enable_cost_tracking: bool,
    pub max_tokens_per_session: i64,
    pub enable_query_caching: bool,
    pub max_requests_per_hour: i64,
    pub log_level: String,
    pub enable_debug_mode: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            aws_region: "us-east-1".to_string(),
            opensearch_host: PLACEHOLDER_ENDPOINT.to_string(),
            opensearch_username: None,
            opensearch_password: None,
            index_name: "application-logs-*".to_string(),
            bedrock_model_id_embedding: "amazon.titan-embed-text-v1".to_string(),
            bedrock_model_id_claude: "anthropic.claude-3-sonnet-20240229-v1:0".to_string(),
            bedrock_timeout: 30,
            bedrock_max_retries: 3,
            default_search_size: 10,
            max_search_size: 50,
            page_title: "Chat with Your Logs".to_string(),
            max_query_length: 500,
            enable_cost_tracking: true,
            max_tokens_per_session: 500_000,
            enable_query_caching: true,
            max_requests_per_hour: 100,
            log_level: "INFO".to_string(),
            enable_debug_mode: false,
        }
    }
}

impl ChatConfig {
    /// Environment variables read by the chat variant
    pub const ENV_KEYS: [&'static str; 19] = [
        "AWS_REGION",
        "OPENSEARCH_HOST",
        "OPENSEARCH_USERNAME",
        "OPENSEARCH_PASSWORD",
        "INDEX_NAME",
        "BEDROCK_MODEL_ID_EMBEDDING",
        "BEDROCK_MODEL_ID_CLAUDE",
        "BEDROCK_TIMEOUT",
        "BEDROCK_MAX_RETRIES",
        "DEFAULT_SEARCH_SIZE",
        "MAX_SEARCH_SIZE",
        "PAGE_TITLE",
        "MAX_QUERY_LENGTH",
        "ENABLE_COST_TRACKING",
        "MAX_TOKENS_PER_SESSION",
        "ENABLE_QUERY_CACHING",
        "MAX_REQUESTS_PER_HOUR",
        "LOG_LEVEL",
        "ENABLE_DEBUG_MODE",
    ];

    /// Check every invariant, reporting all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();
        if self.opensearch_host.trim().is_empty() || self.opensearch_host == PLACEHOLDER_ENDPOINT
        {
            violations.push("OPENSEARCH_HOST must be set to the search endpoint".to_string());
        }
        require_positive(&mut violations, "BEDROCK_TIMEOUT", self.bedrock_timeout);
        require_positive(&mut violations, "DEFAULT_SEARCH_SIZE", self.default_search_size);
        require_positive(&mut violations, "MAX_SEARCH_SIZE", self.max_search_size);
        require_positive(&mut violations, "MAX_QUERY_LENGTH", self.max_query_length);
        require_positive(
            &mut violations,
            "MAX_TOKENS_PER_SESSION",
            self.max_tokens_per_session,
        );
        require_positive(
            &mut violations,
            "MAX_REQUESTS_PER_HOUR",
            self.max_requests_per_hour,
        );
        if self.bedrock_max_retries < 0 {
            violations.push(format!(
                "BEDROCK_MAX_RETRIES must be non-negative, got {}",
                self.bedrock_max_retries
            ));
        }
        if self.max_search_size < self.default_search_size {
            violations.push(format!(
                "MAX_SEARCH_SIZE ({}) must be >= DEFAULT_SEARCH_SIZE ({})",
                self.max_search_size, self.default_search_size
            ));
        }
        finish(violations)
    }

    pub fn default_search_size(&self) -> usize {
        positive_usize(self.default_search_size)
    }

    pub fn max_search_size(&self) -> usize {
        positive_usize(self.max_search_size)
    }

    /// Clamp a requested result size into `[1, max_search_size]`
    pub fn clamp_search_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or_else(|| self.default_search_size())
            .clamp(1, self.max_search_size().max(1))
    }

    pub fn max_retries(&self) -> u32 {
        positive_u32(self.bedrock_max_retries)
    }

    pub fn embedding_settings(&self) -> EmbeddingSettings {
        EmbeddingSettings {
            model_id: self.bedrock_model_id_embedding.clone(),
            max_text_length: positive_usize(self.max_query_length),
            // Whole answers are memoized by the query cache instead
            caching_enabled: false,
        }
    }

    pub fn usage_limits(&self) -> UsageLimits {
        UsageLimits {
            tracking_enabled: self.enable_cost_tracking,
            token_budget: positive_u64(self.max_tokens_per_session),
            max_requests_per_hour: Some(positive_u32(self.max_requests_per_hour)),
        }
    }

    pub fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            region: self.aws_region.clone(),
            read_timeout: Duration::from_secs(positive_u64(self.bedrock_timeout)),
            max_retries: self.max_retries(),
        }
    }

    pub fn logging_settings(&self) -> LoggingSettings {
        LoggingSettings {
            level: self.log_level.clone(),
            debug: self.enable_debug_mode,
        }
    }

    /// Non-sensitive view for debug logging
    pub fn debug_info(&self) -> Value {
        json!({
            "aws_region": self.aws_region,
            "opensearch_configured": self.opensearch_host != PLACEHOLDER_ENDPOINT,
            "index_name": self.index_name,
            "bedrock_embedding_model": self.bedrock_model_id_embedding,
            "bedrock_claude_model": self.bedrock_model_id_claude,
            "default_search_size": self.default_search_size,
            "max_search_size": self.max_search_size,
            "cost_tracking_enabled": self.enable_cost_tracking,
            "caching_enabled": self.enable_query_caching,
            "debug_mode": self.enable_debug_mode,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogragError;

    fn configured_chat() -> ChatConfig {
        ChatConfig {
            opensearch_host: "https://search.example.com".to_string(),
            ..ChatConfig::default()
        }
    }

    fn violations(result: Result<()>) -> ConfigViolations {
        match result {
            Err(LogragError::InvalidConfig(v)) => v,
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_defaults_are_valid() {
        let config = BatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size(), 10);
        assert_eq!(config.embedding_settings().max_text_length, 8000);
        assert!(!config.embedding_settings().caching_enabled);
        assert_eq!(config.usage_limits().max_requests_per_hour, None);
    }

    #[test]
    fn test_batch_validation_lists_every_violation() {
        let config = BatchConfig {
            max_text_length: 0,
            batch_size: -1,
            bedrock_timeout: 0,
            bedrock_max_retries: -2,
            ..BatchConfig::default()
        };
        let v = violations(config.validate());
        assert_eq!(v.len(), 4);
        assert!(v.contains("MAX_TEXT_LENGTH"));
        assert!(v.contains("BATCH_SIZE"));
        assert!(v.contains("BEDROCK_TIMEOUT"));
        assert!(v.contains("BEDROCK_MAX_RETRIES"));
    }

    #[test]
    fn test_zero_retries_allowed() {
        let config = BatchConfig {
            bedrock_max_retries: 0,
            ..BatchConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.runtime_settings().max_retries, 0);
    }

    #[test]
    fn test_chat_placeholder_endpoint_rejected() {
        let v = violations(ChatConfig::default().validate());
        assert!(v.contains("OPENSEARCH_HOST"));
        assert!(configured_chat().validate().is_ok());
    }

    #[test]
    fn test_chat_search_size_ordering() {
        let config = ChatConfig {
            default_search_size: 20,
            max_search_size: 10,
            ..configured_chat()
        };
        let v = violations(config.validate());
        assert!(v.contains("MAX_SEARCH_SIZE"));
    }

    #[test]
    fn test_clamp_search_size() {
        let config = configured_chat();
        assert_eq!(config.clamp_search_size(None), 10);
        assert_eq!(config.clamp_search_size(Some(0)), 1);
        assert_eq!(config.clamp_search_size(Some(500)), 50);
        assert_eq!(config.clamp_search_size(Some(25)), 25);
    }

    #[test]
    fn test_chat_debug_info_hides_host_and_password() {
        let config = ChatConfig {
            opensearch_password: Some(SecretString::from("hunter2")),
            ..configured_chat()
        };
        let info = config.debug_info();
        assert_eq!(info["opensearch_configured"], true);
        assert!(!info.to_string().contains("search.example.com"));
        assert!(!format!("{:?}", config).contains("hunter2"));
        assert!(!serde_json::to_string(&config).unwrap().contains("hunter2"));
    }

    #[test]
    fn test_chat_usage_limits() {
        let limits = configured_chat().usage_limits();
        assert_eq!(limits.token_budget, 500_000);
        assert_eq!(limits.max_requests_per_hour, Some(100));
        assert!(!configured_chat().embedding_settings().caching_enabled);
    }
}
