//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Approximate pricing used for cost estimates.
///
/// These figures are estimates for reporting only and are not billing-accurate.
pub mod pricing {
    /// USD per 1000 embedding tokens (Titan text embeddings)
    pub const EMBEDDING_USD_PER_1K_TOKENS: f64 = 0.0001;

    /// USD per 1M LLM input tokens
    pub const LLM_INPUT_USD_PER_1M_TOKENS: f64 = 3.0;

    /// USD per 1M LLM output tokens
    pub const LLM_OUTPUT_USD_PER_1M_TOKENS: f64 = 15.0;
}

/// Usage tracking windows
pub mod usage {
    /// Width of the rate-limit window (seconds)
    pub const RATE_WINDOW_SECS: i64 = 60 * 60;

    /// Request timestamps older than this are pruned (seconds)
    pub const RATE_RETENTION_SECS: i64 = 24 * 60 * 60;
}

/// Query cache constants
pub mod cache {
    /// Maximum live entries in the query cache
    pub const MAX_QUERY_CACHE_ENTRIES: usize = 50;

    /// Query cache entry lifetime (seconds)
    pub const QUERY_CACHE_TTL_SECS: u64 = 300;

    /// Number of query characters echoed into cache log lines
    pub const LOGGED_QUERY_CHARS: usize = 50;
}

/// Synthesis constants
pub mod synthesis {
    /// Anthropic messages API version accepted by Bedrock
    pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

    /// Maximum tokens generated per answer
    pub const MAX_ANSWER_TOKENS: u32 = 4096;

    /// Phrase the model must use when the logs do not contain the answer
    pub const CANNOT_ANSWER: &str = "I cannot answer the question based on the provided logs.";
}

/// Search backend constants
pub mod search {
    /// Vector field holding log embeddings
    pub const VECTOR_FIELD: &str = "log_embedding";

    /// Source field returned as the log text
    pub const MESSAGE_FIELD: &str = "message";

    /// Placeholder shipped in templates; must be replaced before use
    pub const PLACEHOLDER_ENDPOINT: &str = "YOUR_OPENSEARCH_SERVERLESS_ENDPOINT";

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 200;

    /// Maximum delay between retries (seconds)
    pub const RETRY_MAX_DELAY_SECS: u64 = 5;

    /// SigV4 service name for OpenSearch Serverless collections
    pub const SIGNING_SERVICE: &str = "aoss";
}

/// Configuration file locations
pub mod paths {
    /// Default secrets/settings file for the chat variant
    pub const DEFAULT_SECRETS_FILE: &str = ".lograg/secrets.toml";
}
