//! Model Integration Layer
//!
//! Provider adapters for the managed model runtime, the embedding client that
//! wraps them, grounding prompts for synthesis, and usage/cost tracking.

pub mod embedding;
pub mod prompt;
pub mod provider;
pub mod usage;

pub use embedding::{EmbeddingClient, EmbeddingOutcome, fingerprint, truncate_chars};
pub use prompt::{PromptBuilder, PromptSection, grounding_prompt};
pub use provider::{
    BedrockProvider, EmbeddingProvider, SynthesisProvider, SynthesisResponse, TokenUsage,
};
pub use usage::{UsageMetrics, UsageSummary, UsageTracker};
