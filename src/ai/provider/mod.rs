//! Model Provider Abstraction
//!
//! Two narrow traits over the managed model runtime: one for text embeddings,
//! one for answer synthesis. `BedrockProvider` implements both; tests plug in
//! in-memory mocks.

mod bedrock;

pub use bedrock::BedrockProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::Result;

// =============================================================================
// Synthesis Response with Usage Metrics
// =============================================================================

/// Token usage reported by the synthesis model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u64,
    /// Output tokens (response)
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used (input + output)
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Synthesized answer text with its usage metrics
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResponse {
    pub text: String,
    pub usage: TokenUsage,
}

// =============================================================================
// Provider Traits
// =============================================================================

/// Text → vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one (already truncated) text
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;

    /// Model identifier recorded on annotated records
    fn model(&self) -> &str;
}

/// Prompt → answer
#[async_trait]
pub trait SynthesisProvider: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> Result<SynthesisResponse>;

    fn model(&self) -> &str;
}

#[async_trait]
impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        (**self).embed(text).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

#[async_trait]
impl<P: SynthesisProvider + ?Sized> SynthesisProvider for Arc<P> {
    async fn synthesize(&self, prompt: &str) -> Result<SynthesisResponse> {
        (**self).synthesize(prompt).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}
