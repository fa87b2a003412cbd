//! Embedding Client
//!
//! Wraps an [`EmbeddingProvider`] with truncation, an in-memory fingerprint
//! cache, the usage tracker's budget gate, and failure classification.
//! External errors never escape `embed`; callers get an [`EmbeddingOutcome`].
//!
//! Steps per call:
//! 1. Truncate to `max_text_length` characters
//! 2. Cache lookup by SHA-256 of the truncated text (hit records usage, no call)
//! 3. Token budget check (exceeded: no call, no usage recorded)
//! 4. Provider call; success populates the cache, failure is recorded

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info};

use super::provider::EmbeddingProvider;
use super::usage::UsageTracker;
use crate::config::EmbeddingSettings;
use crate::types::{CorrelationId, ErrorCategory};

// =============================================================================
// Outcome
// =============================================================================

/// Result of one `embed` call
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutcome {
    /// Fresh vector from the provider
    Embedded(Vec<f64>),
    /// Vector served from the fingerprint cache
    Cached(Vec<f64>),
    /// Token budget exhausted; the provider was not called
    BudgetExceeded,
    /// Provider call failed
    Failed(ErrorCategory),
}

impl EmbeddingOutcome {
    pub fn vector(&self) -> Option<&[f64]> {
        match self {
            Self::Embedded(v) | Self::Cached(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_vector(self) -> Option<Vec<f64>> {
        match self {
            Self::Embedded(v) | Self::Cached(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.vector().is_some()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Keep at most `max_chars` characters, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// SHA-256 hex digest of the text
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

// =============================================================================
// Client
// =============================================================================

/// Embedding client owning its provider, tracker and cache
pub struct EmbeddingClient<P> {
    provider: P,
    settings: EmbeddingSettings,
    tracker: UsageTracker,
    cache: HashMap<String, Vec<f64>>,
}

impl<P: EmbeddingProvider> EmbeddingClient<P> {
    pub fn new(provider: P, settings: EmbeddingSettings, tracker: UsageTracker) -> Self {
        Self {
            provider,
            settings,
            tracker,
            cache: HashMap::new(),
        }
    }

    /// Model identifier written into annotated records
    pub fn model_id(&self) -> &str {
        &self.settings.model_id
    }

    pub fn tracker(&self) -> &UsageTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut UsageTracker {
        &mut self.tracker
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub async fn embed(&mut self, text: &str, correlation_id: &CorrelationId) -> EmbeddingOutcome {
        let original_length = text.chars().count();
        let text = truncate_chars(text, self.settings.max_text_length);
        let text_length = text.chars().count();

        if text_length < original_length {
            info!(
                original_length,
                truncated_length = text_length,
                correlation_id = %correlation_id,
                "Text truncated for embedding"
            );
        }

        let cache_key = self.settings.caching_enabled.then(|| fingerprint(text));

        if let Some(key) = &cache_key
            && let Some(vector) = self.cache.get(key)
        {
            debug!(cache_key = %key, "Cache hit for embedding");
            self.tracker.track_embedding(text_length, true);
            return EmbeddingOutcome::Cached(vector.clone());
        }

        if !self.tracker.check_limits() {
            error!(
                correlation_id = %correlation_id,
                "Cost limits exceeded, skipping embedding generation"
            );
            return EmbeddingOutcome::BudgetExceeded;
        }

        let start = Instant::now();
        match self.provider.embed(text).await {
            Ok(vector) => {
                self.tracker.track_embedding(text_length, true);

                if let Some(key) = cache_key {
                    self.cache.entry(key).or_insert_with(|| vector.clone());
                }

                info!(
                    text_length,
                    execution_time = (start.elapsed().as_secs_f64() * 1000.0).round() / 1000.0,
                    model_id = %self.settings.model_id,
                    "Embedding generated successfully"
                );
                EmbeddingOutcome::Embedded(vector)
            }
            Err(e) => {
                self.tracker.track_embedding(text_length, false);

                let category = e.category();
                error!(
                    error_category = %category,
                    error_code = e.code(),
                    error_type = e.kind(),
                    error = %e,
                    text_length,
                    correlation_id = %correlation_id,
                    "Embedding generation failed"
                );
                EmbeddingOutcome::Failed(category)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
