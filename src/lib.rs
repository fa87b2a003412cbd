//! lograg - Retrieval-Augmented Log Analysis
//!
//! Cost-aware orchestration around three managed services: a text embedding
//! model, a k-NN vector search index, and an LLM for answer synthesis.
//!
//! ## Core Features
//!
//! - **Batch Embedding**: enrich log records with vectors, in order, never dropping one
//! - **Log Chat**: question → embedding → k-NN search → grounded answer
//! - **Usage Tracking**: token budget, hourly rate limit, cost estimates
//! - **Caching**: per-invocation embedding cache, per-session query cache
//!
//! ## Quick Start
//!
//! ```ignore
//! use lograg::{BatchOrchestrator, BedrockProvider, ConfigLoader, EmbeddingClient, UsageTracker};
//!
//! let config = ConfigLoader::resolve_batch()?;
//! let provider = BedrockProvider::connect(&config.runtime_settings(), &config.bedrock_model_id).await;
//! let client = EmbeddingClient::new(
//!     provider,
//!     config.embedding_settings(),
//!     UsageTracker::new(config.usage_limits()),
//! );
//! let mut orchestrator = BatchOrchestrator::new(client, config.batch_size());
//! let (enriched, report) = orchestrator.handle(payload, &request_id).await;
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Batch and chat settings, resolved with Figment
//! - [`logging`]: JSON structured logging with correlation ids
//! - [`ai`]: Model providers, embedding client, prompts, usage tracking
//! - [`search`]: k-NN backend and query cache
//! - [`pipeline`]: Batch orchestrator and chat session

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod logging;
pub mod pipeline;
pub mod search;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{BatchConfig, ChatConfig, ConfigLoader};

// Error Types
pub use types::error::{ConfigViolations, ErrorCategory, LogragError, Result};

// Domain Types
pub use types::{BatchPayload, CorrelationId, LogRecord};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    BedrockProvider, EmbeddingClient, EmbeddingOutcome, EmbeddingProvider, SynthesisProvider,
    SynthesisResponse, TokenUsage, UsageSummary, UsageTracker,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{BatchOrchestrator, BatchReport, ChatAnswer, ChatOutcome, ChatSession};
pub use search::{OpenSearchBackend, QueryCache, SearchBackend};
