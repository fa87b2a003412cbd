//! Orchestration Pipelines
//!
//! - [`batch`]: enrich an invocation's log records with embeddings
//! - [`chat`]: answer questions from retrieved log records

pub mod batch;
pub mod chat;

pub use batch::{BatchOrchestrator, BatchReport, effective_batch_size};
pub use chat::{ChatAnswer, ChatOutcome, ChatSession};
