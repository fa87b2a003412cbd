//! Retrieval + Synthesis Flow
//!
//! One chat session: question → embedding → k-NN search → grounding prompt →
//! synthesized answer. The session owns its usage tracker (through the
//! embedding client) and its query cache; nothing is shared across sessions.

use serde::Serialize;
use tracing::{Instrument, error, info, warn};

use crate::ai::{
    EmbeddingClient, EmbeddingProvider, SynthesisProvider, UsageSummary, grounding_prompt,
};
use crate::logging;
use crate::search::{CacheStats, QueryCache, SearchBackend};
use crate::types::CorrelationId;

/// Answer plus the log texts it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub logs: Vec<String>,
}

/// Result of one question
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// Blank input; no external calls made
    EmptyQuestion,
    /// Hourly request ceiling reached
    RateLimited,
    /// The question could not be embedded
    EmbeddingFailed,
    SearchFailed(String),
    /// Search succeeded but returned nothing
    NoRelevantLogs,
    SynthesisFailed(String),
    Answered { answer: ChatAnswer, cached: bool },
}

/// Interactive session over one embedder, search backend and synthesizer
pub struct ChatSession<E, S, L> {
    session_id: CorrelationId,
    embedder: EmbeddingClient<E>,
    search: S,
    synthesizer: L,
    cache: QueryCache<ChatAnswer>,
    max_search_size: usize,
}

impl<E, S, L> ChatSession<E, S, L>
where
    E: EmbeddingProvider,
    S: SearchBackend,
    L: SynthesisProvider,
{
    pub fn new(
        session_id: CorrelationId,
        embedder: EmbeddingClient<E>,
        search: S,
        synthesizer: L,
        cache: QueryCache<ChatAnswer>,
        max_search_size: usize,
    ) -> Self {
        Self {
            session_id,
            embedder,
            search,
            synthesizer,
            cache,
            max_search_size: max_search_size.max(1),
        }
    }

    pub fn session_id(&self) -> &CorrelationId {
        &self.session_id
    }

    pub fn usage(&self) -> UsageSummary {
        self.embedder.tracker().snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Final usage summary, logged once when the session ends
    pub fn finish(&self) -> UsageSummary {
        let _guard = logging::session_span(&self.session_id).entered();
        self.embedder.tracker().finalize()
    }

    /// Answer `question` from the `k` most similar log records
    pub async fn ask(&mut self, question: &str, k: usize) -> ChatOutcome {
        let span = logging::session_span(&self.session_id);
        self.ask_inner(question, k).instrument(span).await
    }

    async fn ask_inner(&mut self, question: &str, k: usize) -> ChatOutcome {
        if question.trim().is_empty() {
            warn!("Empty question provided");
            return ChatOutcome::EmptyQuestion;
        }

        let k = k.clamp(1, self.max_search_size);
        let tracker = self.embedder.tracker_mut();
        if !tracker.check_rate_limit() {
            return ChatOutcome::RateLimited;
        }
        tracker.track_query(question.chars().count());

        if let Some(answer) = self.cache.get(question, k) {
            return ChatOutcome::Answered {
                answer,
                cached: true,
            };
        }

        info!(question_length = question.chars().count(), k, "Processing question");

        let session_id = self.session_id.clone();
        let Some(vector) = self.embedder.embed(question, &session_id).await.into_vector() else {
            error!("Could not embed question");
            return ChatOutcome::EmbeddingFailed;
        };

        let logs = match self.search.knn(&vector, k).await {
            Ok(logs) => logs,
            Err(e) => {
                error!(
                    error_category = %e.category(),
                    error = %e,
                    "Error searching logs"
                );
                return ChatOutcome::SearchFailed(e.to_string());
            }
        };

        if logs.is_empty() {
            warn!(k, "No relevant logs found");
            return ChatOutcome::NoRelevantLogs;
        }

        info!(log_count = logs.len(), "Synthesizing answer");
        let prompt = grounding_prompt(question, &logs);

        let response = match self.synthesizer.synthesize(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    error_category = %e.category(),
                    error_code = e.code(),
                    error = %e,
                    model_id = self.synthesizer.model(),
                    "Error getting LLM response"
                );
                return ChatOutcome::SynthesisFailed(e.to_string());
            }
        };

        self.embedder
            .tracker_mut()
            .track_llm(response.usage.input_tokens, response.usage.output_tokens);

        let answer = ChatAnswer {
            answer: response.text,
            logs,
        };
        self.cache.put(question, k, answer.clone());

        ChatOutcome::Answered {
            answer,
            cached: false,
        }
    }
}
