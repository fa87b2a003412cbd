//! Batch Embedding Orchestrator
//!
//! Enriches every record of an invocation with an embedding of its composite
//! text (`service user_id level message`). Records are processed in fixed-size
//! chunks, strictly sequentially, and always emitted in input order: failed
//! records come back unannotated, never dropped.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, debug, error, info};

use crate::ai::{EmbeddingClient, EmbeddingProvider};
use crate::logging;
use crate::types::CorrelationId;
use crate::types::record::{self, BatchPayload};

/// Totals for one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage of records annotated, rounded to 2 decimals (0 when empty)
    pub success_rate: f64,
}

impl BatchReport {
    fn new(total: usize, successful: usize, failed: usize) -> Self {
        let success_rate = if total == 0 {
            0.0
        } else {
            (successful as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        };
        Self {
            total,
            successful,
            failed,
            success_rate,
        }
    }
}

/// Chunk length for `total` records: `batch_size` clamped to `[1, total]`
pub fn effective_batch_size(batch_size: usize, total: usize) -> usize {
    batch_size.min(total).max(1)
}

fn message_length(record: &record::LogRecord) -> usize {
    match record.get("message") {
        Some(Value::String(message)) => message.chars().count(),
        _ => 0,
    }
}

/// Batch orchestrator owning the invocation's embedding client
pub struct BatchOrchestrator<P> {
    client: EmbeddingClient<P>,
    batch_size: usize,
    /// Configuration view logged at start when detailed logging is on
    debug_config: Option<Value>,
}

impl<P: EmbeddingProvider> BatchOrchestrator<P> {
    pub fn new(client: EmbeddingClient<P>, batch_size: usize) -> Self {
        Self {
            client,
            batch_size,
            debug_config: None,
        }
    }

    pub fn with_debug_config(mut self, config: Value) -> Self {
        self.debug_config = Some(config);
        self
    }

    pub fn client(&self) -> &EmbeddingClient<P> {
        &self.client
    }

    /// Run one invocation payload (`{"events": [...]}`) under its request id
    pub async fn handle(
        &mut self,
        payload: BatchPayload,
        request_id: &CorrelationId,
    ) -> (BatchPayload, BatchReport) {
        let span = logging::invocation_span(request_id);

        async {
            let config = self.debug_config.as_ref().map(ToString::to_string);
            info!(
                record_count = payload.len(),
                config = config.as_deref(),
                "Execution started"
            );

            let (events, report) = self.process(payload.events, request_id).await;
            (BatchPayload::new(events), report)
        }
        .instrument(span)
        .await
    }

    /// Enrich `records`, preserving count and order
    pub async fn process(
        &mut self,
        records: Vec<Value>,
        correlation_id: &CorrelationId,
    ) -> (Vec<Value>, BatchReport) {
        let total = records.len();
        let chunk_size = effective_batch_size(self.batch_size, total);

        let mut processed = Vec::with_capacity(total);
        let mut successful = 0;
        let mut failed = 0;

        let mut remaining = records.into_iter();
        let mut batch_start = 0;
        loop {
            let batch: Vec<Value> = remaining.by_ref().take(chunk_size).collect();
            if batch.is_empty() {
                break;
            }
            debug!(batch_start, batch_len = batch.len(), "Processing batch");

            for (offset, record) in batch.into_iter().enumerate() {
                let record_index = batch_start + offset;

                let Value::Object(mut fields) = record else {
                    failed += 1;
                    error!(
                        record_index,
                        error_type = "InvalidRecord",
                        error = "record is not a JSON object",
                        "Error processing record"
                    );
                    processed.push(record);
                    continue;
                };

                let text = record::embedding_text(&fields);
                match self.client.embed(&text, correlation_id).await.into_vector() {
                    Some(vector) => {
                        let model = self.client.model_id().to_string();
                        record::annotate(&mut fields, vector, &model, Utc::now().timestamp());
                        successful += 1;
                    }
                    None => {
                        failed += 1;
                        debug!(
                            record_index,
                            message_length = message_length(&fields),
                            "Failed to generate embedding for record"
                        );
                    }
                }
                processed.push(Value::Object(fields));
            }

            batch_start += chunk_size;
        }

        self.client.tracker().finalize();

        let report = BatchReport::new(total, successful, failed);
        info!(
            total_records = report.total,
            successful_embeddings = report.successful,
            failed_embeddings = report.failed,
            success_rate = report.success_rate,
            "Execution completed"
        );

        (processed, report)
    }
}
