//! Bedrock Runtime Provider
//!
//! Invokes Titan text embeddings (`{"inputText"}` → `{"embedding"}`) and
//! Anthropic messages models through `InvokeModel`. Request and response
//! bodies are plain JSON; building and parsing them is kept separate from the
//! network call so both can be tested offline.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, retry::RetryConfig, timeout::TimeoutConfig};
use aws_sdk_bedrockruntime::{
    Client,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::invoke_model::InvokeModelError,
    primitives::Blob,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Instant;
use tracing::debug;

use super::{EmbeddingProvider, SynthesisProvider, SynthesisResponse, TokenUsage};
use crate::config::RuntimeSettings;
use crate::constants::synthesis::{ANTHROPIC_VERSION, MAX_ANSWER_TOKENS};
use crate::types::{LogragError, Result};

const CONTENT_TYPE: &str = "application/json";

/// Bedrock Runtime client bound to one model id
///
/// Cloning is cheap; the underlying SDK client is shared.
#[derive(Debug, Clone)]
pub struct BedrockProvider {
    client: Client,
    model_id: String,
}

impl BedrockProvider {
    /// Build a client for the configured region with the read timeout and
    /// retry ceiling applied.
    pub async fn connect(settings: &RuntimeSettings, model_id: impl Into<String>) -> Self {
        let retry = if settings.max_retries == 0 {
            RetryConfig::disabled()
        } else {
            // Retries are counted in addition to the first attempt
            RetryConfig::standard().with_max_attempts(settings.max_retries.saturating_add(1))
        };

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .retry_config(retry)
            .timeout_config(
                TimeoutConfig::builder()
                    .read_timeout(settings.read_timeout)
                    .build(),
            )
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
            model_id: model_id.into(),
        }
    }

    /// Same client, different model
    pub fn with_model(&self, model_id: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke(&self, body: &Value) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(body)?;
        let start = Instant::now();

        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type(CONTENT_TYPE)
            .accept(CONTENT_TYPE)
            .body(Blob::new(payload))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        debug!(
            model_id = %self.model_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "InvokeModel completed"
        );

        Ok(output.body.into_inner())
    }
}

// =============================================================================
// Error Classification
// =============================================================================

/// Service errors keep their code; everything that never produced a service
/// answer is a transport failure.
fn classify_sdk_error<R>(err: SdkError<InvokeModelError, R>) -> LogragError
where
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.err();
            LogragError::service(
                service_err.code().unwrap_or("Unknown"),
                service_err.message().unwrap_or_default(),
            )
        }
        _ => LogragError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

// =============================================================================
// Wire Formats
// =============================================================================

/// Titan text embedding request body
pub(crate) fn embedding_request(text: &str) -> Value {
    json!({ "inputText": text })
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponseBody {
    embedding: Option<Vec<f64>>,
}

pub(crate) fn parse_embedding(body: &[u8]) -> Result<Vec<f64>> {
    let parsed: EmbeddingResponseBody = serde_json::from_slice(body)?;
    match parsed.embedding {
        Some(vector) if !vector.is_empty() => Ok(vector),
        _ => Err(LogragError::Response("response has no embedding".to_string())),
    }
}

/// Anthropic messages request body with a single user turn
pub(crate) fn synthesis_request(prompt: &str) -> Value {
    json!({
        "anthropic_version": ANTHROPIC_VERSION,
        "max_tokens": MAX_ANSWER_TOKENS,
        "messages": [{
            "role": "user",
            "content": [{ "type": "text", "text": prompt }],
        }],
    })
}

#[derive(Debug, Deserialize)]
struct MessagesResponseBody {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

pub(crate) fn parse_synthesis(body: &[u8]) -> Result<SynthesisResponse> {
    let parsed: MessagesResponseBody = serde_json::from_slice(body)?;

    let text = parsed
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| LogragError::Response("response has no text content".to_string()))?;

    let usage = parsed
        .usage
        .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
        .unwrap_or_default();

    Ok(SynthesisResponse { text, usage })
}

// =============================================================================
// Trait Implementations
// =============================================================================

#[async_trait]
impl EmbeddingProvider for BedrockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let body = self.invoke(&embedding_request(text)).await?;
        parse_embedding(&body)
    }

    fn model(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl SynthesisProvider for BedrockProvider {
    async fn synthesize(&self, prompt: &str) -> Result<SynthesisResponse> {
        let body = self.invoke(&synthesis_request(prompt)).await?;
        parse_synthesis(&body)
    }

    fn model(&self) -> &str {
        &self.model_id
    }
}
