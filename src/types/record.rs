//! Log Records and Invocation Payloads
//!
//! Log records are open maps: the pipeline only reads a handful of known
//! fields and must carry everything else through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single log record as supplied by the ingestion pipeline
pub type LogRecord = Map<String, Value>;

/// Field holding the embedding vector
pub const FIELD_EMBEDDING: &str = "log_embedding";
/// Field holding the model identifier that produced the vector
pub const FIELD_EMBEDDING_MODEL: &str = "embedding_model";
/// Field holding the integer epoch seconds of annotation
pub const FIELD_EMBEDDING_TIMESTAMP: &str = "embedding_timestamp";

/// Fields concatenated (in this order) into the text that gets embedded
pub const EMBEDDED_FIELDS: [&str; 4] = ["service", "user_id", "level", "message"];

/// Batch invocation payload: `{"events": [...]}`
///
/// Events are kept as raw JSON values so that malformed entries can be passed
/// back unchanged instead of failing the whole invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchPayload {
    #[serde(default)]
    pub events: Vec<Value>,
}

impl BatchPayload {
    pub fn new(events: Vec<Value>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Render one field for the composite text. Missing and null become empty.
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Build the composite text `"{service} {user_id} {level} {message}"`, trimmed.
pub fn embedding_text(record: &LogRecord) -> String {
    EMBEDDED_FIELDS
        .iter()
        .map(|field| field_text(record.get(*field)))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Attach the embedding annotation fields to a record
pub fn annotate(record: &mut LogRecord, vector: Vec<f64>, model: &str, timestamp: i64) {
    record.insert(
        FIELD_EMBEDDING.to_string(),
        Value::Array(vector.into_iter().map(Value::from).collect()),
    );
    record.insert(
        FIELD_EMBEDDING_MODEL.to_string(),
        Value::String(model.to_string()),
    );
    record.insert(
        FIELD_EMBEDDING_TIMESTAMP.to_string(),
        Value::from(timestamp),
    );
}

/// Whether a record carries an embedding annotation
pub fn is_annotated(record: &Value) -> bool {
    record.get(FIELD_EMBEDDING).is_some()
}
