pub mod error;
pub mod record;

pub use error::{ConfigViolations, ErrorCategory, LogragError, Result};
pub use record::{BatchPayload, LogRecord};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Opaque token attached to every log line of one invocation or session
///
/// Batch invocations use the runtime's request id; chat sessions generate a
/// short random id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh 8-character session id
    pub fn session() -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self(id[..8].to_string())
    }

    /// Id used when the runtime did not supply one
    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod newtype_tests {
    use super::*;

    #[test]
    fn test_session_id_is_short_hex() {
        let id = CorrelationId::session();
        assert_eq!(id.as_str().len(), 8);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_correlation_id_display() {
        let id = CorrelationId::new("req-123");
        assert_eq!(id.as_str(), "req-123");
        assert_eq!(format!("{}", id), "req-123");
        assert_eq!(CorrelationId::unknown().as_str(), "unknown");
    }
}
