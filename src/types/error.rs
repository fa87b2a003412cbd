//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Categories
//!
//! - **Service**: The managed service answered with a recognized error code
//! - **Transport**: The request never completed (timeout, dispatch, connection)
//! - **Response**: The service answered but the body could not be understood
//! - **Unexpected**: Anything else
//!
//! ## Propagation
//!
//! Only configuration errors are meant to stop the process. Every other
//! variant is caught at the embedding/search/synthesis boundary, logged with
//! its category, and degraded to an absent result.

use std::fmt;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Classification attached to every failed external call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Service-level error with a recognized code (throttling, validation, access)
    Service,
    /// Lower-level transport failure (timeout, DNS, connection reset)
    Transport,
    /// Malformed or unexpected response body
    Response,
    /// Anything not covered above
    Unexpected,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "SERVICE"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Response => write!(f, "RESPONSE"),
            Self::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Every invariant violated by a resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolations(Vec<String>);

impl ConfigViolations {
    pub fn new(violations: Vec<String>) -> Self {
        Self(violations)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|v| v.contains(needle))
    }
}

impl fmt::Display for ConfigViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum LogragError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Startup Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Configuration validation failed: {0}")]
    InvalidConfig(ConfigViolations),

    // -------------------------------------------------------------------------
    // External Service Errors
    // -------------------------------------------------------------------------
    /// Recognized service-level error (e.g. `ThrottlingException`)
    #[error("Service error [{code}]: {message}")]
    Service { code: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Response(String),

    #[error("Search error: {0}")]
    Search(String),
}

pub type Result<T> = std::result::Result<T, LogragError>;

impl LogragError {
    /// Create a service error from its code and message
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Category used when this error is logged at an invocation boundary
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Service { .. } => ErrorCategory::Service,
            Self::Transport(_) | Self::Io(_) => ErrorCategory::Transport,
            Self::Response(_) | Self::Json(_) => ErrorCategory::Response,
            Self::Search(_) | Self::Config(_) | Self::InvalidConfig(_) => {
                ErrorCategory::Unexpected
            }
        }
    }

    /// Service error code, when the service supplied one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Short variant name for structured `error_type` fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
            Self::Config(_) => "Config",
            Self::InvalidConfig(_) => "InvalidConfig",
            Self::Service { .. } => "Service",
            Self::Transport(_) => "Transport",
            Self::Response(_) => "Response",
            Self::Search(_) => "Search",
        }
    }

    /// True for errors that are fatal at startup
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidConfig(_))
    }
}

impl From<ConfigViolations> for LogragError {
    fn from(violations: ConfigViolations) -> Self {
        Self::InvalidConfig(violations)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Service.to_string(), "SERVICE");
        assert_eq!(ErrorCategory::Transport.to_string(), "TRANSPORT");
        assert_eq!(ErrorCategory::Unexpected.to_string(), "UNEXPECTED");
    }

    #[test]
    fn test_service_error_classification() {
        let err = LogragError::service("ThrottlingException", "slow down");
        assert_eq!(err.category(), ErrorCategory::Service);
        assert_eq!(err.code(), Some("ThrottlingException"));
        assert!(err.to_string().contains("ThrottlingException"));
        assert!(!err.is_config());
    }

    #[test]
    fn test_transport_and_response_classification() {
        assert_eq!(
            LogragError::Transport("timed out".into()).category(),
            ErrorCategory::Transport
        );
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            LogragError::from(json_err).category(),
            ErrorCategory::Response
        );
    }

    #[test]
    fn test_config_violations_listed() {
        let err: LogragError = ConfigViolations::new(vec![
            "BATCH_SIZE must be positive".into(),
            "BEDROCK_TIMEOUT must be positive".into(),
        ])
        .into();
        assert!(err.is_config());
        let message = err.to_string();
        assert!(message.contains("BATCH_SIZE"));
        assert!(message.contains("BEDROCK_TIMEOUT"));
    }
}
