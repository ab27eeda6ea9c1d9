//! Error types for autocov.

use thiserror::Error;

/// Result type alias using [`CoverageError`].
pub type Result<T> = std::result::Result<T, CoverageError>;

/// Every failure the dashboard can produce.
#[derive(Error, Debug)]
pub enum CoverageError {
    /// Malformed inbound request. Raised before any upstream call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network failure or non-success status from the test-management service.
    #[error("Upstream error during {operation} ({target}): {message}")]
    Upstream {
        operation: &'static str,
        target: String,
        message: String,
    },

    /// Upstream payload had no recoverable array.
    #[error("Unexpected payload shape from {operation}: {message}")]
    Shape {
        operation: &'static str,
        message: String,
    },

    /// A parent-pointer walk revisited a section.
    #[error("Section hierarchy contains a cycle through section {section_id}")]
    Cycle { section_id: i64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CoverageError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn upstream(
        operation: &'static str,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            operation,
            target: target.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the caller rather than by the server or upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_display_includes_operation_and_target() {
        let err = CoverageError::upstream("get_cases", "section 42", "HTTP 503");
        let text = err.to_string();
        assert!(text.contains("get_cases"));
        assert!(text.contains("section 42"));
        assert!(text.contains("HTTP 503"));
    }

    #[test]
    fn only_validation_is_client_error() {
        assert!(CoverageError::validation("bad").is_client_error());
        assert!(!CoverageError::Cycle { section_id: 1 }.is_client_error());
        assert!(!CoverageError::config("x").is_client_error());
    }
}
