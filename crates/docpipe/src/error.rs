//! Error types for docpipe.
//!
//! All errors use [`DocpipeError`], which preserves error chains via
//! `#[source]` attributes and carries enough context to classify how the
//! pipeline reacts:
//!
//! - `Config` aborts the run before any document is touched
//! - `UnsupportedFormat` skips the document with a warning
//! - `Auth`, `RateLimited`, and `Transient` mark the document failed while
//!   the batch continues
//! - `Parse` triggers the per-document fallback to raw extraction fields
//! - `Io` always bubbles up unchanged

use thiserror::Error;

/// Result type alias using `DocpipeError`.
pub type Result<T> = std::result::Result<T, DocpipeError>;

/// Main error type for all docpipe operations.
#[derive(Debug, Error)]
pub enum DocpipeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Transient error: {message}")]
    Transient {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

impl DocpipeError {
    /// Create a Config error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a Transient error.
    pub fn transient<S: Into<String>>(message: S) -> Self {
        Self::Transient {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Transient error with source.
    pub fn transient_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transient {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Parse error.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Parse error with source.
    pub fn parse_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Serialization error.
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the error should be retried within a single API call.
    ///
    /// Only transient failures (network errors, 5xx responses) qualify.
    /// Auth and rate-limit rejections are returned to the caller unchanged
    /// so the document can be marked failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

impl From<serde_json::Error> for DocpipeError {
    fn from(err: serde_json::Error) -> Self {
        DocpipeError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<csv::Error> for DocpipeError {
    fn from(err: csv::Error) -> Self {
        DocpipeError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for DocpipeError {
    fn from(err: reqwest::Error) -> Self {
        DocpipeError::Transient {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DocpipeError = io_err.into();
        assert!(matches!(err, DocpipeError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_config_error() {
        let err = DocpipeError::config("missing VISION_AGENT_API_KEY");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing VISION_AGENT_API_KEY"
        );
    }

    #[test]
    fn test_transient_error_with_source() {
        let source = std::io::Error::other("connection reset");
        let err = DocpipeError::transient_with_source("request failed", source);
        assert_eq!(err.to_string(), "Transient error: request failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_parse_error() {
        let err = DocpipeError::parse("reply is not a JSON array");
        assert_eq!(err.to_string(), "Parse error: reply is not a JSON array");
    }

    #[test]
    fn test_unsupported_format_error() {
        let err = DocpipeError::UnsupportedFormat("zip".to_string());
        assert_eq!(err.to_string(), "Unsupported format: zip");
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: DocpipeError = json_err.into();
        assert!(matches!(err, DocpipeError::Serialization { .. }));
    }

    #[test]
    fn test_is_retryable() {
        assert!(DocpipeError::transient("timeout").is_retryable());
        assert!(!DocpipeError::Auth("bad key".to_string()).is_retryable());
        assert!(!DocpipeError::RateLimited("slow down".to_string()).is_retryable());
        assert!(!DocpipeError::parse("bad reply").is_retryable());
    }

    #[test]
    fn test_io_error_bubbles_unchanged() {
        fn read_file() -> Result<String> {
            let content = std::fs::read_to_string("/nonexistent/file.txt")?;
            Ok(content)
        }

        let result = read_file();
        assert!(matches!(result.unwrap_err(), DocpipeError::Io(_)));
    }
}
