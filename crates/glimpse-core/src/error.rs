//! Error types for the Glimpse fingerprinting pipeline.
//!
//! Buffer, bit stream and pipeline operations share one taxonomy
//! ([`ErrorKind`]). A stage that fails because a stage it called failed wraps
//! the cause in [`PipelineError::ExecutionFailure`], so the original error is
//! still reachable through [`std::error::Error::source`].

use thiserror::Error;

/// Top-level error type for Glimpse operations.
#[derive(Error, Debug)]
pub enum GlimpseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Buffer, stream or hashing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad caller-supplied parameters.
    InvalidArgument,
    /// An allocation could not be satisfied.
    OutOfMemory,
    /// Operation on an empty resource, or mutually incompatible parameters.
    InvalidResource,
    /// A stream read or write exceeds the available capacity or data.
    CapacityLimit,
    /// A called sub-operation failed.
    ExecutionFailure,
}

/// Errors raised by pixel buffers, bit streams and the hashing pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Caller-supplied parameters were rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failed
    #[error("Out of memory: could not allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },

    /// Resource is empty or parameters are mutually incompatible
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// Stream capacity or data exhausted
    #[error("Capacity limit: {0}")]
    CapacityLimit(String),

    /// A sub-operation failed
    #[error("{stage} failed")]
    ExecutionFailure {
        stage: &'static str,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// The taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::InvalidResource(_) => ErrorKind::InvalidResource,
            Self::CapacityLimit(_) => ErrorKind::CapacityLimit,
            Self::ExecutionFailure { .. } => ErrorKind::ExecutionFailure,
        }
    }

    /// Wrap `self` as the cause of a failed `stage`.
    pub fn during(self, stage: &'static str) -> Self {
        Self::ExecutionFailure {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error, following `ExecutionFailure` wrappers.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            Self::ExecutionFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Convenience type alias for Glimpse results.
pub type Result<T> = std::result::Result<T, GlimpseError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_wrapped_error() {
        let err = PipelineError::InvalidArgument("width is zero".into()).during("resize");
        assert_eq!(err.kind(), ErrorKind::ExecutionFailure);
        assert_eq!(err.root_cause().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;

        let err = PipelineError::CapacityLimit("stream full".into()).during("hash");
        let source = err.source().expect("wrapped error has a source");
        assert!(source.to_string().contains("stream full"));
        assert_eq!(err.to_string(), "hash failed");
    }

    #[test]
    fn test_pipeline_error_converts_to_top_level() {
        let err: GlimpseError = PipelineError::OutOfMemory { bytes: 64 }.into();
        assert!(err.to_string().contains("64 bytes"));
    }
}
