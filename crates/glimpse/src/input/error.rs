//! Errors raised while turning image files into pixel buffers.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File could not be read
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the configured size limit
    #[error("File too large: {path} ({size_mb}MB, max: {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Header does not look like any supported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Decoding did not finish in time
    #[error("Timeout decoding {path} after {timeout_ms}ms")]
    Timeout { path: PathBuf, timeout_ms: u64 },

    /// Decoded image exceeds the configured dimension limit
    #[error("Image too large: {path} ({width}x{height}, max: {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Decoded pixels could not be wrapped in a pixel buffer
    #[error("Cannot prepare pixels of {path}: {source}")]
    Pixels {
        path: PathBuf,
        #[source]
        source: glimpse_core::PipelineError,
    },
}
