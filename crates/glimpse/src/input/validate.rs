//! Cheap checks before a file is decoded.

use std::io::Read;
use std::path::Path;

use glimpse_core::config::LimitsConfig;

use super::InputError;

/// Leading bytes of the formats the decoder handles, with their offset.
const SIGNATURES: &[(&str, usize, &[u8])] = &[
    ("jpeg", 0, &[0xFF, 0xD8, 0xFF]),
    ("png", 0, &[0x89, b'P', b'N', b'G']),
    ("gif", 0, b"GIF8"),
    ("webp", 8, b"WEBP"),
    ("bmp", 0, b"BM"),
    ("tiff", 0, &[b'I', b'I', 0x2A, 0x00]),
    ("tiff", 0, &[b'M', b'M', 0x00, 0x2A]),
];

/// Name of the format whose signature `header` starts with.
pub fn sniff_format(header: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(_, offset, magic)| {
            header
                .get(*offset..*offset + magic.len())
                .is_some_and(|bytes| bytes == *magic)
        })
        .map(|(name, _, _)| *name)
}

/// Validates files before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check existence, size limit and magic bytes.
    pub fn validate(&self, path: &Path) -> Result<(), InputError> {
        if !path.exists() {
            return Err(InputError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.check_size(path, metadata.len())?;

        let mut header = [0u8; 12];
        let read = std::fs::File::open(path)
            .and_then(|mut file| file.read(&mut header))
            .map_err(|source| InputError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        if sniff_format(&header[..read]).is_none() {
            return Err(InputError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Reject files above `max_file_size_mb`.
    pub fn check_size(&self, path: &Path, size: u64) -> Result<(), InputError> {
        if size > self.limits.max_file_size_bytes() {
            return Err(InputError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: size / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }
}
