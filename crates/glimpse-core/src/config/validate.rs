//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::hash::{MAX_HASH_SIZE, MAX_THUMB_SIZE};

use super::Config;

const OUTPUT_FORMATS: [&str; 2] = ["json", "jsonl"];
const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.hash.thumb_size > MAX_THUMB_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "hash.thumb_size must be <= {}",
                MAX_THUMB_SIZE
            )));
        }
        if self.hash.hash_size > MAX_HASH_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "hash.hash_size must be <= {}",
                MAX_HASH_SIZE
            )));
        }
        if self.hash.bits_per_coefficient().is_err() {
            let params = self.hash.resolved();
            return Err(ConfigError::ValidationError(format!(
                "hash.hash_size of {} bytes is too small for hash.thumb_size {} (needs at least {})",
                params.hash_size,
                params.thumb_size,
                (u64::from(params.thumb_size) * u64::from(params.thumb_size)).div_ceil(8)
            )));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if !OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be one of {:?}",
                OUTPUT_FORMATS
            )));
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be one of {:?}",
                LOG_FORMATS
            )));
        }
        Ok(())
    }
}
