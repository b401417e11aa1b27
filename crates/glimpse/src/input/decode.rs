//! Loading image files into RGB pixel buffers, with limits and a timeout.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use glimpse_core::config::LimitsConfig;
use glimpse_core::{PixelBuffer, PixelFormat};

use super::{InputError, Validator};

/// Decodes files into [`PixelBuffer`]s ready for hashing.
pub struct ImageLoader {
    limits: LimitsConfig,
    validator: Validator,
}

/// A decoded image in `R8G8B8` layout.
#[derive(Debug)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub pixels: PixelBuffer,
}

impl LoadedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

impl ImageLoader {
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            limits,
        }
    }

    /// Validate, read and decode `path`.
    pub async fn load(&self, path: &Path) -> Result<LoadedImage, InputError> {
        self.validator.validate(path)?;

        let bytes = tokio::fs::read(path).await.map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode_from_bytes(bytes, path).await
    }

    /// Decode an in-memory file under the decode timeout.
    pub async fn decode_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
    ) -> Result<LoadedImage, InputError> {
        self.validator.check_size(path, bytes.len() as u64)?;

        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);
        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || decode_bytes_sync(bytes, &path_owned)).await
        })
        .await;

        let (image, format) = match decode_result {
            Ok(Ok(Ok(decoded))) => decoded,
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Err(e)) => {
                return Err(InputError::Decode {
                    path: path.to_path_buf(),
                    message: format!("Task join error: {}", e),
                })
            }
            Err(_) => {
                return Err(InputError::Timeout {
                    path: path.to_path_buf(),
                    timeout_ms: self.limits.decode_timeout_ms,
                })
            }
        };

        let (width, height) = image.dimensions();
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(InputError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        tracing::debug!("Decoded {:?} ({:?}, {}x{})", path, format, width, height);

        let rgb = image.into_rgb8();
        let pixels = PixelBuffer::from_raw(PixelFormat::R8G8B8, width, height, rgb.into_raw())
            .map_err(|source| InputError::Pixels {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(LoadedImage {
            path: path.to_path_buf(),
            format,
            pixels,
        })
    }
}

/// Synchronous decode (runs in spawn_blocking).
fn decode_bytes_sync(
    bytes: Vec<u8>,
    path: &Path,
) -> Result<(DynamicImage, ImageFormat), InputError> {
    use std::io::Cursor;

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| InputError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;

    let format = match reader.format() {
        Some(f) => f,
        None => ImageFormat::from_path(path).map_err(|_| InputError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })?,
    };

    let image = reader.decode().map_err(|e| InputError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok((image, format))
}
