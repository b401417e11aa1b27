//! Glimpse Core - perceptual image fingerprinting.
//!
//! Glimpse turns a decoded image into a short bit string such that images
//! that look alike (after resizing, recompression or mild colour changes)
//! produce hashes a small Hamming distance apart.
//!
//! # Architecture
//!
//! ```text
//! R8G8B8 buffer → Desaturate → Resize (4t × 4t) → DCT → Quantize → BitStream
//! ```
//!
//! The library performs no file I/O: callers hand it pixels in a
//! [`PixelBuffer`] and read results out of a [`BitStream`] or [`ImageHash`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use glimpse_core::{compare_images, Hasher, PixelBuffer, PixelFormat};
//!
//! let image = PixelBuffer::from_raw(PixelFormat::R8G8B8, width, height, rgb_bytes)?;
//! let hash = Hasher::default().hash(&image)?;
//! println!("{}", hash.to_hex());
//!
//! let similarity = compare_images(&image, &other)?;
//! ```

// Module declarations
pub mod bitstream;
pub mod buffer;
pub mod compare;
pub mod config;
pub mod error;
pub mod format;
pub mod hash;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use bitstream::BitStream;
pub use buffer::PixelBuffer;
pub use compare::{compare_images, compare_images_64, hamming_distance_64, similarity};
pub use config::Config;
pub use error::{ConfigError, ErrorKind, GlimpseError, PipelineError, PipelineResult, Result};
pub use format::PixelFormat;
pub use hash::{hash_image, hash_image_64, HashParams, Hasher, ImageHash};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{desaturate, resize, transform};
pub use types::{ComparisonMethod, ComparisonRecord, HashRecord, HashStats, Verdict};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
