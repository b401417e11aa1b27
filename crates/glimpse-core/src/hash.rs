//! Perceptual hashing: desaturate, shrink, transform, quantize.
//!
//! The low-frequency corner of the DCT of a thumbnail is compared against
//! its mean AC value and quantized to a fixed number of bits per
//! coefficient. Images that look alike end up with hashes a small Hamming
//! distance apart.
//!
//! # Layout
//!
//! For a thumbnail size `t` the source is shrunk to `4t × 4t` and the top-left
//! `t × t` coefficients are packed row-major, `bits_per_coefficient` bits each,
//! least significant bit first. With the defaults (`t = 16`, 32 bytes) that is
//! one bit per coefficient: set when the coefficient is at or above the mean.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::bitstream::BitStream;
use crate::buffer::PixelBuffer;
use crate::error::{PipelineError, PipelineResult};
use crate::format::PixelFormat;
use crate::math::log2_floor;
use crate::pipeline::{desaturate, resize, transform};

/// Thumbnail size used when zero is requested.
pub const DEFAULT_THUMB_SIZE: u32 = 16;

/// Hash size in bytes used when zero is requested.
pub const DEFAULT_HASH_SIZE: u32 = 32;

/// Largest accepted thumbnail size.
pub const MAX_THUMB_SIZE: u32 = 2900;

/// Largest accepted hash size in bytes (2 GiB).
pub const MAX_HASH_SIZE: u32 = 2 << 30;

/// Smallest accepted source width and height.
pub const MIN_IMAGE_DIMENSION: u32 = 32;

/// Coefficients are never packed wider than this.
const MAX_BITS_PER_COEFFICIENT: u32 = 32;

/// Thumbnail and hash sizes for one hashing run.
///
/// Zero means "use the default" for either field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashParams {
    /// Side of the square block of coefficients that is kept.
    pub thumb_size: u32,

    /// Requested hash size in bytes.
    pub hash_size: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            thumb_size: DEFAULT_THUMB_SIZE,
            hash_size: DEFAULT_HASH_SIZE,
        }
    }
}

impl HashParams {
    pub fn new(thumb_size: u32, hash_size: u32) -> Self {
        Self {
            thumb_size,
            hash_size,
        }
    }

    /// Replace zero fields with their defaults.
    pub fn resolved(self) -> Self {
        Self {
            thumb_size: if self.thumb_size == 0 {
                DEFAULT_THUMB_SIZE
            } else {
                self.thumb_size
            },
            hash_size: if self.hash_size == 0 {
                DEFAULT_HASH_SIZE
            } else {
                self.hash_size
            },
        }
    }

    /// Check the raw sizes against their upper bounds.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.thumb_size > MAX_THUMB_SIZE {
            return Err(PipelineError::InvalidArgument(format!(
                "thumbnail size {} exceeds the maximum of {}",
                self.thumb_size, MAX_THUMB_SIZE
            )));
        }
        if self.hash_size > MAX_HASH_SIZE {
            return Err(PipelineError::InvalidArgument(format!(
                "hash size {} exceeds the maximum of {} bytes",
                self.hash_size, MAX_HASH_SIZE
            )));
        }
        Ok(())
    }

    /// Side of the packed coefficient block.
    pub fn block_width(&self) -> u32 {
        self.resolved().thumb_size
    }

    /// Bits emitted per coefficient, clamped to 32.
    ///
    /// Fails with `InvalidResource` when the hash cannot spare even one bit per
    /// coefficient.
    pub fn bits_per_coefficient(&self) -> PipelineResult<u32> {
        let params = self.resolved();
        let block = u64::from(params.thumb_size) * u64::from(params.thumb_size);
        let bits = u64::from(params.hash_size) * 8 / block;

        if bits == 0 {
            return Err(PipelineError::InvalidResource(format!(
                "a {} byte hash is too small for a {}x{} coefficient block",
                params.hash_size, params.thumb_size, params.thumb_size
            )));
        }
        Ok(bits.min(u64::from(MAX_BITS_PER_COEFFICIENT)) as u32)
    }

    /// Total bits one hash occupies.
    pub fn hash_bits(&self) -> PipelineResult<usize> {
        let block = self.block_width() as usize;
        Ok(self.bits_per_coefficient()? as usize * block * block)
    }
}

/// Mean of the top-left `block × block` coefficients, DC excluded.
fn ac_average(coeffs: &PixelBuffer, block: u32) -> PipelineResult<i64> {
    let count = i64::from(block) * i64::from(block) - 1;
    if count == 0 {
        return Ok(0);
    }

    let mut total: i64 = 0;
    for j in 0..block {
        for i in 0..block {
            if (i, j) != (0, 0) {
                total += i64::from(coeffs.coefficient(i, j)?);
            }
        }
    }
    Ok(total / count)
}

/// Hash `src` and append the result to `out`.
///
/// `src` must be an `R8G8B8` buffer at least 32 pixels on each side. Zero
/// sizes select the defaults (16, 32 bytes). Nothing is written unless the
/// whole hash fits in the remaining capacity of `out`.
pub fn hash_image(
    src: &PixelBuffer,
    thumb_size: u32,
    hash_size: u32,
    out: &mut BitStream,
) -> PipelineResult<()> {
    let requested = HashParams::new(thumb_size, hash_size);
    requested.validate()?;

    if out.capacity() == 0 || out.is_full() {
        return Err(PipelineError::InvalidArgument(
            "output stream has no room left".into(),
        ));
    }
    if src.format() != PixelFormat::R8G8B8 {
        return Err(PipelineError::InvalidArgument(format!(
            "hashing expects an R8G8B8 buffer, got {}",
            src.format()
        )));
    }
    if src.width() < MIN_IMAGE_DIMENSION || src.height() < MIN_IMAGE_DIMENSION {
        return Err(PipelineError::InvalidArgument(format!(
            "image is {}x{}, hashing needs at least {}x{}",
            src.width(),
            src.height(),
            MIN_IMAGE_DIMENSION,
            MIN_IMAGE_DIMENSION
        )));
    }

    let params = requested.resolved();
    let block = params.block_width();
    let raw_bits = u64::from(params.hash_size) * 8 / (u64::from(block) * u64::from(block));
    let bits_per_coefficient = params.bits_per_coefficient()?;
    if raw_bits > u64::from(MAX_BITS_PER_COEFFICIENT) {
        tracing::warn!(
            "{} bits per coefficient requested, clamping to {}",
            raw_bits,
            MAX_BITS_PER_COEFFICIENT
        );
    }

    let needed = params.hash_bits()?;
    let available = out.capacity() - out.write_position();
    if needed > available {
        return Err(PipelineError::CapacityLimit(format!(
            "hash needs {} bits but the stream has {} left",
            needed, available
        )));
    }

    let start = Instant::now();
    let side = params.thumb_size * 4;
    tracing::debug!(
        "Hashing {}x{} image (thumb {}, {} bytes, {} bits/coefficient)",
        src.width(),
        src.height(),
        params.thumb_size,
        params.hash_size,
        bits_per_coefficient
    );

    let gray = desaturate(src).map_err(|e| e.during("desaturate"))?;
    tracing::trace!("  Desaturate: {:?}", start.elapsed());

    let resize_start = Instant::now();
    let small = resize(&gray, side, side).map_err(|e| e.during("resize"))?;
    drop(gray);
    tracing::trace!("  Resize to {}x{}: {:?}", side, side, resize_start.elapsed());

    let transform_start = Instant::now();
    let coeffs = transform(&small).map_err(|e| e.during("transform"))?;
    drop(small);
    tracing::trace!("  Transform: {:?}", transform_start.elapsed());

    let block = coeffs.width() / 4;
    let average = ac_average(&coeffs, block).map_err(|e| e.during("quantize"))?;

    let max_value = 255 * i64::from(coeffs.width()) * i64::from(coeffs.height());
    let twice_max = 2 * max_value;
    let mut divisor = twice_max >> (bits_per_coefficient - 1);
    if divisor == 0 {
        tracing::warn!("Quantization divisor is zero, storing coefficients unquantized");
        divisor = 1;
    }

    let range_bits = log2_floor((twice_max << 1) as u64) + 1;
    if bits_per_coefficient > range_bits {
        let suggested = ((u64::from(block) * u64::from(block) * u64::from(range_bits)) >> 3).max(1);
        tracing::warn!(
            "Hash of {} bytes exceeds what the coefficients can fill; {} bytes would do",
            params.hash_size,
            suggested
        );
    }

    for j in 0..block {
        for i in 0..block {
            let coefficient = coeffs.coefficient(i, j).map_err(|e| e.during("quantize"))?;
            let value = (i64::from(coefficient) - average + twice_max) / divisor;
            out.write_bits(&(value as u64).to_le_bytes(), bits_per_coefficient as usize)
                .map_err(|e| e.during("write"))?;
        }
    }

    tracing::debug!(
        "Hashed into {} bits (average {}, divisor {}) in {:?}",
        needed,
        average,
        divisor,
        start.elapsed()
    );
    Ok(())
}

/// 64-bit hash of `src` (thumbnail 8, 8 bytes), bits packed little-endian.
pub fn hash_image_64(src: &PixelBuffer) -> PipelineResult<u64> {
    let mut stream = BitStream::with_capacity(64)?;
    hash_image(src, 8, 8, &mut stream)?;

    let mut bytes = [0u8; 8];
    stream.read_bytes(&mut bytes, 8).map_err(|e| e.during("read"))?;
    Ok(u64::from_le_bytes(bytes))
}

/// A finished hash: packed bits plus their count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHash {
    bytes: Vec<u8>,
    bits: usize,
}

impl ImageHash {
    /// Take the written bits of `stream`.
    ///
    /// Bits of the last byte past the write cursor are cleared.
    pub fn from_stream(stream: &BitStream) -> Self {
        let bits = stream.write_position();
        let mut bytes = stream.data()[..bits.div_ceil(8)].to_vec();
        if let Some(last) = bytes.last_mut() {
            *last &= padding_mask(bits);
        }
        Self { bytes, bits }
    }

    /// Number of meaningful bits.
    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hexadecimal, two digits per byte.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a `bits`-bit hash produced by [`ImageHash::to_hex`].
    ///
    /// The digits must cover exactly `ceil(bits / 8)` bytes and leave every
    /// bit past `bits` clear.
    pub fn from_hex(digits: &str, bits: usize) -> PipelineResult<Self> {
        let bytes = hex::decode(digits).map_err(|e| {
            PipelineError::InvalidArgument(format!("invalid hex hash {:?}: {}", digits, e))
        })?;

        if bits == 0 || bytes.len() != bits.div_ceil(8) {
            return Err(PipelineError::InvalidArgument(format!(
                "{} hex digits cannot hold a {} bit hash",
                digits.len(),
                bits
            )));
        }
        if bytes.last().is_some_and(|&last| last & !padding_mask(bits) != 0) {
            return Err(PipelineError::InvalidArgument(format!(
                "hex hash has bits set past bit {}",
                bits
            )));
        }
        Ok(Self { bytes, bits })
    }

    /// Hamming distance to `other`, or `None` if the lengths differ.
    pub fn distance(&self, other: &ImageHash) -> Option<u32> {
        if self.bits != other.bits {
            return None;
        }
        Some(
            self.bytes
                .iter()
                .zip(&other.bytes)
                .map(|(a, b)| (a ^ b).count_ones())
                .sum(),
        )
    }
}

/// Mask of the meaningful bits in the last byte of a `bits`-bit hash.
fn padding_mask(bits: usize) -> u8 {
    match bits % 8 {
        0 => 0xFF,
        used => (1u8 << used) - 1,
    }
}

impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hashes images with a fixed set of parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher {
    params: HashParams,
}

impl Hasher {
    /// Resolve and check `params` once, up front.
    pub fn new(params: HashParams) -> PipelineResult<Self> {
        params.validate()?;
        let params = params.resolved();
        params.bits_per_coefficient()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> HashParams {
        self.params
    }

    /// Hash `image` into a freshly sized stream.
    pub fn hash(&self, image: &PixelBuffer) -> PipelineResult<ImageHash> {
        let mut stream = BitStream::with_capacity(self.params.hash_bits()?)?;
        hash_image(
            image,
            self.params.thumb_size,
            self.params.hash_size,
            &mut stream,
        )?;
        Ok(ImageHash::from_stream(&stream))
    }
}
