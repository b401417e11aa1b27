//! Hamming-distance comparison of image hashes.

use crate::bitstream::BitStream;
use crate::buffer::PixelBuffer;
use crate::error::{PipelineError, PipelineResult};
use crate::hash::{hash_image, hash_image_64};

/// Bits in a default-sized hash (16×16 coefficients, one bit each).
const DEFAULT_HASH_BITS: usize = 256;

/// Number of differing bits between two 64-bit hashes.
pub fn hamming_distance_64(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Fraction of `bits` positions that agree, given `distance` disagreements.
pub fn similarity(distance: u32, bits: u32) -> f32 {
    if bits == 0 {
        return 0.0;
    }
    bits.saturating_sub(distance) as f32 / bits as f32
}

/// Compare two images by their 64-bit hashes.
///
/// The distance is normalized over 256 positions, like [`compare_images`],
/// so the result never drops below 0.75.
pub fn compare_images_64(a: &PixelBuffer, b: &PixelBuffer) -> PipelineResult<f32> {
    let hash_a = hash_image_64(a).map_err(|e| e.during("hash"))?;
    let hash_b = hash_image_64(b).map_err(|e| e.during("hash"))?;
    let distance = hamming_distance_64(hash_a, hash_b);

    tracing::debug!(
        "64-bit hashes {:016x} / {:016x}: {} bits differ",
        hash_a,
        hash_b,
        distance
    );
    Ok(similarity(distance, DEFAULT_HASH_BITS as u32))
}

/// Compare two images by their default 256-bit hashes.
pub fn compare_images(a: &PixelBuffer, b: &PixelBuffer) -> PipelineResult<f32> {
    let mut stream_a = BitStream::with_capacity(DEFAULT_HASH_BITS)?;
    let mut stream_b = BitStream::with_capacity(DEFAULT_HASH_BITS)?;

    hash_image(a, 0, 0, &mut stream_a).map_err(|e| e.during("hash"))?;
    hash_image(b, 0, 0, &mut stream_b).map_err(|e| e.during("hash"))?;

    if stream_a.occupancy() != stream_b.occupancy() {
        return Err(PipelineError::InvalidResource(format!(
            "hash lengths differ ({} vs {} bits)",
            stream_a.occupancy(),
            stream_b.occupancy()
        ))
        .during("compare"));
    }

    let mut matches = 0u32;
    while !stream_a.is_empty() && !stream_b.is_empty() {
        if stream_a.read_bit()? == stream_b.read_bit()? {
            matches += 1;
        }
    }

    tracing::debug!("{} of {} hash bits match", matches, DEFAULT_HASH_BITS);
    Ok(matches as f32 / DEFAULT_HASH_BITS as f32)
}
