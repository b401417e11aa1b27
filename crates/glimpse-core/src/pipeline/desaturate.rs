//! RGB to luma conversion.

use crate::buffer::PixelBuffer;
use crate::error::{PipelineError, PipelineResult};
use crate::format::PixelFormat;

/// Fixed-point (Q12) luma weights for red, green and blue.
const LUMA_WEIGHTS: [u32; 3] = [1228, 2416, 450];

/// Convert one row of packed RGB pixels into luma bytes.
fn desaturate_line(src: &[u8], dest: &mut [u8]) {
    for (rgb, gray) in src.chunks_exact(3).zip(dest.iter_mut()) {
        let luma = u32::from(rgb[0]) * LUMA_WEIGHTS[0]
            + u32::from(rgb[1]) * LUMA_WEIGHTS[1]
            + u32::from(rgb[2]) * LUMA_WEIGHTS[2];
        *gray = (luma >> 12) as u8;
    }
}

/// Produce a single channel `R8` copy of an `R8G8B8` buffer.
///
/// Integer only: `gray = (R*1228 + G*2416 + B*450) >> 12`.
pub fn desaturate(src: &PixelBuffer) -> PipelineResult<PixelBuffer> {
    if !src.is_valid() || src.format() != PixelFormat::R8G8B8 {
        return Err(PipelineError::InvalidArgument(format!(
            "desaturate expects an R8G8B8 buffer, got {}",
            src.format()
        )));
    }

    let mut gray = PixelBuffer::new(PixelFormat::R8, src.width(), src.height())
        .map_err(|e| e.during("allocate"))?;

    for j in 0..src.height() {
        desaturate_line(src.row(j), gray.row_mut(j));
    }

    Ok(gray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> PixelBuffer {
        let bytes = rgb.repeat((width * height) as usize);
        PixelBuffer::from_raw(PixelFormat::R8G8B8, width, height, bytes).unwrap()
    }

    #[test]
    fn test_pure_red() {
        let gray = desaturate(&solid(7, 5, [255, 0, 0])).unwrap();
        assert_eq!(gray.format(), PixelFormat::R8);
        assert_eq!((gray.width(), gray.height()), (7, 5));
        assert!(gray.data().iter().all(|&v| v == 76));
    }

    #[test]
    fn test_primaries_and_extremes() {
        assert!(desaturate(&solid(2, 2, [0, 255, 0])).unwrap().data().iter().all(|&v| v == 150));
        assert!(desaturate(&solid(2, 2, [0, 0, 255])).unwrap().data().iter().all(|&v| v == 28));
        assert!(desaturate(&solid(2, 2, [0, 0, 0])).unwrap().data().iter().all(|&v| v == 0));
        // Weights sum to 4094/4096, so full white lands one step short.
        assert!(desaturate(&solid(2, 2, [255, 255, 255])).unwrap().data().iter().all(|&v| v == 254));
    }

    #[test]
    fn test_pixels_stay_in_place() {
        let bytes = vec![255, 0, 0, 0, 0, 0, 0, 0, 0, 0, 255, 0];
        let src = PixelBuffer::from_raw(PixelFormat::R8G8B8, 2, 2, bytes).unwrap();
        let gray = desaturate(&src).unwrap();
        assert_eq!(gray.data(), &[76, 0, 0, 150]);
    }

    #[test]
    fn test_rejects_single_channel() {
        let src = PixelBuffer::new(PixelFormat::R8, 4, 4).unwrap();
        let err = desaturate(&src).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
