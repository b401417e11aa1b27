//! Separable 2D DCT-II.
//!
//! The naive O(N²) line transform is fine here: it only ever runs on
//! thumbnails a few dozen pixels wide.

use crate::buffer::PixelBuffer;
use crate::error::{PipelineError, PipelineResult};
use crate::format::PixelFormat;
use crate::math::fast_sqrt;

/// Pi for the cosine argument, one ulp below `std::f32::consts::PI`.
pub(crate) const DCT_PI: f32 = 3.141_592_5;

/// Allocate a zeroed coefficient line.
fn alloc_line(len: usize) -> PipelineResult<Vec<i32>> {
    let mut line = Vec::new();
    line.try_reserve_exact(len)
        .map_err(|_| PipelineError::OutOfMemory {
            bytes: len * std::mem::size_of::<i32>(),
        })?;
    line.resize(len, 0);
    Ok(line)
}

/// 1D DCT-II of `input` into `output` (same length).
///
/// Each tap is accumulated in single precision and truncated back to an
/// integer before the next one; the sum is then scaled by `sqrt(1/N)` for
/// the DC term and `sqrt(2/N)` otherwise.
pub(crate) fn transform_line(input: &[i32], output: &mut [i32]) {
    let n = input.len();
    if n == 0 {
        return;
    }
    let dc_scale = fast_sqrt(1.0 / n as f32);
    let ac_scale = fast_sqrt(2.0 / n as f32);
    let period = (2 * n) as f32;

    for (i, out) in output.iter_mut().enumerate().take(n) {
        let mut total: i32 = 0;
        for (k, &value) in input.iter().enumerate() {
            let angle = ((2 * k + 1) * i) as f32 * DCT_PI / period;
            total = (total as f32 + value as f32 * angle.cos()) as i32;
        }
        let scale = if i == 0 { dc_scale } else { ac_scale };
        *out = (total as f32 * scale) as i32;
    }
}

/// Transform an `R8` buffer into an `R32S` buffer of DCT coefficients.
///
/// Rows are transformed into a full-size scratch buffer, then its columns
/// into the output.
pub fn transform(src: &PixelBuffer) -> PipelineResult<PixelBuffer> {
    if !src.is_valid() || src.format() != PixelFormat::R8 {
        return Err(PipelineError::InvalidArgument(format!(
            "transform expects an R8 buffer, got {}",
            src.format()
        )));
    }

    let (width, height) = (src.width(), src.height());
    let mut scratch =
        PixelBuffer::new(PixelFormat::R32S, width, height).map_err(|e| e.during("allocate"))?;
    let mut coeffs =
        PixelBuffer::new(PixelFormat::R32S, width, height).map_err(|e| e.during("allocate"))?;

    let mut row_in = alloc_line(width as usize).map_err(|e| e.during("allocate"))?;
    let mut row_out = alloc_line(width as usize).map_err(|e| e.during("allocate"))?;
    for j in 0..height {
        for (value, &pixel) in row_in.iter_mut().zip(src.row(j)) {
            *value = i32::from(pixel);
        }
        transform_line(&row_in, &mut row_out);
        for (i, &value) in (0..width).zip(row_out.iter()) {
            scratch.set_coefficient(i, j, value)?;
        }
    }

    let mut col_in = alloc_line(height as usize).map_err(|e| e.during("allocate"))?;
    let mut col_out = alloc_line(height as usize).map_err(|e| e.during("allocate"))?;
    for i in 0..width {
        for (j, value) in (0..height).zip(col_in.iter_mut()) {
            *value = scratch.coefficient(i, j)?;
        }
        transform_line(&col_in, &mut col_out);
        for (j, &value) in (0..height).zip(col_out.iter()) {
            coeffs.set_coefficient(i, j, value)?;
        }
    }

    Ok(coeffs)
}
