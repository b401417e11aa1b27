//! Separable coverage-filter resampling for single channel buffers.
//!
//! Each destination pixel maps to a source sub-pixel coordinate by direct
//! scaling (`dest * ratio`). The sample at that coordinate is a triangular
//! weighted mean of the source samples within `ratio` of it along one axis.
//! Rows are resampled first into a `(dest_width, src_height)` intermediate,
//! then columns of that intermediate into the output.
//!
//! Arithmetic is single precision and the integer accumulator is truncated
//! after every tap, so results are reproducible bit for bit.

use crate::buffer::PixelBuffer;
use crate::error::{PipelineError, PipelineResult};
use crate::format::PixelFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Source sub-pixel step per destination pixel along one axis.
fn axis_ratio(src_len: u32, dest_len: u32) -> f32 {
    if dest_len == 1 {
        1.0
    } else {
        (src_len - 1) as f32 / (dest_len - 1) as f32
    }
}

/// Coverage sample of an `R8` buffer at `(x, y)`, filtering along `axis`.
///
/// The coordinate on the other axis must already be integral.
fn coverage_sample(src: &PixelBuffer, x: f32, y: f32, radius: f32, axis: Axis) -> u8 {
    let pixel = |i: i64, j: i64| src.data()[src.block_offset(i as u32, j as u32)];
    let max_x = i64::from(src.width()) - 1;
    let max_y = i64::from(src.height()) - 1;
    let reach = (radius + 1.0) as i64;

    let mut total: i64 = 0;
    let mut weights: f32 = 0.0;

    for k in (1 - reach)..=reach {
        let offset = k as f32;
        let (ix, iy, distance) = match axis {
            Axis::Horizontal => {
                let ix = (x + offset) as i64;
                (ix, y as i64, (x - ix as f32).abs())
            }
            Axis::Vertical => {
                let iy = (y + offset) as i64;
                (x as i64, iy, (y - iy as f32).abs())
            }
        };
        if ix < 0 || iy < 0 || ix > max_x || iy > max_y {
            continue;
        }

        let weight = 1.0 - distance.min(radius) / radius;
        total = (total as f32 + weight * f32::from(pixel(ix, iy))) as i64;
        weights += weight;
    }

    if weights <= 0.0 {
        // Upsampling can land every tap exactly one radius away.
        return pixel(x as i64, y as i64);
    }
    (total as f32 / weights) as u8
}

/// Resample `src` to `dest_width x dest_height`.
///
/// Requesting the current dimensions returns a byte-identical copy of any
/// valid buffer. Anything else needs a single channel 8-bit source.
pub fn resize(
    src: &PixelBuffer,
    dest_width: u32,
    dest_height: u32,
) -> PipelineResult<PixelBuffer> {
    if !src.is_valid() {
        return Err(PipelineError::InvalidArgument(
            "cannot resize an invalid buffer".into(),
        ));
    }
    if dest_width == 0 || dest_height == 0 {
        return Err(PipelineError::InvalidArgument(format!(
            "resize target must be non-zero (got {}x{})",
            dest_width, dest_height
        )));
    }

    if dest_width == src.width() && dest_height == src.height() {
        return src.try_clone();
    }

    if src.format() != PixelFormat::R8 {
        return Err(PipelineError::InvalidArgument(format!(
            "resampling supports R8 buffers only, got {}",
            src.format()
        )));
    }

    let h_ratio = axis_ratio(src.width(), dest_width);
    let v_ratio = axis_ratio(src.height(), dest_height);
    if h_ratio <= 0.0 || v_ratio <= 0.0 {
        return Err(PipelineError::InvalidArgument(format!(
            "cannot stretch {}x{} to {}x{}: zero filter radius",
            src.width(),
            src.height(),
            dest_width,
            dest_height
        )));
    }

    tracing::trace!(
        "Resizing {}x{} -> {}x{} (ratios {:.3}, {:.3})",
        src.width(),
        src.height(),
        dest_width,
        dest_height,
        h_ratio,
        v_ratio
    );

    let mut rows = PixelBuffer::new(PixelFormat::R8, dest_width, src.height())
        .map_err(|e| e.during("allocate"))?;
    for j in 0..src.height() {
        for i in 0..dest_width {
            let x = i as f32 * h_ratio;
            let value = coverage_sample(src, x, j as f32, h_ratio, Axis::Horizontal);
            let offset = rows.block_offset(i, j);
            rows.data_mut()[offset] = value;
        }
    }

    let mut dest = PixelBuffer::new(PixelFormat::R8, dest_width, dest_height)
        .map_err(|e| e.during("allocate"))?;
    for j in 0..dest_height {
        let y = j as f32 * v_ratio;
        for i in 0..dest_width {
            let value = coverage_sample(&rows, i as f32, y, v_ratio, Axis::Vertical);
            let offset = dest.block_offset(i, j);
            dest.data_mut()[offset] = value;
        }
    }

    Ok(dest)
}
