//! Owned pixel buffers with byte-level block addressing.
//!
//! A [`PixelBuffer`] stores pixels tightly packed, row after row, with no
//! padding: `row_pitch() * height == slice_pitch()` always holds. Buffers can
//! only be obtained through [`PixelBuffer::new`] (or the constructors built on
//! it), so a buffer without a format or with a zero dimension never exists.

use crate::error::{PipelineError, PipelineResult};
use crate::format::PixelFormat;

/// Allocate `len` zeroed bytes, reporting allocation failure instead of aborting.
pub(crate) fn alloc_zeroed(len: usize) -> PipelineResult<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| {
        tracing::error!("Failed to allocate {} bytes", len);
        PipelineError::OutOfMemory { bytes: len }
    })?;
    data.resize(len, 0);
    Ok(data)
}

/// A single image plane: format descriptor, dimensions and pixel bytes.
#[derive(Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    format: PixelFormat,
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    channel_count: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a zero-filled buffer.
    ///
    /// Fails with `InvalidArgument` when either dimension is zero, the format
    /// has no channels, or its pixel size is not a whole number of bytes.
    pub fn new(format: PixelFormat, width: u32, height: u32) -> PipelineResult<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidArgument(format!(
                "buffer dimensions must be non-zero (got {}x{})",
                width, height
            )));
        }

        let mut buffer = Self::with_format(format)?;
        buffer.set_dimensions(width, height)?;
        Ok(buffer)
    }

    /// Wrap already-decoded pixel bytes.
    ///
    /// `bytes` must hold exactly `width * height * bits_per_pixel / 8` bytes.
    pub fn from_raw(
        format: PixelFormat,
        width: u32,
        height: u32,
        bytes: Vec<u8>,
    ) -> PipelineResult<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidArgument(format!(
                "buffer dimensions must be non-zero (got {}x{})",
                width, height
            )));
        }

        let mut buffer = Self::with_format(format)?;
        let expected = buffer.byte_size(width, height)?;
        if bytes.len() != expected {
            return Err(PipelineError::InvalidArgument(format!(
                "{} {}x{} needs {} bytes, got {}",
                format,
                width,
                height,
                expected,
                bytes.len()
            )));
        }

        buffer.width = width;
        buffer.height = height;
        buffer.data = bytes;
        Ok(buffer)
    }

    /// A formatted buffer with no storage yet. Never escapes this module.
    fn with_format(format: PixelFormat) -> PipelineResult<Self> {
        let channel_count = format.channel_count();
        if channel_count == 0 {
            return Err(PipelineError::InvalidArgument(format!(
                "format {} has no channels",
                format
            )));
        }
        if !format.is_byte_aligned() {
            return Err(PipelineError::InvalidArgument(format!(
                "format {} has a {} bit pixel, which is not byte aligned",
                format,
                format.bits_per_pixel()
            )));
        }

        Ok(Self {
            format,
            width: 0,
            height: 0,
            bits_per_pixel: format.bits_per_pixel(),
            channel_count,
            data: Vec::new(),
        })
    }

    fn byte_size(&self, width: u32, height: u32) -> PipelineResult<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(self.bits_per_pixel as usize / 8))
            .ok_or_else(|| {
                PipelineError::InvalidArgument(format!(
                    "{}x{} {} buffer overflows the address space",
                    width, height, self.format
                ))
            })
    }

    /// Change the dimensions, reallocating zero-filled storage.
    ///
    /// Previous contents are discarded. Setting the current dimensions is a
    /// no-op that keeps the contents. On failure the buffer is unchanged.
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> PipelineResult<()> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidArgument(format!(
                "buffer dimensions must be non-zero (got {}x{})",
                width, height
            )));
        }
        if width == self.width && height == self.height {
            return Ok(());
        }

        let data = alloc_zeroed(self.byte_size(width, height)?)?;
        self.data = data;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Allocate a buffer of the same format and dimensions and copy every byte.
    pub fn try_clone(&self) -> PipelineResult<Self> {
        let mut clone = Self::new(self.format, self.width, self.height)
            .map_err(|e| e.during("clone"))?;
        clone.data.copy_from_slice(&self.data[..self.slice_pitch()]);
        Ok(clone)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.bits_per_pixel
    }

    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    /// Format set, non-zero pixel size and non-zero dimensions.
    pub fn is_valid(&self) -> bool {
        self.format != PixelFormat::NONE
            && self.bits_per_pixel != 0
            && self.width != 0
            && self.height != 0
    }

    /// Byte distance between two vertically adjacent pixels.
    pub fn row_pitch(&self) -> usize {
        (self.width as usize * self.bits_per_pixel as usize) >> 3
    }

    /// Total allocated bytes.
    pub fn slice_pitch(&self) -> usize {
        self.data.len()
    }

    /// Byte offset of pixel `(i, j)` (column `i`, row `j`).
    pub fn block_offset(&self, i: u32, j: u32) -> usize {
        self.row_pitch() * j as usize + ((i as usize * self.bits_per_pixel as usize) >> 3)
    }

    /// All pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes of row `j`.
    pub fn row(&self, j: u32) -> &[u8] {
        let start = self.block_offset(0, j);
        &self.data[start..start + self.row_pitch()]
    }

    pub fn row_mut(&mut self, j: u32) -> &mut [u8] {
        let start = self.block_offset(0, j);
        let pitch = self.row_pitch();
        &mut self.data[start..start + pitch]
    }

    /// Bytes of the pixel block at `(i, j)`.
    pub fn block(&self, i: u32, j: u32) -> &[u8] {
        let start = self.block_offset(i, j);
        &self.data[start..start + self.format.bytes_per_pixel()]
    }

    /// Byte range of the 32-bit value at `(i, j)`.
    fn coefficient_range(&self, i: u32, j: u32) -> PipelineResult<std::ops::Range<usize>> {
        if self.bits_per_pixel != 32 {
            return Err(PipelineError::InvalidArgument(format!(
                "coefficient access needs a 32-bit format, buffer is {}",
                self.format
            )));
        }
        if i >= self.width || j >= self.height {
            return Err(PipelineError::InvalidArgument(format!(
                "coefficient ({}, {}) is outside a {}x{} buffer",
                i, j, self.width, self.height
            )));
        }
        let start = self.block_offset(i, j);
        Ok(start..start + 4)
    }

    /// Read the signed 32-bit little-endian value stored at `(i, j)`.
    ///
    /// Fails with `InvalidArgument` unless the format is 32 bits per pixel
    /// (such as `R32S`) and `(i, j)` lies inside the buffer.
    pub fn coefficient(&self, i: u32, j: u32) -> PipelineResult<i32> {
        let range = self.coefficient_range(i, j)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[range]);
        Ok(i32::from_le_bytes(bytes))
    }

    /// Store a signed 32-bit value at `(i, j)` in little-endian order.
    pub fn set_coefficient(&mut self, i: u32, j: u32, value: i32) -> PipelineResult<()> {
        let range = self.coefficient_range(i, j)?;
        self.data[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Consume the buffer and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
