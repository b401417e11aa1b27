//! Packed pixel format descriptors.
//!
//! A format packs up to four channel widths (6 bits each) into one `u32`,
//! first channel in the highest slot. Channel count and bits per pixel are
//! derived from the packed widths; bit 28 marks signed integer storage.

use std::fmt;

const CHANNEL_MASK: u32 = 0x3F;
const CHANNEL_SHIFTS: [u32; MAX_CHANNEL_COUNT] = [18, 12, 6, 0];
const SIGNED_FLAG: u32 = 0x1000_0000;

/// Maximum number of channels a format can describe.
pub const MAX_CHANNEL_COUNT: usize = 4;

/// Packed pixel format descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelFormat(u32);

impl PixelFormat {
    /// No format. Buffers can never carry it.
    pub const NONE: Self = Self(0x0000_0000);
    /// Single 8-bit channel (luma).
    pub const R8: Self = Self(0x0020_0000);
    /// Three interleaved 8-bit channels.
    pub const R8G8B8: Self = Self(0x0020_8200);
    /// Single signed 32-bit channel, used for transform coefficients.
    pub const R32S: Self = Self(0x1080_0000);

    /// Wrap a raw packed descriptor.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw packed descriptor.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Build a format from per-channel bit widths.
    ///
    /// Returns `None` for zero or more than four channels, or any width
    /// that is zero or does not fit in 6 bits.
    pub fn from_channels(widths: &[u8], signed: bool) -> Option<Self> {
        if widths.is_empty() || widths.len() > MAX_CHANNEL_COUNT {
            return None;
        }

        let mut raw = if signed { SIGNED_FLAG } else { 0 };
        for (&width, shift) in widths.iter().zip(CHANNEL_SHIFTS) {
            let width = u32::from(width);
            if width == 0 || width > CHANNEL_MASK {
                return None;
            }
            raw |= width << shift;
        }
        Some(Self(raw))
    }

    /// Bit width of channel `index`, or 0 if the channel is unused.
    pub fn channel_bits(self, index: usize) -> u32 {
        CHANNEL_SHIFTS
            .get(index)
            .map(|shift| (self.0 >> shift) & CHANNEL_MASK)
            .unwrap_or(0)
    }

    /// Number of channels with a non-zero width.
    pub fn channel_count(self) -> u8 {
        (0..MAX_CHANNEL_COUNT)
            .filter(|&index| self.channel_bits(index) != 0)
            .count() as u8
    }

    /// Sum of all channel widths.
    pub fn bits_per_pixel(self) -> u32 {
        (0..MAX_CHANNEL_COUNT).map(|index| self.channel_bits(index)).sum()
    }

    /// Whether channels hold signed integers.
    pub fn is_signed(self) -> bool {
        self.0 & SIGNED_FLAG != 0
    }

    /// Whether a whole pixel occupies an integral number of bytes.
    pub fn is_byte_aligned(self) -> bool {
        self.bits_per_pixel() % 8 == 0
    }

    /// Bytes occupied by one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        (self.bits_per_pixel() / 8) as usize
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NONE => write!(f, "NONE"),
            Self::R8 => write!(f, "R8"),
            Self::R8G8B8 => write!(f, "R8G8B8"),
            Self::R32S => write!(f, "R32S"),
            other => write!(f, "{:#010x}", other.0),
        }
    }
}
