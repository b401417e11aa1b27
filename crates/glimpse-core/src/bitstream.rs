//! Bit-granular sequential storage.
//!
//! A [`BitStream`] owns a byte buffer with independent read and write cursors
//! counted in bits, `0 <= read <= write <= capacity`. Bits fill each byte
//! from the least significant end. Byte-aligned transfers copy whole bytes;
//! anything else is merged across byte boundaries with per-byte masks.
//!
//! Equality is strict: both cursors and every byte of storage, including bytes
//! past the write cursor, must match.

use crate::buffer::alloc_zeroed;
use crate::error::{PipelineError, PipelineResult};

/// Sequential bit reader/writer over an owned buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStream {
    data: Vec<u8>,
    read_index: usize,
    write_index: usize,
}

impl BitStream {
    /// An empty stream with no capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stream able to hold `bits` bits (rounded up to whole bytes).
    pub fn with_capacity(bits: usize) -> PipelineResult<Self> {
        let mut stream = Self::new();
        stream.resize_capacity(bits)?;
        Ok(stream)
    }

    /// A stream holding a copy of `bytes`, ready to be read from the start.
    pub fn from_bytes(bytes: &[u8]) -> PipelineResult<Self> {
        let mut stream = Self::new();
        stream.assign_bytes(bytes)?;
        Ok(stream)
    }

    /// Replace the contents with a copy of `bytes`.
    ///
    /// Capacity becomes `bytes.len() * 8`, the write cursor sits at the end and
    /// the read cursor at the start.
    pub fn assign_bytes(&mut self, bytes: &[u8]) -> PipelineResult<()> {
        if bytes.is_empty() {
            return Err(PipelineError::InvalidArgument(
                "cannot assign an empty byte slice to a bitstream".into(),
            ));
        }

        self.clear();
        let mut data = alloc_zeroed(bytes.len())?;
        data.copy_from_slice(bytes);
        self.data = data;
        self.write_index = bytes.len() << 3;
        Ok(())
    }

    /// Drop all content and reallocate room for `bits` bits.
    ///
    /// Returns the granted bit count, which equals the request. On failure the
    /// stream is left empty with no capacity.
    pub fn resize_capacity(&mut self, bits: usize) -> PipelineResult<usize> {
        if bits == 0 {
            tracing::error!("Invalid bitstream capacity requested ({})", bits);
            return Err(PipelineError::InvalidArgument(
                "bitstream capacity must be non-zero".into(),
            ));
        }

        self.clear();
        self.data = alloc_zeroed(bits.div_ceil(8))?;
        Ok(bits)
    }

    /// Release storage and rewind both cursors.
    pub fn clear(&mut self) {
        self.reset();
        self.data = Vec::new();
    }

    /// Rewind both cursors, keeping storage.
    pub fn reset(&mut self) {
        self.read_index = 0;
        self.write_index = 0;
    }

    /// Capacity in bits.
    pub fn capacity(&self) -> usize {
        self.data.len() << 3
    }

    /// Bits written but not yet read.
    pub fn occupancy(&self) -> usize {
        self.write_index - self.read_index
    }

    /// Read cursor, in bits.
    pub fn read_position(&self) -> usize {
        self.read_index
    }

    /// Write cursor, in bits.
    pub fn write_position(&self) -> usize {
        self.write_index
    }

    /// Underlying storage, including bytes past the write cursor.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Move the read cursor, clamped to the write cursor.
    ///
    /// There is no way to move the write cursor backwards.
    pub fn seek(&mut self, bit_offset: usize) {
        self.read_index = bit_offset.min(self.write_index);
    }

    /// Nothing left to read.
    pub fn is_empty(&self) -> bool {
        self.read_index == self.write_index
    }

    /// Nothing left to write.
    pub fn is_full(&self) -> bool {
        self.write_index == self.capacity()
    }

    fn ensure_writable(&self, bits: usize) -> PipelineResult<()> {
        if self.write_index + bits > self.capacity() {
            tracing::warn!("Bitstream write capacity reached");
            return Err(PipelineError::CapacityLimit(format!(
                "writing {} bits at offset {} exceeds a capacity of {} bits",
                bits,
                self.write_index,
                self.capacity()
            )));
        }
        Ok(())
    }

    /// Append the low bit of `value`.
    pub fn write_bit(&mut self, value: u8) -> PipelineResult<()> {
        self.ensure_writable(1)?;

        let target_byte = self.write_index >> 3;
        let target_bit = self.write_index % 8;
        let byte = &mut self.data[target_byte];
        *byte = (*byte & !(1 << target_bit)) | ((value & 0x1) << target_bit);

        self.write_index += 1;
        Ok(())
    }

    /// Append 8 bits, least significant first.
    pub fn write_byte(&mut self, value: u8) -> PipelineResult<()> {
        self.ensure_writable(8)?;

        if self.write_index % 8 == 0 {
            self.data[self.write_index >> 3] = value;
            self.write_index += 8;
        } else {
            for i in 0..8 {
                self.write_bit((value >> i) & 0x1)?;
            }
        }
        Ok(())
    }

    /// Append the first `bit_count` bits of `src`.
    pub fn write_bits(&mut self, src: &[u8], bit_count: usize) -> PipelineResult<()> {
        if bit_count == 0 || src.len() << 3 < bit_count {
            return Err(PipelineError::InvalidArgument(format!(
                "cannot write {} bits from a {} byte source",
                bit_count,
                src.len()
            )));
        }
        self.ensure_writable(bit_count)?;

        let mut copied = 0;
        if self.write_index % 8 == 0 && bit_count >= 8 {
            // Whole bytes first; any trailing bits go through the unaligned path.
            copied = aligned_copy(&mut self.data, self.write_index, src, 0, bit_count);
        }
        if copied < bit_count {
            copied += unaligned_copy(
                &mut self.data,
                self.write_index + copied,
                src,
                copied,
                bit_count - copied,
            );
        }

        self.write_index += copied;
        Ok(())
    }

    /// Append every byte of `src`.
    pub fn write_bytes(&mut self, src: &[u8]) -> PipelineResult<()> {
        if src.is_empty() {
            return Err(PipelineError::InvalidArgument(
                "cannot write an empty byte slice".into(),
            ));
        }
        self.ensure_writable(src.len() << 3)?;

        if self.write_index % 8 == 0 {
            let start = self.write_index >> 3;
            self.data[start..start + src.len()].copy_from_slice(src);
            self.write_index += src.len() << 3;
            Ok(())
        } else {
            self.write_bits(src, src.len() << 3)
        }
    }

    /// Read one bit (0 or 1).
    pub fn read_bit(&mut self) -> PipelineResult<u8> {
        if self.read_index >= self.write_index {
            tracing::warn!("Requested read operation on an empty bitstream");
            return Err(PipelineError::InvalidResource(
                "read from an empty bitstream".into(),
            ));
        }

        let source_byte = self.data[self.read_index >> 3];
        let value = (source_byte >> (self.read_index % 8)) & 0x1;
        self.read_index += 1;
        Ok(value)
    }

    /// Read 8 bits, least significant first.
    pub fn read_byte(&mut self) -> PipelineResult<u8> {
        if self.read_index + 8 > self.write_index {
            tracing::warn!("Insufficient data to complete read request");
            return Err(PipelineError::InvalidResource(format!(
                "byte read needs 8 bits, {} available",
                self.occupancy()
            )));
        }

        let value = if self.read_index % 8 == 0 {
            self.data[self.read_index >> 3]
        } else {
            let mut out = [0u8; 1];
            unaligned_copy(&mut out, 0, &self.data, self.read_index, 8);
            out[0]
        };

        self.read_index += 8;
        Ok(value)
    }

    /// Read up to `bit_count` bits into `dest`, returning the number read.
    ///
    /// When fewer than `bit_count` bits remain, whatever is left is read and
    /// the call still succeeds. Bits of `dest` past the returned count keep
    /// their previous value.
    pub fn read_bits(&mut self, dest: &mut [u8], bit_count: usize) -> PipelineResult<usize> {
        if bit_count == 0 || dest.len() << 3 < bit_count {
            return Err(PipelineError::InvalidArgument(format!(
                "cannot read {} bits into a {} byte destination",
                bit_count,
                dest.len()
            )));
        }

        let count = bit_count.min(self.occupancy());

        let mut copied = 0;
        if self.read_index % 8 == 0 && count >= 8 {
            copied = aligned_copy(dest, 0, &self.data, self.read_index, count);
        }
        if copied < count {
            copied += unaligned_copy(
                dest,
                copied,
                &self.data,
                self.read_index + copied,
                count - copied,
            );
        }

        self.read_index += copied;
        Ok(count)
    }

    /// Read up to `byte_count` whole bytes into `dest`, returning the number read.
    ///
    /// Clamps to the whole bytes remaining; fails with `CapacityLimit` when not
    /// even one byte remains.
    pub fn read_bytes(&mut self, dest: &mut [u8], byte_count: usize) -> PipelineResult<usize> {
        if byte_count == 0 || dest.len() < byte_count {
            return Err(PipelineError::InvalidArgument(format!(
                "cannot read {} bytes into a {} byte destination",
                byte_count,
                dest.len()
            )));
        }

        let mut count = byte_count;
        if self.read_index + (count << 3) > self.write_index {
            count = self.occupancy() >> 3;
            if count == 0 {
                return Err(PipelineError::CapacityLimit(format!(
                    "byte read needs 8 bits, {} available",
                    self.occupancy()
                )));
            }
        }

        if self.read_index % 8 == 0 {
            let start = self.read_index >> 3;
            dest[..count].copy_from_slice(&self.data[start..start + count]);
            self.read_index += count << 3;
        } else {
            self.read_bits(dest, count << 3)?;
        }
        Ok(count)
    }
}

/// Copy the whole bytes of a bit range. Both offsets must be byte aligned.
///
/// Returns the number of bits copied, always a multiple of 8.
fn aligned_copy(
    dest: &mut [u8],
    dest_bit_offset: usize,
    src: &[u8],
    src_bit_offset: usize,
    bit_count: usize,
) -> usize {
    debug_assert_eq!(dest_bit_offset % 8, 0);
    debug_assert_eq!(src_bit_offset % 8, 0);

    let dest_start = dest_bit_offset >> 3;
    let src_start = src_bit_offset >> 3;
    let bytes = bit_count >> 3;

    dest[dest_start..dest_start + bytes].copy_from_slice(&src[src_start..src_start + bytes]);
    bytes << 3
}

/// Copy `bit_count` bits between arbitrary bit offsets.
///
/// Each step moves as many bits as fit in both the current source byte and
/// the current destination byte. Destination bits outside the range are kept.
fn unaligned_copy(
    dest: &mut [u8],
    mut dest_offset: usize,
    src: &[u8],
    mut src_offset: usize,
    bit_count: usize,
) -> usize {
    let src_limit = src_offset + bit_count;

    while src_offset < src_limit {
        let target_bit = dest_offset % 8;
        let source_bit = src_offset % 8;
        let bits_left = src_limit - src_offset;

        let write_count = (8 - target_bit).min(8 - source_bit).min(bits_left);
        let fill_mask = ((1u16 << write_count) - 1) as u8;

        let source = (src[src_offset >> 3] & (fill_mask << source_bit)) >> source_bit;
        let target = &mut dest[dest_offset >> 3];
        *target = (*target & !(fill_mask << target_bit)) | (source << target_bit);

        src_offset += write_count;
        dest_offset += write_count;
    }

    bit_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn bit(bytes: &[u8], index: usize) -> u8 {
        (bytes[index >> 3] >> (index % 8)) & 1
    }

    fn pattern(bits: usize) -> Vec<u8> {
        (0..bits.div_ceil(8))
            .map(|i| (i as u8).wrapping_mul(37) ^ 0xA5)
            .collect()
    }

    #[test]
    fn test_resize_capacity_rounds_up() {
        let mut stream = BitStream::new();
        assert_eq!(stream.resize_capacity(13).unwrap(), 13);
        assert_eq!(stream.capacity(), 16);
        assert!(stream.is_empty());
        assert!(!stream.is_full());
    }

    #[test]
    fn test_resize_capacity_zero_fails() {
        let mut stream = BitStream::with_capacity(8).unwrap();
        let err = stream.resize_capacity(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_resize_capacity_clears_content() {
        let mut stream = BitStream::with_capacity(16).unwrap();
        stream.write_byte(0xFF).unwrap();
        stream.resize_capacity(32).unwrap();
        assert_eq!(stream.write_position(), 0);
        assert_eq!(stream.capacity(), 32);
        assert!(stream.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_bit_round_trip_at_every_offset() {
        for n in [1usize, 7, 8, 9, 63, 64, 127] {
            let source = pattern(n);
            for offset in 0..8 {
                let mut stream = BitStream::with_capacity(256).unwrap();
                for _ in 0..offset {
                    stream.write_bit(1).unwrap();
                }
                stream.write_bits(&source, n).unwrap();
                assert_eq!(stream.write_position(), offset + n);

                stream.seek(offset);
                let mut out = vec![0u8; n.div_ceil(8)];
                assert_eq!(stream.read_bits(&mut out, n).unwrap(), n);
                for i in 0..n {
                    assert_eq!(bit(&out, i), bit(&source, i), "n={} offset={} bit={}", n, offset, i);
                }
                assert!(stream.is_empty());
            }
        }
    }

    #[test]
    fn test_write_beyond_capacity_leaves_cursors() {
        let mut stream = BitStream::with_capacity(16).unwrap();
        stream.write_bits(&[0xAB, 0x0C], 12).unwrap();
        stream.write_bits(&[0x0F], 4).unwrap();
        assert!(stream.is_full());

        let before = stream.clone();
        assert_eq!(stream.write_bit(1).unwrap_err().kind(), ErrorKind::CapacityLimit);
        assert_eq!(stream.write_byte(1).unwrap_err().kind(), ErrorKind::CapacityLimit);
        assert_eq!(stream.write_bits(&[1], 3).unwrap_err().kind(), ErrorKind::CapacityLimit);
        assert_eq!(stream.write_bytes(&[1]).unwrap_err().kind(), ErrorKind::CapacityLimit);
        assert_eq!(stream, before);
    }

    #[test]
    fn test_partial_write_is_rejected_whole() {
        let mut stream = BitStream::with_capacity(16).unwrap();
        stream.write_bits(&[0xFF], 5).unwrap();
        let err = stream.write_bytes(&[1, 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityLimit);
        assert_eq!(stream.write_position(), 5);
    }

    #[test]
    fn test_write_bit_lsb_first() {
        let mut stream = BitStream::with_capacity(8).unwrap();
        for value in [1, 0, 1, 1, 0, 0, 0, 1] {
            stream.write_bit(value).unwrap();
        }
        assert_eq!(stream.data(), &[0b1000_1101]);
    }

    #[test]
    fn test_byte_round_trip_unaligned() {
        let mut stream = BitStream::with_capacity(32).unwrap();
        stream.write_bit(0).unwrap();
        stream.write_bit(1).unwrap();
        stream.write_byte(0x5C).unwrap();
        stream.write_bytes(&[0xE1]).unwrap();

        assert_eq!(stream.read_bit().unwrap(), 0);
        assert_eq!(stream.read_bit().unwrap(), 1);
        assert_eq!(stream.read_byte().unwrap(), 0x5C);
        assert_eq!(stream.read_byte().unwrap(), 0xE1);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_aligned_bytes_fast_path() {
        let mut stream = BitStream::with_capacity(64).unwrap();
        stream.write_bytes(&[1, 2, 3, 4]).unwrap();
        assert_eq!(&stream.data()[..4], &[1, 2, 3, 4]);

        let mut out = [0u8; 4];
        assert_eq!(stream.read_bytes(&mut out, 4).unwrap(), 4);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_read_from_empty_stream() {
        let mut stream = BitStream::with_capacity(8).unwrap();
        assert_eq!(stream.read_bit().unwrap_err().kind(), ErrorKind::InvalidResource);

        stream.write_bits(&[0x7F], 7).unwrap();
        assert_eq!(stream.read_byte().unwrap_err().kind(), ErrorKind::InvalidResource);
    }

    #[test]
    fn test_read_bits_clamps() {
        let mut stream = BitStream::with_capacity(16).unwrap();
        stream.write_bits(&[0b1011_0110, 0b0000_0011], 10).unwrap();
        stream.seek(3);

        let mut out = [0u8; 2];
        assert_eq!(stream.read_bits(&mut out, 16).unwrap(), 7);
        assert_eq!(out, [0b0111_0110, 0]);
        assert!(stream.is_empty());

        assert_eq!(stream.read_bits(&mut out, 4).unwrap(), 0);
    }

    #[test]
    fn test_read_bytes_clamps_then_fails() {
        let mut stream = BitStream::with_capacity(32).unwrap();
        stream.write_bytes(&[9, 8]).unwrap();
        stream.write_bit(1).unwrap();

        let mut out = [0u8; 4];
        assert_eq!(stream.read_bytes(&mut out, 4).unwrap(), 2);
        assert_eq!(&out[..2], &[9, 8]);

        let err = stream.read_bytes(&mut out, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityLimit);
        assert_eq!(stream.occupancy(), 1);
    }

    #[test]
    fn test_read_bytes_unaligned() {
        let mut stream = BitStream::with_capacity(24).unwrap();
        stream.write_bit(1).unwrap();
        stream.write_bytes(&[0x3C, 0xC3]).unwrap();
        stream.read_bit().unwrap();

        let mut out = [0u8; 2];
        assert_eq!(stream.read_bytes(&mut out, 2).unwrap(), 2);
        assert_eq!(out, [0x3C, 0xC3]);
    }

    #[test]
    fn test_seek_clamps_to_write_cursor() {
        let mut stream = BitStream::with_capacity(16).unwrap();
        stream.write_bits(&[0xFF], 6).unwrap();
        stream.seek(100);
        assert_eq!(stream.read_position(), 6);
        stream.seek(2);
        assert_eq!(stream.occupancy(), 4);
    }

    #[test]
    fn test_from_bytes_is_readable() {
        let mut stream = BitStream::from_bytes(&[0xAA, 0x01]).unwrap();
        assert_eq!(stream.capacity(), 16);
        assert!(stream.is_full());
        assert_eq!(stream.read_byte().unwrap(), 0xAA);
        assert_eq!(stream.read_bit().unwrap(), 1);

        assert!(BitStream::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_equality_is_strict() {
        let mut a = BitStream::with_capacity(16).unwrap();
        let mut b = BitStream::with_capacity(16).unwrap();
        a.write_byte(0x0F).unwrap();
        b.write_byte(0x0F).unwrap();
        assert_eq!(a, b);

        let copy = a.clone();
        assert_eq!(copy, a);

        // Same logical content, different cursors.
        a.read_bit().unwrap();
        assert_ne!(a, b);
        a.seek(0);
        assert_eq!(a, b);

        // Same cursors, different bytes past the write cursor.
        let mut c = BitStream::with_capacity(16).unwrap();
        c.write_bytes(&[0x0F, 0xFF]).unwrap();
        c.reset();
        c.write_byte(0x0F).unwrap();
        assert_eq!(c.write_position(), b.write_position());
        assert_eq!(c.read_position(), b.read_position());
        assert_ne!(c, b);

        let smaller = BitStream::with_capacity(8).unwrap();
        assert_ne!(smaller, BitStream::with_capacity(16).unwrap());
    }

    #[test]
    fn test_clear_and_reset() {
        let mut stream = BitStream::with_capacity(8).unwrap();
        stream.write_byte(3).unwrap();

        stream.reset();
        assert_eq!(stream.capacity(), 8);
        assert!(stream.is_empty());
        assert_eq!(stream.data(), &[3]);

        stream.clear();
        assert_eq!(stream.capacity(), 0);
        assert!(stream.is_full());
    }
}
