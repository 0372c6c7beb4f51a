//! Bit-level cursor for replay member buffers.
//!
//! Provides [`BitCursor`], the sequential reader every decoder in the
//! workspace pulls from. It reads both sub-byte fields (bit-packed members)
//! and whole aligned bytes (versioned members) out of one immutable slice.
//!
//! # Bit order
//!
//! Bytes are consumed from their least significant bit upward, but the
//! bits of a multi-bit read are assembled most significant first. Reading
//! 3 bits from `0b0000_0101` yields `0b101`; reading a further 5 bits
//! yields the remaining high bits `0b00000`.

mod error;

pub use error::BitsError;

/// Sequential bit/byte reader over a borrowed buffer.
///
/// A cursor is created per input buffer and must be owned by exactly one
/// decode call tree; its position is plain mutable state.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    /// Whole bytes pulled out of `data` so far.
    used: usize,
    /// Unconsumed bits of the last pulled byte, shifted down.
    next: u8,
    /// How many bits of `next` are still unread (0..=8).
    next_bits: u32,
}

impl<'a> BitCursor<'a> {
    /// Creates a cursor positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            used: 0,
            next: 0,
            next_bits: 0,
        }
    }

    /// Returns `true` once every bit of the buffer has been consumed.
    pub fn done(&self) -> bool {
        self.next_bits == 0 && self.used >= self.data.len()
    }

    /// Number of bits consumed so far.
    pub fn used_bits(&self) -> usize {
        self.used * 8 - self.next_bits as usize
    }

    /// Number of bits still available.
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() - self.used) * 8 + self.next_bits as usize
    }

    /// Whether the cursor sits on a byte boundary.
    pub fn is_aligned(&self) -> bool {
        self.next_bits == 0
    }

    /// Reads `count` bits (at most 64) as an unsigned integer.
    ///
    /// # Errors
    /// [`BitsError::Truncated`] if fewer than `count` bits remain; the
    /// cursor is left untouched in that case.
    pub fn read_bits(&mut self, count: u32) -> Result<u64, BitsError> {
        if count > 64 {
            return Err(BitsError::WidthTooLarge(count));
        }
        let remaining = self.remaining_bits();
        if count as usize > remaining {
            return Err(BitsError::Truncated {
                requested: count as usize,
                remaining,
            });
        }

        let mut result = 0u64;
        let mut result_bits = 0u32;
        while result_bits != count {
            if self.next_bits == 0 {
                self.next = self.data[self.used];
                self.used += 1;
                self.next_bits = 8;
            }
            let copy_bits = (count - result_bits).min(self.next_bits);
            let copy = u64::from(self.next) & ((1u64 << copy_bits) - 1);
            result |= copy << (count - result_bits - copy_bits);
            // `copy_bits` can be 8, which would overflow a `u8` shift.
            self.next = (u16::from(self.next) >> copy_bits) as u8;
            self.next_bits -= copy_bits;
            result_bits += copy_bits;
        }
        Ok(result)
    }

    /// Drops any unread bits of the current byte.
    ///
    /// A no-op when the cursor is already aligned.
    pub fn align_to_byte(&mut self) {
        self.next = 0;
        self.next_bits = 0;
    }

    /// Borrows the next `count` whole bytes.
    ///
    /// # Errors
    /// [`BitsError::Unaligned`] if the cursor is mid-byte,
    /// [`BitsError::Truncated`] if the buffer is too short.
    pub fn read_aligned_bytes(&mut self, count: usize) -> Result<&'a [u8], BitsError> {
        if !self.is_aligned() {
            return Err(BitsError::Unaligned {
                bit_offset: self.used_bits(),
            });
        }
        let available = self.data.len() - self.used;
        if count > available {
            return Err(BitsError::Truncated {
                requested: count * 8,
                remaining: available * 8,
            });
        }
        let bytes = &self.data[self.used..self.used + count];
        self.used += count;
        Ok(bytes)
    }

    /// Reads `count` bytes starting at any bit position.
    pub fn read_unaligned_bytes(&mut self, count: usize) -> Result<Vec<u8>, BitsError> {
        if self.is_aligned() {
            return self.read_aligned_bytes(count).map(<[u8]>::to_vec);
        }
        let remaining = self.remaining_bits();
        if count * 8 > remaining {
            return Err(BitsError::Truncated {
                requested: count * 8,
                remaining,
            });
        }
        (0..count).map(|_| self.read_bits(8).map(|b| b as u8)).collect()
    }

    /// Aligns, then borrows `count` bytes. Used for length-prefixed blobs.
    pub fn read_blob(&mut self, count: usize) -> Result<&'a [u8], BitsError> {
        self.align_to_byte();
        self.read_aligned_bytes(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_low_bits_first() {
        let mut cursor = BitCursor::new(&[0b0000_0101]);
        assert_eq!(cursor.read_bits(3).unwrap(), 0b101);
        assert_eq!(cursor.used_bits(), 3);
        assert_eq!(cursor.read_bits(5).unwrap(), 0);
        assert!(cursor.done());
    }

    #[test]
    fn test_read_bits_across_bytes_is_big_endian() {
        // 12 bits: the 8 bits of the first byte land high, the low
        // nibble of the second byte lands low.
        let mut cursor = BitCursor::new(&[0xAB, 0x0C]);
        assert_eq!(cursor.read_bits(12).unwrap(), 0xABC);
    }

    #[test]
    fn test_read_full_width() {
        let mut cursor = BitCursor::new(&[0xFF; 8]);
        assert_eq!(cursor.read_bits(64).unwrap(), u64::MAX);
        assert!(cursor.done());
    }

    #[test]
    fn test_read_bits_zero_width() {
        let mut cursor = BitCursor::new(&[]);
        assert_eq!(cursor.read_bits(0).unwrap(), 0);
        assert!(cursor.done());
    }

    #[test]
    fn test_truncated_read_leaves_cursor_in_place() {
        let mut cursor = BitCursor::new(&[0x01]);
        cursor.read_bits(4).unwrap();
        let err = cursor.read_bits(8).unwrap_err();
        assert_eq!(
            err,
            BitsError::Truncated {
                requested: 8,
                remaining: 4
            }
        );
        assert_eq!(cursor.used_bits(), 4);
    }

    #[test]
    fn test_width_too_large() {
        let mut cursor = BitCursor::new(&[0; 16]);
        assert_eq!(cursor.read_bits(65), Err(BitsError::WidthTooLarge(65)));
    }

    #[test]
    fn test_align_to_byte() {
        let mut cursor = BitCursor::new(&[0xFF, 0x42]);
        cursor.align_to_byte();
        assert_eq!(cursor.used_bits(), 0);
        cursor.read_bits(1).unwrap();
        cursor.align_to_byte();
        assert_eq!(cursor.used_bits(), 8);
        assert_eq!(cursor.read_aligned_bytes(1).unwrap(), &[0x42]);
    }

    #[test]
    fn test_aligned_read_rejects_mid_byte() {
        let mut cursor = BitCursor::new(&[0, 0]);
        cursor.read_bits(3).unwrap();
        assert_eq!(
            cursor.read_aligned_bytes(1),
            Err(BitsError::Unaligned { bit_offset: 3 })
        );
    }

    #[test]
    fn test_read_unaligned_bytes() {
        let mut cursor = BitCursor::new(&[0xFF, 0xFF, 0x0F]);
        cursor.read_bits(4).unwrap();
        let bytes = cursor.read_unaligned_bytes(2).unwrap();
        assert_eq!(bytes, vec![0xFF, 0xFF]);
        assert_eq!(cursor.used_bits(), 20);
        assert!(!cursor.done());
    }

    #[test]
    fn test_read_blob_aligns_first() {
        let mut cursor = BitCursor::new(&[0x01, b'h', b'i']);
        cursor.read_bits(2).unwrap();
        assert_eq!(cursor.read_blob(2).unwrap(), b"hi");
        assert!(cursor.done());
    }

    #[test]
    fn test_read_blob_truncated() {
        let mut cursor = BitCursor::new(&[b'a']);
        assert!(matches!(
            cursor.read_blob(4),
            Err(BitsError::Truncated { .. })
        ));
    }
}
