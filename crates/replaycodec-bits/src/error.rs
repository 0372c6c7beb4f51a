/// Errors that can occur while reading from a [`BitCursor`](crate::BitCursor).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitsError {
    /// The read asked for more bits than the buffer still holds.
    #[error("truncated read: requested {requested} bits, {remaining} remaining")]
    Truncated {
        /// Bits the caller asked for.
        requested: usize,
        /// Bits left in the buffer when the read started.
        remaining: usize,
    },

    /// An aligned read was attempted while the cursor sat mid-byte.
    #[error("aligned read at bit offset {bit_offset}")]
    Unaligned {
        /// Absolute bit position of the cursor.
        bit_offset: usize,
    },

    /// `read_bits` only assembles values up to 64 bits wide.
    #[error("cannot read {0} bits into a 64-bit value")]
    WidthTooLarge(u32),
}
