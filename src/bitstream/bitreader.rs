//! BitCursor: A module for the Rust version of the standard BZIP2 library.
//!
//! Reads the packed bitstream of a BZIP2 compressed buffer, most significant bit first.
//!
//! NOTE: The whole compressed stream must be in memory. The cursor never reads past the end of the
//! buffer: lookahead near the end is padded with zero bits, and any attempt to consume bits that
//! are not there is reported as a truncation.
//!

use crate::compression::error::{FormatError, Stage};

/// Bytes gathered for one lookahead. Five bytes cover 32 bits at any bit offset.
const WINDOW_BYTES: usize = 5;

/// Bit-addressed cursor over an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    /// Position of the next unread bit.
    bit: usize,
    /// Total number of bits in data.
    limit: usize,
}

impl<'a> BitCursor<'a> {
    /// Creates a new cursor positioned at the first bit of data.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit: 0,
            limit: data.len() * 8,
        }
    }

    /// Current bit position.
    #[cfg(test)]
    pub fn position(&self) -> usize {
        self.bit
    }

    /// Bits left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.limit - self.bit
    }

    /// Fail with a truncation error unless at least `n` bits remain.
    pub fn require(&self, n: usize, stage: Stage) -> Result<(), FormatError> {
        if n > self.remaining() {
            return Err(FormatError::Truncation {
                stage,
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Return the next n (1-32) bits without moving. Bits past the end of the buffer read as zero.
    pub fn peek(&self, n: u32) -> u32 {
        debug_assert!((1..=32).contains(&n));
        let byte = self.bit / 8;
        let window = (0..WINDOW_BYTES).fold(0_u64, |acc, i| {
            acc << 8 | *self.data.get(byte + i).unwrap_or(&0) as u64
        });
        let shift = (WINDOW_BYTES * 8) as u32 - (self.bit % 8) as u32 - n;
        ((window >> shift) & ((1_u64 << n) - 1)) as u32
    }

    /// Return the next n (1-32) bits and move past them.
    pub fn read(&mut self, n: u32, stage: Stage) -> Result<u32, FormatError> {
        self.require(n as usize, stage)?;
        let result = self.peek(n);
        self.bit += n as usize;
        Ok(result)
    }

    /// Return true if the next bit is a 1, consuming the bit.
    pub fn bool_bit(&mut self, stage: Stage) -> Result<bool, FormatError> {
        self.read(1, stage).map(|bit| bit == 1)
    }

    /// Move past n bits that were already examined with peek().
    pub fn skip(&mut self, n: usize, stage: Stage) -> Result<(), FormatError> {
        self.require(n, stage)?;
        self.bit += n;
        Ok(())
    }

    /// Move to the next byte boundary (no move if already aligned).
    pub fn align_to_byte(&mut self) {
        self.bit = ((self.bit + 7) & !7).min(self.limit);
    }

    /// Debugging function. Report current position as [byte.bit].
    pub fn loc(&self) -> String {
        format!("[{}.{}]", self.bit / 8, self.bit % 8)
    }
}
