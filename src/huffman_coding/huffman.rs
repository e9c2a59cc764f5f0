use log::trace;

use crate::compression::error::FormatError;

/// Longest code length BZIP2 allows.
pub const MAX_CODE_LEN: u32 = 20;
/// Width of the lookahead window handed to decode().
pub const WINDOW_BITS: u32 = 24;

/// Canonical huffman decode table for one coding group.
///
/// Codes are assigned in (length, symbol) order: within a length they count up by one, and on
/// each step to a longer length the next code doubles. For each length the table keeps the first
/// code at that length, left justified to WINDOW_BITS, and the index in `symbols` where symbols
/// of that length start. Index MAX_CODE_LEN + 1 is a sentinel so `first[len + 1]` always exists.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    min_len: u32,
    max_len: u32,
    /// First left-justified code of each length. u64, because an over-subscribed set of lengths
    /// pushes codes past the window.
    first: [u64; MAX_CODE_LEN as usize + 2],
    start: [usize; MAX_CODE_LEN as usize + 2],
    /// Symbols sorted by (length, symbol).
    symbols: Vec<u16>,
}

impl HuffmanTable {
    /// Build the table from the code length of every symbol (index = symbol). Lengths must be
    /// 1..=MAX_CODE_LEN, which the code length reader guarantees.
    pub fn from_lengths(lengths: &[u8]) -> Self {
        let mut pairs: Vec<(u8, u16)> = lengths
            .iter()
            .enumerate()
            .map(|(sym, &len)| (len, sym as u16))
            .collect();
        pairs.sort_unstable();

        let min_len = pairs.first().map_or(1, |p| p.0 as u32);
        let max_len = pairs.last().map_or(1, |p| p.0 as u32);

        let mut first = [0_u64; MAX_CODE_LEN as usize + 2];
        let mut start = [0_usize; MAX_CODE_LEN as usize + 2];
        let mut code = 0_u64;
        let mut bits = 0_u32;

        for (i, &(len, _)) in pairs.iter().enumerate() {
            // Step up to this length, recording where each new length begins
            while bits < len as u32 {
                bits += 1;
                code <<= 1;
                start[bits as usize] = i;
                first[bits as usize] = code << (WINDOW_BITS - bits);
            }
            code += 1;
        }
        // Fill the rest so every length past the longest one points at the end
        while bits <= MAX_CODE_LEN {
            bits += 1;
            code <<= 1;
            start[bits as usize] = pairs.len();
            first[bits as usize] = code << (WINDOW_BITS - bits);
        }

        Self {
            min_len,
            max_len,
            first,
            start,
            symbols: pairs.into_iter().map(|(_, s)| s).collect(),
        }
    }

    /// Decode one symbol from a left-justified WINDOW_BITS window. Returns (code length, symbol).
    pub fn decode(&self, window: u32, group: usize) -> Result<(u32, u16), FormatError> {
        let window = window as u64;
        for len in self.min_len..=self.max_len {
            let l = len as usize;
            if window < self.first[l + 1] {
                let offset = ((window - self.first[l]) >> (WINDOW_BITS - len)) as usize;
                return self
                    .symbols
                    .get(self.start[l] + offset)
                    .map(|&sym| (len, sym))
                    .ok_or(FormatError::IncompleteHuffmanTable { group });
            }
        }
        trace!("No code matched window {:06x} in group {}", window, group);
        Err(FormatError::IncompleteHuffmanTable { group })
    }

    /// Shortest code length in the table.
    #[cfg(test)]
    pub fn min_len(&self) -> u32 {
        self.min_len
    }

    /// Longest code length in the table.
    #[cfg(test)]
    pub fn max_len(&self) -> u32 {
        self.max_len
    }
}
