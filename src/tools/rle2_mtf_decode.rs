use log::trace;

use crate::bitstream::bitreader::BitCursor;
use crate::compression::error::{FormatError, Stage};
use crate::huffman_coding::huffman::{HuffmanTable, WINDOW_BITS};

pub const RUNA: u16 = 0;
pub const RUNB: u16 = 1;
/// Symbols coded with one selector's table before moving to the next selector.
pub const CHUNK_SIZE: usize = 50;
/// Block length for each unit of the header's block size digit.
const BLOCK_LEN_STEP: usize = 100_000;

/// Longest BWT block allowed by a block size digit: 100k per unit, up to 900k at level 9. A '0'
/// digit is never written by a compressor and gets the smallest limit.
pub fn block_limit(block_size: u8) -> usize {
    BLOCK_LEN_STEP * block_size.clamp(1, 9) as usize
}

/// Move-to-front list of the byte values used in a block.
#[derive(Debug, Clone)]
pub struct Favourites {
    list: Vec<u8>,
}

impl Favourites {
    /// Start the list in ascending byte order, as the symbol map delivers it.
    pub fn new(symbols: Vec<u8>) -> Self {
        Self { list: symbols }
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    /// Byte value at the front of the list.
    pub fn front(&self) -> u8 {
        self.list[0]
    }

    /// Return the byte at idx and move it to the front, shifting the bytes before it back one.
    pub fn promote(&mut self, idx: usize) -> u8 {
        let byte = self.list[idx];
        self.list.copy_within(0..idx, 1);
        self.list[0] = byte;
        byte
    }
}

/// Undoes RLE2 and the move-to-front transform, one huffman symbol at a time.
#[derive(Debug)]
pub struct MtfRunDecoder {
    favourites: Favourites,
    /// End of block symbol: one past the last MTF index.
    eob: u16,
    /// Pending run of the front byte, accumulated from RUNA/RUNB.
    run: usize,
    /// Bit weight of the next RUNA/RUNB.
    power: u32,
    out: Vec<u8>,
    limit: usize,
}

impl MtfRunDecoder {
    pub fn new(favourites: Favourites, limit: usize) -> Self {
        Self {
            eob: favourites.len() as u16 + 1,
            favourites,
            run: 0,
            power: 0,
            out: Vec::new(),
            limit,
        }
    }

    /// Feed one decoded huffman symbol. Returns true once the end of block symbol arrives.
    pub fn push(&mut self, symbol: u16) -> Result<bool, FormatError> {
        /*
        Runs of the front byte are written in bijective base 2 with RUNA as digit 1 and RUNB as
        digit 2, least significant digit first. So RUNA adds 1 << power and RUNB 2 << power.
        */
        if symbol == RUNA || symbol == RUNB {
            self.run += 1 << (self.power + symbol as u32);
            self.power += 1;
            if self.run > self.limit - self.out.len() {
                return Err(FormatError::BlockOverflow { limit: self.limit });
            }
            return Ok(false);
        }

        // Any other symbol ends the run, so output it first
        if self.run > 0 {
            let front = self.favourites.front();
            self.out.resize(self.out.len() + self.run, front);
            self.run = 0;
            self.power = 0;
        }

        if symbol == self.eob {
            return Ok(true);
        }

        if self.out.len() == self.limit {
            return Err(FormatError::BlockOverflow { limit: self.limit });
        }
        let byte = self.favourites.promote(symbol as usize - 1);
        self.out.push(byte);
        Ok(false)
    }

    /// The BWT transformed block decoded so far.
    pub fn into_bwt(self) -> Vec<u8> {
        self.out
    }
}

/// Huffman decode the block data, 50 symbols per selector, and undo RLE2/MTF on the way.
/// Returns the BWT transformed block, at most `limit` bytes long. The cursor is left just past the
/// end of block symbol.
pub fn rle2_mtf_decode(
    br: &mut BitCursor<'_>,
    selectors: &[u8],
    tables: &[HuffmanTable],
    favourites: Favourites,
    limit: usize,
) -> Result<Vec<u8>, FormatError> {
    let mut decoder = MtfRunDecoder::new(favourites, limit);

    for (chunk, &selector) in selectors.iter().enumerate() {
        let group = selector as usize;
        let table = tables.get(group).ok_or(FormatError::InvalidSelector {
            index: chunk,
            groups: tables.len(),
        })?;

        for _ in 0..CHUNK_SIZE {
            let (bits, symbol) = table.decode(br.peek(WINDOW_BITS), group)?;
            br.skip(bits as usize, Stage::HuffmanData)?;
            if decoder.push(symbol)? {
                trace!(
                    "End of block in chunk {} of {} at {}.",
                    chunk,
                    selectors.len(),
                    br.loc()
                );
                return Ok(decoder.into_bwt());
            }
        }
    }
    Err(FormatError::MissingEndSymbol)
}
