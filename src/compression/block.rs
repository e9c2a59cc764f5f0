//! Decoding of a single block, from just after its signature and CRC to the finished bytes.
//!
//! Everything here is block local: the selectors, the huffman tables, the MTF state and the BWT
//! buffers are built for one block and dropped with it.

use log::{debug, trace};

use crate::bitstream::bitreader::BitCursor;
use crate::bwt_algorithms::bwt_decode::bwt_decode;
use crate::huffman_coding::huffman::{HuffmanTable, MAX_CODE_LEN};
use crate::tools::{
    crc::do_crc,
    rle1::rle1_decode,
    rle2_mtf_decode::{rle2_mtf_decode, Favourites},
    symbol_map::read_sym_map,
};

use super::error::{FormatError, Stage};

/// Random flag, origin pointer and the first symbol map word.
const FIXED_HEADER_BITS: usize = 1 + 24 + 16;
/// Size of the move-to-front list used for selectors.
const MAX_GROUPS: usize = 8;

/// Everything read ahead of the huffman coded data.
#[derive(Debug)]
pub struct BlockHeader {
    /// BWT origin pointer.
    pub origin: u32,
    /// Byte values used in the block, ascending.
    pub symbols: Vec<u8>,
    /// Huffman table to use for each chunk of 50 symbols.
    pub selectors: Vec<u8>,
    /// One table per huffman group.
    pub tables: Vec<HuffmanTable>,
}

/// A block whose bitstream has been consumed, waiting for the BWT and RLE1 to be undone.
#[derive(Debug)]
pub struct BwtBlock {
    pub origin: u32,
    pub bwt: Vec<u8>,
    /// CRC stored in the stream ahead of the block.
    pub stored_crc: u32,
}

/// A fully decoded block.
#[derive(Debug)]
pub struct DecodedBlock {
    pub data: Vec<u8>,
    pub stored_crc: u32,
    /// CRC of data, when it was asked for.
    pub computed_crc: Option<u32>,
}

impl BwtBlock {
    /// Undo the BWT and RLE1. This part needs no bitstream, so blocks can be finished in parallel.
    pub fn finish(self, compute_crc: bool) -> Result<DecodedBlock, FormatError> {
        let data = rle1_decode(&bwt_decode(self.origin, &self.bwt)?);
        Ok(DecodedBlock {
            computed_crc: compute_crc.then(|| do_crc(0, &data)),
            data,
            stored_crc: self.stored_crc,
        })
    }
}

/// Read a block from the bitstream up to its BWT buffer, which may hold at most `limit` bytes.
/// The cursor must sit just past the block signature and CRC; it is left just past the end of
/// block symbol.
pub fn read_block(
    br: &mut BitCursor<'_>,
    stored_crc: u32,
    limit: usize,
) -> Result<BwtBlock, FormatError> {
    let header = read_block_header(br)?;
    let bwt = rle2_mtf_decode(
        br,
        &header.selectors,
        &header.tables,
        Favourites::new(header.symbols),
        limit,
    )?;
    debug!(
        "Block data ends at {} with {} bytes before the BWT is undone.",
        br.loc(),
        bwt.len()
    );
    Ok(BwtBlock {
        origin: header.origin,
        bwt,
        stored_crc,
    })
}

/// Read the block header: flags, origin pointer, symbol map, selectors and huffman tables.
pub fn read_block_header(br: &mut BitCursor<'_>) -> Result<BlockHeader, FormatError> {
    br.require(FIXED_HEADER_BITS, Stage::BlockHeader)?;

    // Randomized blocks come from bzip2 0.9.0 and earlier; no current compressor writes them.
    if br.bool_bit(Stage::BlockHeader)? {
        return Err(FormatError::UnsupportedFeature("randomized blocks"));
    }

    let origin = br.read(24, Stage::BlockHeader)?;
    trace!("Origin pointer is {}.", origin);

    let symbols = read_sym_map(br)?;
    if symbols.is_empty() {
        return Err(FormatError::EmptySymbolMap);
    }
    // RUNA and RUNB replace MTF index 0, and EOB comes after the last index
    let symbols_used = symbols.len() + 2;
    debug!("Found {} symbols ({} in use).", symbols.len(), symbols_used);

    let groups = br.read(3, Stage::Selectors)?;
    if !(2..=6).contains(&groups) {
        return Err(FormatError::InvalidGroupCount(groups));
    }
    let selector_count = br.read(15, Stage::Selectors)? as usize;
    let selectors = read_selectors(br, groups as usize, selector_count)?;
    debug!(
        "Decoded {} selectors for the {} tables.",
        selector_count, groups
    );

    let tables = (0..groups as usize)
        .map(|group| {
            let lengths = read_code_lengths(br, group, symbols_used)?;
            Ok(HuffmanTable::from_lengths(&lengths))
        })
        .collect::<Result<Vec<_>, FormatError>>()?;

    Ok(BlockHeader {
        origin,
        symbols,
        selectors,
        tables,
    })
}

/// Read the selectors: each is a unary coded index into a move-to-front list of the groups.
fn read_selectors(
    br: &mut BitCursor<'_>,
    groups: usize,
    count: usize,
) -> Result<Vec<u8>, FormatError> {
    let mut table_idx: [u8; MAX_GROUPS] = [0, 1, 2, 3, 4, 5, 6, 7];
    let mut selectors = Vec::with_capacity(count);

    for index in 0..count {
        let mut idx = 0;
        while br.bool_bit(Stage::Selectors)? {
            idx += 1;
            if idx >= groups {
                return Err(FormatError::InvalidSelector { index, groups });
            }
        }
        // Undo the move to the front
        let selector = table_idx[idx];
        table_idx.copy_within(0..idx, 1);
        table_idx[0] = selector;
        selectors.push(selector);
    }
    Ok(selectors)
}

/// Read the code lengths of one huffman group. The first length is a 5 bit number; each symbol
/// then adjusts the running length with "10" (+1) and "11" (-1) pairs, ended by a "0".
fn read_code_lengths(
    br: &mut BitCursor<'_>,
    group: usize,
    symbols_used: usize,
) -> Result<Vec<u8>, FormatError> {
    let valid = 1..=MAX_CODE_LEN as i32;
    let mut length = br.read(5, Stage::CodeLengths)? as i32;
    let mut lengths = Vec::with_capacity(symbols_used);

    for symbol in 0..symbols_used {
        loop {
            if !valid.contains(&length) {
                return Err(FormatError::InvalidCodeLength {
                    group,
                    symbol,
                    length,
                });
            }
            if !br.bool_bit(Stage::CodeLengths)? {
                break;
            }
            if br.bool_bit(Stage::CodeLengths)? {
                length -= 1;
            } else {
                length += 1;
            }
        }
        lengths.push(length as u8);
    }
    trace!("Group {} code lengths: {:?}", group, lengths);
    Ok(lengths)
}
