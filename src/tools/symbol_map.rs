use crate::bitstream::bitreader::BitCursor;
use crate::compression::error::{FormatError, Stage};

const BIT_MASK: u16 = 0x8000;

/// Read the two level symbol map from the stream and return the sorted byte values in use.
pub fn read_sym_map(br: &mut BitCursor<'_>) -> Result<Vec<u8>, FormatError> {
    let index = br.read(16, Stage::SymbolMap)? as u16;
    let mut maps = Vec::with_capacity(17);
    maps.push(index);
    for _ in 0..index.count_ones() {
        maps.push(br.read(16, Stage::SymbolMap)? as u16);
    }
    Ok(decode_sym_map(&maps))
}

/// Takes the unique bzip2 symbol map and returns a sorted vec of all u8s used in the block.
pub fn decode_sym_map(symbol_map: &[u16]) -> Vec<u8> {
    /*
    symbol_map[0] marks which ranges of 16 byte values are present. Bit 0 (the msb) covers
    0-15, bit 1 covers 16-31, etc. Every set bit is followed, in order, by one more u16 whose
    bits mark the individual byte values of that range.
    */
    let mut symbols: Vec<u8> = Vec::with_capacity(256);
    let mut ranges = symbol_map.iter().skip(1);

    for block in 0..16_u8 {
        if symbol_map[0] & (BIT_MASK >> block) == 0 {
            continue;
        }
        let Some(&bits) = ranges.next() else { break };
        for byte_idx in 0..16_u8 {
            if bits & (BIT_MASK >> byte_idx) > 0 {
                symbols.push((block << 4) + byte_idx);
            }
        }
    }
    symbols
}
