//! CRC32 checksums as BZIP2 uses them: the big endian (MSB first) CRC-32 with polynomial
//! 0x04c11db7, computed per block over the fully decoded bytes, and a stream CRC that folds the
//! block CRCs together.

const POLY: u32 = 0x04c1_1db7;

const CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Continue a block CRC over more data. Start with 0; the result is the finished CRC so far.
pub fn do_crc(crc: u32, data: &[u8]) -> u32 {
    let crc = data.iter().fold(!crc, |crc, &byte| {
        (crc << 8) ^ CRC_TABLE[((crc >> 24) ^ byte as u32) as usize]
    });
    !crc
}

/// Fold a block CRC into the stream CRC.
pub fn do_stream_crc(stream_crc: u32, block_crc: u32) -> u32 {
    stream_crc.rotate_left(1) ^ block_crc
}
