//! The huffman module decodes the bitstream for the Rust version of the standard BZIP2 library.
//!
//! BZIP2 never transmits huffman codes, only code lengths. Codes are assigned canonically from
//! the lengths, so a table of the first code at each length is enough to decode.
//!
//! The huffman coding algorithm as used by BZIP2 is both block and chunk oriented. Within each
//! block, chunks of 50 symbols are encoded separately using one of up to six huffman tables.
//!

pub mod huffman;
