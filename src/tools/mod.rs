//! The tools module holds the smaller stages of the decoder, plus the command line options.
//!
//! BZIP2 compresses data one block at a time, so everything here works on a single block.
//!
//! The tools are:
//! - cli: Command line options for the bunzip2 binary.
//! - crc: CRC32 checksum for BZIP2, both block and stream versions.
//! - rle1: Expands the phase 1 runs (four bytes plus a count).
//! - rle2_mtf_decode: Undoes RUNA/RUNB runs and the Move-To-Front transform in one pass.
//! - symbol_map: Reads the map of byte values used in a block.
//!
pub mod cli;
pub mod crc;
pub mod rle1;
pub mod rle2_mtf_decode;
pub mod symbol_map;
