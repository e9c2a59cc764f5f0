//! The compression module manages the decompression side of the Rust version of the standard BZIP2
//! library.
//!
//! BZIP2 decompression undoes the compression steps in reverse order, one block at a time:
//! - Huffman decoding: each chunk of 50 symbols is decoded with one of 2-6 tables, chosen by the
//!   block's selectors.
//! - RLE 2: Expand all runs of the zero MTF index (RUNA/RUNB).
//! - MTF transform: Convert from the Move-To-Front indices to the byte values they represent.
//! - BWT reversal: Restore the original order of the data from the BWT transform.
//! - RLE 1: Expand all runs of 4+ identical bytes.
//!
//! The first two steps are inherently sequential, as block boundaries are only found by reading
//! through the huffman data. The last two can run in parallel across blocks.
//!

pub mod block;
pub mod decompress;
pub mod error;
pub mod options;
pub mod sink;
