//! The bwt_algorithms module undoes the Burrows-Wheeler Transform for the Rust version of the
//! standard BZIP2 library.
//!
//! Inverting the transform only needs the last column (the block data) and the row of the
//! original text (the origin pointer). A stable counting sort of the last column gives the first
//! column, and following the resulting links from the origin rebuilds the text.
//!
pub mod bwt_decode;
