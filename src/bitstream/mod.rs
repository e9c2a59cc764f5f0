//! The bitstream module forms the input subsystem for the Rust version of the standard BZIP2
//! library.
//!
//! BZIP2 packs its fields without regard to byte boundaries, so everything after the stream
//! header is read a bit at a time (or a few bits at a time) from the compressed buffer.
//!
pub mod bitreader;
#[cfg(test)]
pub mod bitwriter;
