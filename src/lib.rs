//! Rust decoder for the standard BZIP2 format.
//!
//! Version 0.1.0
//!
//! Provides safe decompression of complete bzip2 streams held in memory. Every stage works on
//! untrusted input: malformed data is reported as an error, never read past or panicked on.
//!
//! Decoding is single threaded by default. With `DecodeOptions::parallel`, the BWT reversal and
//! final run-length expansion of several blocks run at once on the rayon thread pool; blocks are
//! still delivered in order.
//!
//! Basic usage to decompress a buffer:
//!
//! ```no_run
//! let compressed = std::fs::read("test.txt.bz2").unwrap();
//! let text = bzip2_decoder::decode_to_vec(&compressed).unwrap();
//! ```
//!
//! To receive each block as it is decoded, hand `decode` a sink:
//!
//! ```no_run
//! let compressed = std::fs::read("test.txt.bz2").unwrap();
//! let mut sink = |offset: u64, bytes: Vec<u8>| -> std::io::Result<()> {
//!     println!("{} bytes at {}", bytes.len(), offset);
//!     Ok(())
//! };
//! bzip2_decoder::decode(&compressed, &mut sink).unwrap();
//! ```
//!
//! Or from the command line:
//!
//! `$> bunzip2 -k test.txt.bz2`
//!
pub mod bitstream;
pub mod bwt_algorithms;
pub mod compression;
pub mod huffman_coding;
pub mod tools;

pub use compression::decompress::{decode, decode_to_vec, Decoder, StreamSummary};
pub use compression::error::{DecodeError, FormatError, Stage};
pub use compression::options::{ChecksumPolicy, DecodeOptions};
pub use compression::sink::{FailureReporter, LogReporter, Sink, WriteSink};
