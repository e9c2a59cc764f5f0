//! Error types for the decoder.
//!
//! Every fault found while decoding is terminal. A [`FormatError`] names what was wrong with the
//! compressed data, and [`DecodeError`] adds where it happened (the stream header or a numbered
//! block) or reports that the output sink gave up.

use std::fmt::{self, Display, Formatter};
use std::io;

use thiserror::Error;

/// The part of the decoder that was reading when the input ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    StreamHeader,
    BlockSignature,
    BlockHeader,
    SymbolMap,
    Selectors,
    CodeLengths,
    HuffmanData,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::StreamHeader => "stream header",
            Stage::BlockSignature => "block signature",
            Stage::BlockHeader => "block header",
            Stage::SymbolMap => "symbol map",
            Stage::Selectors => "selectors",
            Stage::CodeLengths => "huffman code lengths",
            Stage::HuffmanData => "huffman coded data",
        };
        f.write_str(name)
    }
}

/// Something in the compressed data that cannot be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected end of data in {stage}: needed {needed} bits, {available} left")]
    Truncation {
        stage: Stage,
        needed: usize,
        available: usize,
    },

    /// The first four bytes are not "BZh" followed by a block size digit.
    #[error("not a bzip2 stream (header {header:#010x})")]
    BadMagic { header: u32 },

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("block uses no byte values")]
    EmptySymbolMap,

    #[error("invalid huffman group count {0} (expected 2-6)")]
    InvalidGroupCount(u32),

    #[error("invalid code length {length} for symbol {symbol} in huffman group {group}")]
    InvalidCodeLength { group: usize, symbol: usize, length: i32 },

    #[error("selector {index} refers to a huffman group past the {groups} in use")]
    InvalidSelector { index: usize, groups: usize },

    #[error("huffman group {group} does not form a complete prefix code")]
    IncompleteHuffmanTable { group: usize },

    #[error("selectors exhausted without an end of block symbol")]
    MissingEndSymbol,

    #[error("block holds more than {limit} bytes")]
    BlockOverflow { limit: usize },

    #[error("invalid block signature {0:#014x}")]
    InvalidSignature(u64),

    #[error("origin pointer {origin} outside a block of {len} bytes")]
    InvalidOriginPointer { origin: u32, len: usize },

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

/// The reason a decode call failed, with enough context to locate the fault.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Fault in the stream header, or truncation while looking for the next signature.
    #[error("{0}")]
    Stream(#[source] FormatError),

    /// Fault inside a block, or an unknown signature where that block should start. `index`
    /// counts blocks from 1.
    #[error("block {index}: {source}")]
    Block {
        index: usize,
        #[source]
        source: FormatError,
    },

    /// The sink refused a decoded block.
    #[error("sink rejected block {index}: {source}")]
    Sink {
        index: usize,
        #[source]
        source: io::Error,
    },
}

impl DecodeError {
    /// The format fault behind this error, if it was not a sink failure.
    pub fn format_error(&self) -> Option<&FormatError> {
        match self {
            DecodeError::Stream(e) | DecodeError::Block { source: e, .. } => Some(e),
            DecodeError::Sink { .. } => None,
        }
    }

    /// Block index (1-based) the error belongs to, if any.
    pub fn block_index(&self) -> Option<usize> {
        match self {
            DecodeError::Stream(_) => None,
            DecodeError::Block { index, .. } | DecodeError::Sink { index, .. } => Some(*index),
        }
    }
}

impl From<DecodeError> for io::Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Sink { source, .. } => source,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
