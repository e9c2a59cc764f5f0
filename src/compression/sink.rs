//! Where decoded data goes, and who hears about failures.

use std::io::{self, Write};

use log::error;

use super::error::DecodeError;

/// Receives decoded blocks, in stream order, together with the offset of their first byte in the
/// decompressed output.
pub trait Sink {
    fn accept(&mut self, offset: u64, bytes: Vec<u8>) -> io::Result<()>;
}

impl<F> Sink for F
where
    F: FnMut(u64, Vec<u8>) -> io::Result<()>,
{
    fn accept(&mut self, offset: u64, bytes: Vec<u8>) -> io::Result<()> {
        self(offset, bytes)
    }
}

/// Sink that writes every block to a writer (a file, stdout, a Vec<u8>, io::sink()...).
#[derive(Debug)]
pub struct WriteSink<W> {
    writer: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Give back the writer. Buffered writers still need a flush.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for WriteSink<W> {
    fn accept(&mut self, _offset: u64, bytes: Vec<u8>) -> io::Result<()> {
        self.writer.write_all(&bytes)
    }
}

/// Told once when a decode call fails.
pub trait FailureReporter {
    fn report(&self, error: &DecodeError);
}

/// Default reporter: logs the failure at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl FailureReporter for LogReporter {
    fn report(&self, error: &DecodeError) {
        match error.block_index() {
            Some(index) => error!("Fatal error in block {}: {}", index, error),
            None => error!("Fatal error: {}", error),
        }
    }
}
