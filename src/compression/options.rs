//! Settings for a decode call.

/// What to do with the CRCs stored in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Don't compute CRCs at all.
    Ignore,
    /// Compute them and log a warning on a mismatch, but keep going.
    #[default]
    Warn,
    /// Fail the decode on the first mismatch. A block that fails is not handed to the sink.
    Strict,
}

/// Options for the decoder.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub checksums: ChecksumPolicy,
    /// Undo the BWT and RLE1 of several blocks at once on the rayon thread pool.
    pub parallel: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checksums(mut self, policy: ChecksumPolicy) -> Self {
        self.checksums = policy;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
