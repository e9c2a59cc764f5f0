use log::{debug, info, trace, warn};
use rayon::prelude::*;

use crate::bitstream::bitreader::BitCursor;
use crate::tools::crc::do_stream_crc;
use crate::tools::rle2_mtf_decode::block_limit;

use super::block::{read_block, BwtBlock, DecodedBlock};
use super::error::{DecodeError, FormatError, Stage};
use super::options::{ChecksumPolicy, DecodeOptions};
use super::sink::{FailureReporter, LogReporter, Sink, WriteSink};

/// "BZh"
const STREAM_MAGIC: u32 = 0x42_5a68;
/// BCD pi, starts every block.
const BLOCK_MAGIC: u64 = 0x3141_5926_5359;
/// BCD sqrt(pi), ends the stream.
const FOOTER_MAGIC: u64 = 0x1772_4538_5090;
/// Magic plus block size digit.
const STREAM_HEADER_BITS: usize = 32;
/// 48 bit signature plus 32 bit CRC.
const SIGNATURE_BITS: usize = 80;

/// What a successful decode found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    /// Block size digit from the stream header ('0'-'9' as 0-9).
    pub block_size: u8,
    /// Number of blocks handed to the sink.
    pub blocks: usize,
    /// Total decompressed bytes.
    pub bytes: u64,
    /// Stream CRC stored in the footer.
    pub stored_crc: u32,
    /// Stream CRC computed from the blocks, unless checksums are ignored.
    pub computed_crc: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectStreamHeader,
    ExpectBlockOrEnd,
    Done,
}

/// Decodes complete bzip2 streams held in memory.
pub struct Decoder {
    options: DecodeOptions,
    reporter: Box<dyn FailureReporter + Send + Sync>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DecodeOptions::default())
    }
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            reporter: Box::new(LogReporter),
        }
    }

    /// Replace the default (logging) failure reporter.
    pub fn with_reporter<R>(mut self, reporter: R) -> Self
    where
        R: FailureReporter + Send + Sync + 'static,
    {
        self.reporter = Box::new(reporter);
        self
    }

    /// Decode one complete stream from input, handing each block to the sink in order.
    ///
    /// On failure the reporter is told, and the error returned. Blocks already given to the sink
    /// stay given.
    pub fn decode<S: Sink + ?Sized>(
        &self,
        input: &[u8],
        sink: &mut S,
    ) -> Result<StreamSummary, DecodeError> {
        let mut output = Output::new(sink, &self.options);
        let mut result = run(input, &mut output);
        // Earlier blocks still waiting in a parallel batch go out before any later error
        if result.is_err() {
            if let Err(earlier) = output.flush() {
                result = Err(earlier);
            }
        }
        if let Err(e) = &result {
            self.reporter.report(e);
        }
        result
    }
}

/// Decode with default options. See [`Decoder::decode`].
pub fn decode<S: Sink + ?Sized>(input: &[u8], sink: &mut S) -> Result<StreamSummary, DecodeError> {
    Decoder::default().decode(input, sink)
}

/// Decode a whole stream into memory.
pub fn decode_to_vec(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut sink = WriteSink::new(Vec::new());
    decode(input, &mut sink)?;
    Ok(sink.into_inner())
}

/// Walk the stream state machine until the footer, or the first fault.
fn run<S: Sink + ?Sized>(
    input: &[u8],
    output: &mut Output<'_, S>,
) -> Result<StreamSummary, DecodeError> {
    let mut br = BitCursor::new(input);
    let mut state = State::ExpectStreamHeader;
    let mut block_size = 0;
    let mut max_block = 0;
    let mut stored_crc = 0;

    while state != State::Done {
        state = match state {
            State::ExpectStreamHeader => {
                block_size = read_stream_header(&mut br).map_err(DecodeError::Stream)?;
                max_block = block_limit(block_size);
                info!("Found a valid bzip2 signature, block size {}.", block_size);
                State::ExpectBlockOrEnd
            }
            State::ExpectBlockOrEnd => {
                let index = output.blocks + output.pending.len() + 1;
                let (signature, crc) = read_signature(&mut br).map_err(DecodeError::Stream)?;
                match signature {
                    BLOCK_MAGIC => {
                        info!("Found a valid header for block {}.", index);
                        trace!("Block {} CRC is {:#010x}.", index, crc);
                        let block = read_block(&mut br, crc, max_block)
                            .map_err(|source| DecodeError::Block { index, source })?;
                        output.push(index, block)?;
                        State::ExpectBlockOrEnd
                    }
                    FOOTER_MAGIC => {
                        stored_crc = crc;
                        br.align_to_byte();
                        State::Done
                    }
                    // Reported against the block that should have started here
                    other => {
                        return Err(DecodeError::Block {
                            index,
                            source: FormatError::InvalidSignature(other),
                        })
                    }
                }
            }
            State::Done => State::Done,
        };
    }

    output.flush()?;
    if br.remaining() > 0 {
        debug!("Ignoring {} bytes after the end of the stream.", br.remaining() / 8);
    }

    let computed_crc = output.stream_crc();
    if let Some(computed) = computed_crc {
        output.check_crc(stored_crc, computed).map_err(DecodeError::Stream)?;
    }
    info!(
        "Decoded {} blocks, {} bytes.",
        output.blocks, output.offset
    );
    Ok(StreamSummary {
        block_size,
        blocks: output.blocks,
        bytes: output.offset,
        stored_crc,
        computed_crc,
    })
}

/// Check "BZh" and the block size digit. Returns the block size (0-9).
fn read_stream_header(br: &mut BitCursor<'_>) -> Result<u8, FormatError> {
    br.require(STREAM_HEADER_BITS, Stage::StreamHeader)?;
    let header = br.peek(32);
    let magic = br.read(24, Stage::StreamHeader)?;
    let digit = br.read(8, Stage::StreamHeader)? as u8;
    if magic != STREAM_MAGIC || !digit.is_ascii_digit() {
        return Err(FormatError::BadMagic { header });
    }
    Ok(digit - b'0')
}

/// Read a 48 bit block or footer signature (as two 24 bit halves) and the CRC after it.
fn read_signature(br: &mut BitCursor<'_>) -> Result<(u64, u32), FormatError> {
    br.require(SIGNATURE_BITS, Stage::BlockSignature)?;
    let high = br.read(24, Stage::BlockSignature)? as u64;
    let low = br.read(24, Stage::BlockSignature)? as u64;
    let crc = br.read(32, Stage::BlockSignature)?;
    Ok((high << 24 | low, crc))
}

/// Hands finished blocks to the sink in order, keeping the running offset and stream CRC.
struct Output<'s, S: ?Sized> {
    sink: &'s mut S,
    policy: ChecksumPolicy,
    parallel: bool,
    /// Blocks read but not yet finished (parallel mode only).
    pending: Vec<(usize, BwtBlock)>,
    /// Bytes handed to the sink so far.
    offset: u64,
    blocks: usize,
    stream_crc: u32,
}

impl<'s, S: Sink + ?Sized> Output<'s, S> {
    fn new(sink: &'s mut S, options: &DecodeOptions) -> Self {
        Self {
            sink,
            policy: options.checksums,
            parallel: options.parallel,
            pending: Vec::new(),
            offset: 0,
            blocks: 0,
            stream_crc: 0,
        }
    }

    fn compute_crc(&self) -> bool {
        self.policy != ChecksumPolicy::Ignore
    }

    fn stream_crc(&self) -> Option<u32> {
        self.compute_crc().then_some(self.stream_crc)
    }

    /// Take a block that has been read from the bitstream.
    fn push(&mut self, index: usize, block: BwtBlock) -> Result<(), DecodeError> {
        if !self.parallel {
            let decoded = block
                .finish(self.compute_crc())
                .map_err(|source| DecodeError::Block { index, source })?;
            return self.emit(index, decoded);
        }
        self.pending.push((index, block));
        if self.pending.len() >= rayon::current_num_threads() {
            self.flush()?;
        }
        Ok(())
    }

    /// Finish all pending blocks on the thread pool, then emit them in order.
    fn flush(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let compute_crc = self.compute_crc();
        let batch = std::mem::take(&mut self.pending);
        trace!("Finishing {} blocks in parallel.", batch.len());
        let finished: Vec<_> = batch
            .into_par_iter()
            .map(|(index, block)| (index, block.finish(compute_crc)))
            .collect();
        for (index, result) in finished {
            let decoded = result.map_err(|source| DecodeError::Block { index, source })?;
            self.emit(index, decoded)?;
        }
        Ok(())
    }

    /// Verify a block CRC (per policy), then pass the block to the sink.
    fn emit(&mut self, index: usize, block: DecodedBlock) -> Result<(), DecodeError> {
        if let Some(computed) = block.computed_crc {
            self.check_crc(block.stored_crc, computed)
                .map_err(|source| DecodeError::Block { index, source })?;
            self.stream_crc = do_stream_crc(self.stream_crc, computed);
        }

        let len = block.data.len() as u64;
        self.sink
            .accept(self.offset, block.data)
            .map_err(|source| DecodeError::Sink { index, source })?;
        info!("Wrote block {} with {} bytes at offset {}.", index, len, self.offset);
        self.offset += len;
        self.blocks += 1;
        Ok(())
    }

    fn check_crc(&self, stored: u32, computed: u32) -> Result<(), FormatError> {
        if stored == computed {
            trace!("CRCs matched: {:#010x}.", stored);
            return Ok(());
        }
        let mismatch = FormatError::ChecksumMismatch { stored, computed };
        match self.policy {
            ChecksumPolicy::Strict => Err(mismatch),
            _ => {
                warn!("{} (Continuing...)", mismatch);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::bitstream::bitwriter::BitWriter;

    /// "aaaaaaaaaaa" compressed by the reference bzip2 at level 9.
    const ELEVEN_AS: [u8; 39] = [
        0x42, 0x5a, 0x68, 0x39, 0x31, 0x41, 0x59, 0x26, 0x53, 0x59, 0x3b, 0x1c, 0x4b, 0x63, 0x00,
        0x00, 0x02, 0x41, 0x00, 0x00, 0x80, 0x20, 0x00, 0x20, 0x00, 0x21, 0x00, 0x82, 0x0b, 0x17,
        0x72, 0x45, 0x38, 0x50, 0x90, 0x3b, 0x1c, 0x4b, 0x63,
    ];

    fn collect(
        decoder: &Decoder,
        input: &[u8],
    ) -> (Result<StreamSummary, DecodeError>, Vec<(u64, Vec<u8>)>) {
        let mut calls = Vec::new();
        let mut sink = |offset: u64, bytes: Vec<u8>| -> io::Result<()> {
            calls.push((offset, bytes));
            Ok(())
        };
        let result = decoder.decode(input, &mut sink);
        (result, calls)
    }

    /// Stream header plus one block signature, ready for a hand written block header.
    fn block_start() -> BitWriter {
        let mut bw = BitWriter::new();
        bw.out(24, STREAM_MAGIC).out8(b'9').out48(BLOCK_MAGIC).out(32, 0);
        bw
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<String>>>);

    impl FailureReporter for Capture {
        fn report(&self, error: &DecodeError) {
            if let Ok(mut reports) = self.0.lock() {
                reports.push(error.to_string());
            }
        }
    }

    #[test]
    fn eleven_as() {
        let (result, calls) = collect(&Decoder::default(), &ELEVEN_AS);
        let summary = result.unwrap();
        assert_eq!(calls, vec![(0, b"aaaaaaaaaaa".to_vec())]);
        assert_eq!(summary.block_size, 9);
        assert_eq!(summary.blocks, 1);
        assert_eq!(summary.bytes, 11);
        assert_eq!(summary.computed_crc, Some(summary.stored_crc));
    }

    #[test]
    fn all_zeros_is_bad_magic() {
        let (result, calls) = collect(&Decoder::default(), &[0; 64]);
        assert!(matches!(
            result,
            Err(DecodeError::Stream(FormatError::BadMagic { header: 0 }))
        ));
        assert!(calls.is_empty());
    }

    #[test]
    fn bad_block_size_digit() {
        let (result, _) = collect(&Decoder::default(), b"BZhx\x17\x72\x45\x38\x50\x90\0\0\0\0");
        assert!(matches!(
            result,
            Err(DecodeError::Stream(FormatError::BadMagic { header: 0x425a_6878 }))
        ));
    }

    #[test]
    fn header_without_blocks() {
        let mut bw = BitWriter::new();
        bw.out(24, STREAM_MAGIC).out8(b'1').out48(FOOTER_MAGIC).out(32, 0);
        let (result, calls) = collect(&Decoder::default(), &bw.finish());
        let summary = result.unwrap();
        assert!(calls.is_empty());
        assert_eq!(summary.blocks, 0);
        assert_eq!(summary.block_size, 1);
    }

    #[test]
    fn short_header() {
        let (result, _) = collect(&Decoder::default(), b"BZh");
        assert!(matches!(
            result,
            Err(DecodeError::Stream(FormatError::Truncation {
                stage: Stage::StreamHeader,
                ..
            }))
        ));
    }

    #[test]
    fn unknown_signature() {
        let mut bw = BitWriter::new();
        bw.out(24, STREAM_MAGIC).out8(b'9').out48(0x1234_5678_9abc).out(32, 0);
        let (result, _) = collect(&Decoder::default(), &bw.finish());
        assert!(matches!(
            result,
            Err(DecodeError::Block {
                index: 1,
                source: FormatError::InvalidSignature(0x1234_5678_9abc)
            })
        ));
    }

    #[test]
    fn randomized_flag() {
        let mut bw = block_start();
        bw.bit(true).out(24, 0).out(16, 0x8000).out(16, 0x8000).out(32, 0);
        let (result, _) = collect(&Decoder::default(), &bw.finish());
        assert!(matches!(
            result,
            Err(DecodeError::Block {
                index: 1,
                source: FormatError::UnsupportedFeature(_)
            })
        ));
    }

    #[test]
    fn group_count_seven() {
        let mut bw = block_start();
        bw.bit(false).out(24, 0).out(16, 0x8000).out(16, 0x8000).out(3, 7).out(32, 0);
        let (result, _) = collect(&Decoder::default(), &bw.finish());
        assert!(matches!(
            result,
            Err(DecodeError::Block {
                index: 1,
                source: FormatError::InvalidGroupCount(7)
            })
        ));
    }

    #[test]
    fn truncated_to_half() {
        let half = &ELEVEN_AS[..ELEVEN_AS.len() / 2];
        let (result, calls) = collect(&Decoder::default(), half);
        assert!(matches!(
            result.unwrap_err().format_error(),
            Some(FormatError::Truncation { .. })
        ));
        assert!(calls.is_empty());
    }

    #[test]
    fn reporter_hears_failures_once() {
        let capture = Capture::default();
        let decoder = Decoder::new(DecodeOptions::new()).with_reporter(capture.clone());
        let (result, _) = collect(&decoder, b"PK\x03\x04");
        assert!(result.is_err());
        let reports = capture.0.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].starts_with("not a bzip2 stream"));
    }

    #[test]
    fn reporter_silent_on_success() {
        let capture = Capture::default();
        let decoder = Decoder::default().with_reporter(capture.clone());
        assert!(collect(&decoder, &ELEVEN_AS).0.is_ok());
        assert!(capture.0.lock().unwrap().is_empty());
    }

    #[test]
    fn corrupt_block_crc() {
        let mut data = ELEVEN_AS;
        // Block CRC sits right after the block signature
        data[10] ^= 0xff;

        // Default policy warns and keeps the data
        let (result, calls) = collect(&Decoder::default(), &data);
        assert!(result.is_ok());
        assert_eq!(calls.len(), 1);

        // Strict policy fails before the sink sees the block
        let strict = Decoder::new(DecodeOptions::new().checksums(ChecksumPolicy::Strict));
        let (result, calls) = collect(&strict, &data);
        assert!(matches!(
            result,
            Err(DecodeError::Block {
                index: 1,
                source: FormatError::ChecksumMismatch { .. }
            })
        ));
        assert!(calls.is_empty());

        // Ignore policy doesn't look
        let ignore = Decoder::new(DecodeOptions::new().checksums(ChecksumPolicy::Ignore));
        let (result, _) = collect(&ignore, &data);
        assert_eq!(result.unwrap().computed_crc, None);
    }

    #[test]
    fn corrupt_stream_crc() {
        let mut data = ELEVEN_AS;
        data[38] ^= 1;
        let strict = Decoder::new(DecodeOptions::new().checksums(ChecksumPolicy::Strict));
        let (result, calls) = collect(&strict, &data);
        assert!(matches!(
            result,
            Err(DecodeError::Stream(FormatError::ChecksumMismatch { .. }))
        ));
        // The block itself was fine and has been delivered
        assert_eq!(calls.len(), 1);
    }

    #[test]
    fn sink_failure_stops_decoding() {
        let mut sink = |_: u64, _: Vec<u8>| -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        };
        let result = Decoder::default().decode(&ELEVEN_AS, &mut sink);
        assert!(matches!(result, Err(DecodeError::Sink { index: 1, .. })));
    }

    /// Run on a pool with several threads, so parallel mode really batches blocks.
    fn on_four_threads<R: Send>(f: impl FnOnce() -> R + Send) -> R {
        rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap()
            .install(f)
    }

    /// The block of ELEVEN_AS, then a second block that fails in its header.
    fn good_block_then_bad() -> Vec<u8> {
        // The first block ends on the byte boundary where the footer starts
        let mut data = ELEVEN_AS[..29].to_vec();
        let mut bw = BitWriter::new();
        bw.out48(BLOCK_MAGIC).out(32, 0).bit(true).out(24, 0).out(16, 0x8000).out(16, 0x8000);
        data.extend(bw.finish());
        data
    }

    #[test]
    fn parallel_matches_serial() {
        let parallel = Decoder::new(DecodeOptions::new().parallel(true));
        let (result, calls) = on_four_threads(|| collect(&parallel, &ELEVEN_AS));
        assert!(result.is_ok());
        assert_eq!(calls, vec![(0, b"aaaaaaaaaaa".to_vec())]);
    }

    #[test]
    fn pending_blocks_go_out_before_a_later_error() {
        let data = good_block_then_bad();
        for parallel in [false, true] {
            let decoder = Decoder::new(DecodeOptions::new().parallel(parallel));
            let (result, calls) = on_four_threads(|| collect(&decoder, &data));
            assert_eq!(calls, vec![(0, b"aaaaaaaaaaa".to_vec())], "parallel {}", parallel);
            assert!(matches!(
                result,
                Err(DecodeError::Block {
                    index: 2,
                    source: FormatError::UnsupportedFeature(_)
                })
            ));
        }
    }

    /// A block of 262142 copies of 'a' (17 RUNBs), with the given block size digit.
    fn long_run_stream(digit: u8) -> Vec<u8> {
        let mut bw = BitWriter::new();
        bw.out(24, STREAM_MAGIC).out8(digit).out48(BLOCK_MAGIC).out(32, 0);
        // Symbol map for 'a', two groups, one selector
        bw.bit(false).out(24, 0).out(16, 0x0200).out(16, 0x4000);
        bw.out(3, 2).out(15, 1).bit(false);
        // Both tables: RUNA 00, RUNB 01, EOB 10
        for _ in 0..2 {
            bw.out(5, 2).out(3, 0);
        }
        for _ in 0..17 {
            bw.out(2, 0b01);
        }
        bw.out(2, 0b10);
        bw.out48(FOOTER_MAGIC).out(32, 0);
        bw.finish()
    }

    #[test]
    fn block_limit_follows_header_digit() {
        let (result, calls) = collect(&Decoder::default(), &long_run_stream(b'1'));
        assert!(matches!(
            result,
            Err(DecodeError::Block {
                index: 1,
                source: FormatError::BlockOverflow { limit: 100_000 }
            })
        ));
        assert!(calls.is_empty());

        // Level 9 allows it; the made up CRCs only draw warnings
        let (result, calls) = collect(&Decoder::default(), &long_run_stream(b'9'));
        assert_eq!(result.unwrap().blocks, 1);
        assert_eq!(calls.len(), 1);
    }

    #[test]
    fn decode_to_vec_test() {
        assert_eq!(decode_to_vec(&ELEVEN_AS).unwrap(), b"aaaaaaaaaaa");
    }
}
