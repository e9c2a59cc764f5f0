use std::path::{Path, PathBuf};

use clap::Parser;
use log::LevelFilter;

use crate::compression::options::{ChecksumPolicy, DecodeOptions};

/// Verbosity of user information
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Errors,
    Warnings,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Off,
            Verbosity::Errors => LevelFilter::Error,
            Verbosity::Warnings => LevelFilter::Warn,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Trace => LevelFilter::Trace,
        }
    }
}

/// Decompress, or Test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Unzip,
    Test,
}

/// Define the two output channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    File,
    Stdout,
}

/// bunzip2, a block-sorting file decompressor.
#[derive(Parser, Debug)]
#[clap(name = "bunzip2", version, about)]
pub struct BzOpts {
    /// Files to decompress
    #[clap(parse(from_os_str), required = true)]
    pub files: Vec<PathBuf>,

    /// Output to standard out
    #[clap(short = 'c', long)]
    pub stdout: bool,

    /// Don't remove input files after processing
    #[clap(short, long)]
    pub keep: bool,

    /// Silently overwrite existing files with the same name
    #[clap(short, long)]
    pub force: bool,

    /// Test compressed file integrity, writing nothing
    #[clap(short, long)]
    pub test: bool,

    /// Be more verbose (repeat for more: -vvvv)
    #[clap(short, long, parse(from_occurrences))]
    pub verbose: u64,

    /// Suppress all messages
    #[clap(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Fail on CRC mismatches instead of warning
    #[clap(long)]
    pub strict_crc: bool,

    /// Don't compute CRCs (wins over --strict-crc)
    #[clap(long)]
    pub no_crc: bool,

    /// Finish several blocks at once on all cores
    #[clap(short, long)]
    pub parallel: bool,
}

impl BzOpts {
    /// Decompress or just test.
    pub fn op_mode(&self) -> Mode {
        if self.test {
            Mode::Test
        } else {
            Mode::Unzip
        }
    }

    /// Where decompressed data goes.
    pub fn output(&self) -> Output {
        if self.stdout {
            Output::Stdout
        } else {
            Output::File
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            return Verbosity::Quiet;
        }
        match self.verbose {
            0 => Verbosity::Errors,
            1 => Verbosity::Warnings,
            2 => Verbosity::Info,
            3 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }

    pub fn decode_options(&self) -> DecodeOptions {
        let policy = if self.no_crc {
            ChecksumPolicy::Ignore
        } else if self.strict_crc {
            ChecksumPolicy::Strict
        } else {
            ChecksumPolicy::Warn
        };
        DecodeOptions::new().checksums(policy).parallel(self.parallel)
    }
}

/// Name of the decompressed file: strip a .bz2/.bz suffix, map .tbz/.tbz2 to .tar, and
/// otherwise append .out.
pub fn output_name(input: &Path) -> PathBuf {
    let name = input.to_string_lossy();
    for (suffix, replacement) in [(".bz2", ""), (".bz", ""), (".tbz2", ".tar"), (".tbz", ".tar")] {
        if let Some(stem) = name.strip_suffix(suffix) {
            if !stem.is_empty() {
                return PathBuf::from(format!("{}{}", stem, replacement));
            }
        }
    }
    PathBuf::from(format!("{}.out", name))
}
