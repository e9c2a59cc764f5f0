//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

use bzip2_decoder::{
    tools::cli::{output_name, BzOpts, Mode, Output},
    Decoder, WriteSink,
};
use clap::Parser;
use log::{error, info, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<(), std::io::Error> {
    let options = BzOpts::parse();

    // Log to stderr so that -c output stays clean
    if TermLogger::init(
        options.verbosity().level_filter(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("Logger was already initialized.");
    }

    let decoder = Decoder::new(options.decode_options());
    let mut failures = 0;
    for file in &options.files {
        if let Err(e) = unzip_file(&options, &decoder, file) {
            error!("{}: {}", file.display(), e);
            failures += 1;
        }
    }

    info!("Done.\n");
    if failures > 0 {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} of {} files failed", failures, options.files.len()),
        ));
    }
    Ok(())
}

/// Decompress (or test) one file according to the command line options.
fn unzip_file(opts: &BzOpts, decoder: &Decoder, file: &Path) -> io::Result<()> {
    let input = fs::read(file)?;
    info!("Read {} bytes from {}.", input.len(), file.display());

    let summary = match (opts.op_mode(), opts.output()) {
        (Mode::Test, _) => decoder.decode(&input, &mut WriteSink::new(io::sink()))?,
        (Mode::Unzip, Output::Stdout) => {
            let stdout = io::stdout();
            let mut sink = WriteSink::new(BufWriter::new(stdout.lock()));
            let summary = decoder.decode(&input, &mut sink)?;
            sink.into_inner().flush()?;
            summary
        }
        (Mode::Unzip, Output::File) => {
            let out_name = output_name(file);
            if out_name.exists() && !opts.force {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} already exists, use -f to overwrite", out_name.display()),
                ));
            }
            let mut sink = WriteSink::new(BufWriter::new(File::create(&out_name)?));
            let summary = match decoder.decode(&input, &mut sink) {
                Ok(summary) => summary,
                Err(e) => {
                    // Don't leave a partial file behind
                    drop(sink);
                    if let Err(rm) = fs::remove_file(&out_name) {
                        warn!("Could not remove {}: {}", out_name.display(), rm);
                    }
                    return Err(e.into());
                }
            };
            sink.into_inner().flush()?;
            info!("Wrote {}.", out_name.display());
            summary
        }
    };

    info!(
        "{}: {} blocks, {} bytes (block size {}00k).",
        file.display(),
        summary.blocks,
        summary.bytes,
        summary.block_size
    );

    if opts.op_mode() == Mode::Unzip && opts.output() == Output::File && !opts.keep {
        fs::remove_file(file)?;
        info!("Removed {}.", file.display());
    }
    Ok(())
}
