// png2ppm entry point
//
// Reads a PNG, decodes it with smol-png and writes a PPM (colour) or
// PGM (grey) next to the input, or wherever -o points.
// --chunks lists the chunk layout instead of converting.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use tracing_subscriber::filter::LevelFilter;

use png2ppm::{PnmEncoding, PnmKind, write_pnm};
use smol_png::{DecodeOptions, Miniz, decode_with, parse_with};

#[derive(Debug, Parser)]
#[command(name = "png2ppm", version, about = "Convert a PNG image to PPM / PGM")]
struct Cli {
    /// PNG file to convert
    input: PathBuf,

    /// Output path (default: input with .ppm / .pgm extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write raw P6 / P5 instead of ascii P3 / P2
    #[arg(long)]
    binary: bool,

    /// Reject chunks whose CRC-32 does not match
    #[arg(long)]
    verify_crc: bool,

    /// List chunks and exit
    #[arg(long)]
    chunks: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // log records from smol-png reach the subscriber through its log bridge
    if let Err(e) = tracing_subscriber::fmt()
        .with_max_level(level_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
    {
        eprintln!("png2ppm: logger init failed: {e}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn run(cli: &Cli) -> Result<()> {
    let options = DecodeOptions {
        verify_crc: cli.verify_crc,
        ..DecodeOptions::default()
    };
    let bytes = fs::read(&cli.input).with_context(|| format!("read {:?}", cli.input))?;
    info!("read {} bytes from {:?}", bytes.len(), cli.input);

    if cli.chunks {
        let doc = parse_with(&bytes, &options).with_context(|| format!("parse {:?}", cli.input))?;
        for chunk in doc.chunks() {
            println!(
                "{:>10}  {}  {:>10}  crc {:08X}{}",
                chunk.offset,
                chunk.tag,
                chunk.length,
                chunk.crc,
                if chunk.crc_matches() { "" } else { " (mismatch)" }
            );
        }
        return Ok(());
    }

    let image =
        decode_with(&bytes, &options, &Miniz).with_context(|| format!("decode {:?}", cli.input))?;
    let kind = PnmKind::for_image(&image);
    let encoding = if cli.binary {
        PnmEncoding::Binary
    } else {
        PnmEncoding::Ascii
    };
    let out_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension(kind.extension()));

    let file = File::create(&out_path).with_context(|| format!("create {:?}", out_path))?;
    let mut out = BufWriter::new(file);
    write_pnm(&image, encoding, &mut out).with_context(|| format!("write {:?}", out_path))?;

    info!(
        "wrote {}x{} {} to {:?}",
        image.width,
        image.height,
        kind.magic(encoding),
        out_path
    );
    Ok(())
}
