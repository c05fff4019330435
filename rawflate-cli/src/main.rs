//! rawflate CLI - raw DEFLATE streams from the command line
//!
//! Compresses files into raw RFC 1951 streams (no gzip/zlib framing),
//! decompresses them, verifies them and reports their block structure.

mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use commands::{cmd_compress, cmd_decompress, cmd_info, cmd_test};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rawflate")]
#[command(author, version, about = "Raw DEFLATE (RFC 1951) compressor and decompressor")]
#[command(long_about = "
rawflate reads and writes raw DEFLATE streams as defined by RFC 1951.
No container header or checksum is added or expected.

Examples:
  rawflate compress notes.txt
  rawflate compress notes.txt -l 9 -o notes.bin
  rawflate decompress notes.txt.deflate
  rawflate decompress untrusted.deflate --limit 10000000
  rawflate test notes.txt.deflate
  rawflate info notes.txt.deflate --json
")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a raw DEFLATE stream
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (defaults to <input>.deflate)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression level (0 = store only, 9 = best)
        #[arg(short, long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..=9))]
        level: u8,
    },

    /// Decompress a raw DEFLATE stream
    #[command(alias = "d")]
    Decompress {
        /// Stream to decompress
        input: PathBuf,

        /// Output file (defaults to <input> without .deflate)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Refuse to produce more than this many bytes
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Decode a stream and report whether it is intact
    #[command(alias = "t")]
    Test {
        /// Stream to test
        input: PathBuf,
    },

    /// Show the block structure of a stream
    #[command(alias = "i")]
    Info {
        /// Stream to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            level,
        } => cmd_compress(&input, output.as_deref(), level),
        Commands::Decompress {
            input,
            output,
            limit,
        } => cmd_decompress(&input, output.as_deref(), limit),
        Commands::Test { input } => cmd_test(&input),
        Commands::Info { input, json } => cmd_info(&input, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
