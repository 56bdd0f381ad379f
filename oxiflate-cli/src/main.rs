//! OxiFlate CLI - streaming DEFLATE, DEFLATE64 and zlib decompression.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{DecodeOptions, cmd_decompress, cmd_test};
use std::path::PathBuf;
use utils::{init_logging, parse_crc};

#[derive(Parser)]
#[command(name = "oxiflate")]
#[command(
    author,
    version,
    about = "Streaming DEFLATE/DEFLATE64/zlib decompressor"
)]
#[command(long_about = "
OxiFlate decompresses raw DEFLATE, DEFLATE64 and zlib streams without
loading them into memory.

Set RUST_LOG=debug (or pass -v) to trace block headers.

Examples:
  oxiflate decompress data.deflate -o data.bin
  oxiflate decompress --deflate64 --size 1048576 member.bin -o out.bin
  oxiflate decompress --format zlib chunk.z > chunk.bin
  oxiflate test --expect-crc 0xCBF43926 --expect-size 9 data.deflate
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompress a stream to a file or stdout
    #[command(alias = "d")]
    Decompress {
        /// Compressed input file
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: DecodeOptions,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Decompress and verify a stream without writing output
    #[command(alias = "t")]
    Test {
        /// Compressed input file
        input: PathBuf,

        #[command(flatten)]
        options: DecodeOptions,

        /// Expected CRC-32 of the decompressed data (hex)
        #[arg(long, value_parser = parse_crc)]
        expect_crc: Option<u32>,

        /// Expected decompressed size in bytes
        #[arg(long)]
        expect_size: Option<u64>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decompress {
            input,
            output,
            options,
            progress,
            verbose,
        } => {
            init_logging(verbose);
            cmd_decompress(&input, output.as_deref(), &options, progress, verbose)
        }
        Commands::Test {
            input,
            options,
            expect_crc,
            expect_size,
            verbose,
        } => {
            init_logging(verbose);
            cmd_test(&input, &options, expect_crc, expect_size, verbose)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
