//! Test command implementation.

use super::{DecodeOptions, decode_stream};
use oxiflate_core::TrackingWriter;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

pub fn cmd_test(
    input: &Path,
    options: &DecodeOptions,
    expect_crc: Option<u32>,
    expect_size: Option<u64>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input)?;
    let source = BufReader::with_capacity(options.buffer_size.max(1), file);

    println!("Testing {} ({:?})", input.display(), options.format);

    let mut writer = TrackingWriter::new(io::sink());
    let outcome = decode_stream(source, &mut writer, options)
        .map_err(|e| e.to_string())
        .and_then(|_| {
            writer
                .tracker()
                .verify(expect_crc, expect_size)
                .map_err(|e| e.to_string())
        });

    let tracker = writer.tracker();
    if verbose {
        println!("  Decompressed size: {}", tracker.bytes());
        println!("  CRC-32: {:08x}", tracker.crc32());
    }

    match outcome {
        Ok(()) => {
            println!("  OK");
            Ok(())
        }
        Err(e) => {
            println!("  FAILED: {}", e);
            std::process::exit(2);
        }
    }
}
