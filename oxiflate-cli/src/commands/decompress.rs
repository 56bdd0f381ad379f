//! Decompress command implementation.

use super::{DecodeOptions, decode_stream};
use crate::utils::{create_progress_bar, format_size};
use oxiflate_core::TrackingWriter;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

pub fn cmd_decompress(
    input: &Path,
    output: Option<&Path>,
    options: &DecodeOptions,
    progress: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input)?;
    let compressed_size = file.metadata()?.len();

    // Progress follows compressed bytes read; the output size is unknown.
    let pb = create_progress_bar(compressed_size, progress);
    let source = BufReader::with_capacity(options.buffer_size.max(1), pb.wrap_read(file));

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = TrackingWriter::new(sink);

    let result = decode_stream(source, &mut writer, options);
    pb.finish_and_clear();
    result?;
    writer.flush()?;

    let tracker = writer.tracker();
    if verbose || output.is_some() {
        eprintln!(
            "{}: {} -> {} (CRC-32 {:08x})",
            input.display(),
            format_size(compressed_size),
            format_size(tracker.bytes()),
            tracker.crc32()
        );
    }

    Ok(())
}
