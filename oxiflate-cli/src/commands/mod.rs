//! Command implementations for OxiFlate CLI.

pub mod decompress;
pub mod test;

pub use decompress::cmd_decompress;
pub use test::cmd_test;

use clap::{Args, ValueEnum};
use oxiflate_inflate::{DecompressReader, Inflater, ZlibInflater};
use std::io::{self, BufRead, Read, Write};

/// Framing of the compressed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum StreamFormat {
    /// Raw DEFLATE (or DEFLATE64) bitstream
    #[default]
    Raw,
    /// Zlib header and Adler-32 trailer around DEFLATE
    Zlib,
}

/// Decoder settings shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct DecodeOptions {
    /// Stream framing
    #[arg(short, long, value_enum, default_value = "raw")]
    pub format: StreamFormat,

    /// Decode DEFLATE64 (raw format only)
    #[arg(long)]
    pub deflate64: bool,

    /// Declared uncompressed size; decoding stops after this many bytes
    #[arg(long)]
    pub size: Option<u64>,

    /// Output buffer size in bytes
    #[arg(long, default_value_t = 65536)]
    pub buffer_size: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            format: StreamFormat::Raw,
            deflate64: false,
            size: None,
            buffer_size: 65536,
        }
    }
}

/// Decode everything from `source` into `sink`. Returns the output size.
pub fn decode_stream<R: BufRead, W: Write>(
    source: R,
    sink: &mut W,
    options: &DecodeOptions,
) -> io::Result<u64> {
    match options.format {
        StreamFormat::Raw => {
            let inflater = Inflater::with_options(options.deflate64, options.size);
            pump(DecompressReader::new(source, inflater), sink, options.buffer_size)
        }
        StreamFormat::Zlib => {
            if options.deflate64 || options.size.is_some() {
                log::warn!("--deflate64 and --size apply to raw streams only; ignored");
            }
            pump(
                DecompressReader::new(source, ZlibInflater::new()),
                sink,
                options.buffer_size,
            )
        }
    }
}

fn pump<R: Read, W: Write>(mut reader: R, sink: &mut W, buffer_size: usize) -> io::Result<u64> {
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        sink.write_all(&buffer[..n])?;
        total += n as u64;
    }

    Ok(total)
}
