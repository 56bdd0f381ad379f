//! `std::io::Read` adapter over any streaming decompressor.

use crate::inflate::Inflater;
use crate::zlib::ZlibInflater;
use oxiflate_core::traits::{DecompressStatus, Decompressor};
use std::io::{self, BufRead, Read};

/// Reads decompressed data from a compressed [`BufRead`] source.
///
/// A source that ends before the stream does yields
/// [`io::ErrorKind::UnexpectedEof`]; corrupt data yields
/// [`io::ErrorKind::InvalidData`].
///
/// Raw DEFLATE decoding may read up to two bytes past the end of the stream
/// from the source.
#[derive(Debug)]
pub struct DecompressReader<R, D> {
    reader: R,
    decoder: D,
}

/// Reader over raw DEFLATE or DEFLATE64 data.
pub type InflateReader<R> = DecompressReader<R, Inflater>;

/// Reader over zlib data.
pub type ZlibReader<R> = DecompressReader<R, ZlibInflater>;

impl<R: BufRead, D: Decompressor> DecompressReader<R, D> {
    /// Wrap a source with a decoder.
    pub fn new(reader: R, decoder: D) -> Self {
        Self { reader, decoder }
    }

    /// The decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Unwrap into the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead, D: Decompressor> Read for DecompressReader<R, D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.decoder.is_finished() {
            return Ok(0);
        }

        loop {
            let input = self.reader.fill_buf()?;
            let eof = input.is_empty();

            let (consumed, written, status) = self.decoder.decompress(input, buf)?;
            self.reader.consume(consumed);

            if written > 0 || status == DecompressStatus::Done {
                return Ok(written);
            }
            if eof {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "compressed stream ended early",
                ));
            }
        }
    }
}
