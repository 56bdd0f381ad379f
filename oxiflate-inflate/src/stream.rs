//! Pull-style view over the inflater.
//!
//! [`InflateStream`] keeps the current input chunk itself, so a caller hands
//! over input once with [`InflateStream::set_input`] and then repeatedly
//! asks for output until [`InflateStream::needs_input`] says the chunk is
//! used up. Exactly one chunk is in flight at a time.

use crate::inflate::Inflater;
use oxiflate_core::error::{OxiflateError, Result};

/// A DEFLATE/DEFLATE64 decoder holding a borrowed input chunk.
///
/// # Example
///
/// ```
/// use oxiflate_inflate::InflateStream;
///
/// let data = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
/// let mut stream = InflateStream::new(false, None);
/// stream.set_input(&data).unwrap();
///
/// let mut out = Vec::new();
/// let mut buf = [0u8; 2];
/// while !stream.finished() {
///     let n = stream.inflate(&mut buf).unwrap();
///     out.extend_from_slice(&buf[..n]);
/// }
/// assert_eq!(out, b"Hello");
/// ```
#[derive(Debug)]
pub struct InflateStream<'a> {
    inflater: Inflater,
    input: &'a [u8],
}

impl<'a> InflateStream<'a> {
    /// Create a decoder.
    ///
    /// `declared_size`, when known, caps the output: decoding stops once
    /// that many bytes were produced.
    pub fn new(use_deflate64: bool, declared_size: Option<u64>) -> Self {
        Self {
            inflater: Inflater::with_options(use_deflate64, declared_size),
            input: &[],
        }
    }

    /// Hand over the next chunk of compressed input.
    ///
    /// Fails with [`OxiflateError::InputNotConsumed`] while the previous
    /// chunk still has unread bytes.
    pub fn set_input(&mut self, input: &'a [u8]) -> Result<()> {
        if !self.input.is_empty() {
            return Err(OxiflateError::input_not_consumed(self.input.len()));
        }
        self.input = input;
        Ok(())
    }

    /// Decode into `output`, returning the number of bytes written.
    ///
    /// Zero bytes with [`needs_input`](Self::needs_input) true means the
    /// decoder is waiting for more compressed data.
    pub fn inflate(&mut self, output: &mut [u8]) -> Result<usize> {
        let result = self.inflater.inflate(self.input, output)?;
        self.input = &self.input[result.bytes_consumed..];
        Ok(result.bytes_written)
    }

    /// True once the stream is complete and every byte has been returned.
    pub fn finished(&self) -> bool {
        self.inflater.finished()
    }

    /// True when the current chunk is fully consumed.
    pub fn needs_input(&self) -> bool {
        self.input.is_empty()
    }

    /// Decoded bytes waiting to be collected.
    pub fn available_output(&self) -> usize {
        self.inflater.available_output()
    }

    /// Total bytes returned so far.
    pub fn total_out(&self) -> u64 {
        self.inflater.total_out()
    }

    /// Unread part of the current chunk.
    pub fn remaining_input(&self) -> &'a [u8] {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: [u8; 10] = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];

    #[test]
    fn test_set_input_while_unread() {
        let mut stream = InflateStream::new(false, None);
        stream.set_input(&HELLO).unwrap();

        let err = stream.set_input(&HELLO).unwrap_err();
        assert!(matches!(err, OxiflateError::InputNotConsumed { remaining: 10 }));
    }

    #[test]
    fn test_chunked_input() {
        let mut stream = InflateStream::new(false, None);
        let mut out = Vec::new();
        let mut buf = [0u8; 3];

        for chunk in HELLO.chunks(3) {
            stream.set_input(chunk).unwrap();
            while !stream.needs_input() || stream.available_output() > 0 {
                let n = stream.inflate(&mut buf).unwrap();
                out.extend_from_slice(&buf[..n]);
                if n == 0 {
                    break;
                }
            }
        }

        assert_eq!(out, b"Hello");
        assert!(stream.finished());
        assert_eq!(stream.total_out(), 5);
    }

    #[test]
    fn test_declared_size() {
        let mut stream = InflateStream::new(false, Some(2));
        stream.set_input(&HELLO).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(stream.inflate(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"He");
        assert!(stream.finished());
    }

    #[test]
    fn test_needs_input_when_idle() {
        let mut stream = InflateStream::new(true, None);
        assert!(stream.needs_input());
        let mut buf = [0u8; 8];
        assert_eq!(stream.inflate(&mut buf).unwrap(), 0);
        assert!(!stream.finished());
        assert!(stream.remaining_input().is_empty());
    }
}
