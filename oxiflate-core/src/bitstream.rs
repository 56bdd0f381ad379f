//! Bit-level input for resumable DEFLATE decoding.
//!
//! [`InputBuffer`] wraps a borrowed chunk of compressed bytes and hands out
//! bits LSB-first, the order DEFLATE packs them. It never blocks and never
//! fails when the chunk runs dry: requests that cannot be satisfied return
//! `false`/`None` so the decoder can suspend and try again once the caller
//! supplies more input.
//!
//! The bit accumulator lives in a separate [`BitsBuffer`] owned by the
//! decoder. An `InputBuffer` is built around it for the duration of one call
//! and taken apart again with [`InputBuffer::into_bits`], so bits that were
//! pulled out of one chunk but not yet consumed carry over to the next.
//!
//! # Example
//!
//! ```
//! use oxiflate_core::bitstream::{BitsBuffer, InputBuffer};
//!
//! let data = [0b1010_1101u8, 0xFF];
//! let mut input = InputBuffer::new(BitsBuffer::new(), &data);
//!
//! assert_eq!(input.get_bits(3), Some(0b101));
//! assert_eq!(input.get_bits(5), Some(0b10101));
//! assert_eq!(input.get_bits(16), None); // only 8 bits left
//! assert_eq!(input.get_bits(8), Some(0xFF));
//! assert!(input.needs_input());
//! ```

use crate::error::{OxiflateError, Result};

/// Bits pulled from the input that have not been consumed yet.
///
/// Holds at most 23 bits at any time; the decoder never asks for more than
/// 16 bits in one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitsBuffer {
    /// Accumulated bits (LSB-first).
    bit_buffer: u32,
    /// Number of valid bits in `bit_buffer`.
    bits_in_buffer: u32,
}

impl BitsBuffer {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered bits.
    pub fn len(&self) -> u32 {
        self.bits_in_buffer
    }

    /// Check if no bits are buffered.
    pub fn is_empty(&self) -> bool {
        self.bits_in_buffer == 0
    }
}

/// A bit reader over a borrowed input chunk.
#[derive(Debug)]
pub struct InputBuffer<'a> {
    bits: BitsBuffer,
    /// Current input chunk.
    data: &'a [u8],
    /// Bytes of `data` already moved into the accumulator or copied out.
    position: usize,
}

impl<'a> InputBuffer<'a> {
    /// Build an input buffer from carried-over bits and a new chunk.
    pub fn new(bits: BitsBuffer, data: &'a [u8]) -> Self {
        Self {
            bits,
            data,
            position: 0,
        }
    }

    /// Install a new input chunk.
    ///
    /// Only one chunk may be in flight: this fails if the current chunk
    /// still has unread bytes. Buffered bits are kept.
    pub fn set_input(&mut self, data: &'a [u8]) -> Result<()> {
        if !self.needs_input() {
            return Err(OxiflateError::input_not_consumed(
                self.data.len() - self.position,
            ));
        }
        self.data = data;
        self.position = 0;
        Ok(())
    }

    /// True when every byte of the current chunk has been taken.
    ///
    /// Bits still sitting in the accumulator do not count.
    #[inline]
    pub fn needs_input(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Number of bits currently in the accumulator.
    #[inline]
    pub fn available_bits(&self) -> u32 {
        self.bits.bits_in_buffer
    }

    /// Whole bytes available: unread chunk bytes plus full bytes in the accumulator.
    pub fn available_bytes(&self) -> usize {
        (self.data.len() - self.position) + (self.bits.bits_in_buffer / 8) as usize
    }

    /// Bytes taken from the current chunk so far.
    pub fn bytes_consumed(&self) -> usize {
        self.position
    }

    /// Take the accumulator back, dropping the chunk borrow.
    pub fn into_bits(self) -> BitsBuffer {
        self.bits
    }

    #[inline]
    fn load_byte(&mut self) {
        self.bits.bit_buffer |= (self.data[self.position] as u32) << self.bits.bits_in_buffer;
        self.position += 1;
        self.bits.bits_in_buffer += 8;
    }

    /// Make sure at least `count` bits (at most 16) are in the accumulator.
    ///
    /// Returns `false` if the chunk ran out first. Bytes that were loaded
    /// stay loaded.
    pub fn ensure_bits_available(&mut self, count: u32) -> bool {
        debug_assert!(count <= 16, "Cannot ensure more than 16 bits at once");

        while self.bits.bits_in_buffer < count {
            if self.needs_input() {
                return false;
            }
            self.load_byte();
        }
        true
    }

    /// Top the accumulator up towards 16 bits without failing and return it.
    ///
    /// The caller checks [`available_bits`](Self::available_bits) to know how
    /// many of the returned bits are real.
    #[inline]
    pub fn try_load_16_bits(&mut self) -> u32 {
        while self.bits.bits_in_buffer < 16 && !self.needs_input() {
            self.load_byte();
        }
        self.bits.bit_buffer
    }

    /// Consume and return `count` bits (at most 16), or `None` if they are
    /// not available yet.
    #[inline]
    pub fn get_bits(&mut self, count: u32) -> Option<u32> {
        if !self.ensure_bits_available(count) {
            return None;
        }

        let result = self.bits.bit_buffer & ((1u32 << count) - 1);
        self.bits.bit_buffer >>= count;
        self.bits.bits_in_buffer -= count;
        Some(result)
    }

    /// Discard `count` bits that are already in the accumulator.
    #[inline]
    pub fn skip_bits(&mut self, count: u32) {
        debug_assert!(
            self.bits.bits_in_buffer >= count,
            "Skipping bits that were never loaded"
        );
        self.bits.bit_buffer >>= count;
        self.bits.bits_in_buffer -= count;
    }

    /// Drop the partial byte at the front of the accumulator.
    pub fn skip_to_byte_boundary(&mut self) {
        let remainder = self.bits.bits_in_buffer % 8;
        self.bits.bit_buffer >>= remainder;
        self.bits.bits_in_buffer -= remainder;
    }

    /// Copy whole bytes into `dst`: first from the accumulator, then straight
    /// from the chunk. Must be byte-aligned. Returns the number copied.
    pub fn copy_to(&mut self, dst: &mut [u8]) -> usize {
        debug_assert!(
            self.bits.bits_in_buffer % 8 == 0,
            "copy_to requires a byte-aligned accumulator"
        );

        let mut copied = 0;
        while self.bits.bits_in_buffer > 0 && copied < dst.len() {
            dst[copied] = self.bits.bit_buffer as u8;
            self.bits.bit_buffer >>= 8;
            self.bits.bits_in_buffer -= 8;
            copied += 1;
        }

        let direct = (dst.len() - copied).min(self.data.len() - self.position);
        dst[copied..copied + direct]
            .copy_from_slice(&self.data[self.position..self.position + direct]);
        self.position += direct;

        copied + direct
    }
}
