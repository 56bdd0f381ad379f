//! Sliding output window for LZ77 back-references.
//!
//! [`OutputWindow`] is a circular buffer that serves two purposes at once:
//! it is the history that back-references copy from, and it is the staging
//! area for decoded bytes the caller has not collected yet. Bytes leave the
//! unread region when drained with [`OutputWindow::copy_to`] but remain in the
//! buffer as history until overwritten.
//!
//! The capacity is fixed at [`WINDOW_SIZE`] (128 KiB), enough for DEFLATE64's
//! 64 KiB distances plus a maximal 64 KiB match still waiting to be drained.
//! The decoder is responsible for flow control: it must not write more than
//! [`OutputWindow::free_bytes`] before the caller drains.

use crate::bitstream::InputBuffer;
use crate::error::{OxiflateError, Result};

/// Window capacity in bytes (power of two).
pub const WINDOW_SIZE: usize = 1 << 17;

/// Mask for wrapping positions.
const WINDOW_MASK: usize = WINDOW_SIZE - 1;

/// Circular output buffer with back-reference support.
#[derive(Debug, Clone)]
pub struct OutputWindow {
    /// The underlying buffer.
    window: Vec<u8>,
    /// Next write position.
    end: usize,
    /// Bytes written but not yet drained.
    bytes_used: usize,
    /// Bytes that back-references may reach (saturates at capacity).
    history: usize,
}

impl OutputWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self {
            window: vec![0; WINDOW_SIZE],
            end: 0,
            bytes_used: 0,
            history: 0,
        }
    }

    /// Free space before unread bytes would be overwritten.
    #[inline]
    pub fn free_bytes(&self) -> usize {
        WINDOW_SIZE - self.bytes_used
    }

    /// Bytes written but not yet drained.
    #[inline]
    pub fn available_bytes(&self) -> usize {
        self.bytes_used
    }

    /// Bytes of history a back-reference may reach.
    pub fn history_len(&self) -> usize {
        self.history
    }

    /// Forget all unread bytes (history is kept).
    pub fn clear_bytes_used(&mut self) {
        self.bytes_used = 0;
    }

    /// Reset to an empty window.
    pub fn reset(&mut self) {
        self.end = 0;
        self.bytes_used = 0;
        self.history = 0;
        self.window.fill(0);
    }

    #[inline]
    fn grow_history(&mut self, count: usize) {
        self.history = (self.history + count).min(WINDOW_SIZE);
    }

    /// Append a literal byte.
    #[inline]
    pub fn write(&mut self, byte: u8) {
        debug_assert!(self.bytes_used < WINDOW_SIZE, "Window overflow");
        self.window[self.end] = byte;
        self.end = (self.end + 1) & WINDOW_MASK;
        self.bytes_used += 1;
        self.grow_history(1);
    }

    /// Replay `length` bytes starting `distance` bytes back.
    ///
    /// When `distance < length` the source overlaps the bytes being written
    /// and the copy runs forward one byte at a time, so a short pattern
    /// repeats.
    pub fn write_length_distance(&mut self, length: usize, distance: usize) -> Result<()> {
        if distance == 0 || distance > self.history {
            return Err(OxiflateError::invalid_distance(distance, self.history));
        }
        debug_assert!(length <= self.free_bytes(), "Window overflow");

        let mut src = (self.end + WINDOW_SIZE - distance) & WINDOW_MASK;
        let border = WINDOW_SIZE - length;

        if src <= border && self.end < border {
            if length <= distance {
                self.window.copy_within(src..src + length, self.end);
                self.end += length;
            } else {
                for _ in 0..length {
                    self.window[self.end] = self.window[src];
                    self.end += 1;
                    src += 1;
                }
            }
        } else {
            for _ in 0..length {
                self.window[self.end] = self.window[src];
                self.end = (self.end + 1) & WINDOW_MASK;
                src = (src + 1) & WINDOW_MASK;
            }
        }

        self.bytes_used += length;
        self.grow_history(length);
        Ok(())
    }

    /// Copy up to `length` raw bytes from the input (stored blocks).
    ///
    /// Bounded by free space and by the bytes the input currently holds.
    /// Returns how many bytes were transferred.
    pub fn copy_from(&mut self, input: &mut InputBuffer<'_>, length: usize) -> usize {
        let length = length.min(self.free_bytes()).min(input.available_bytes());
        let tail_len = WINDOW_SIZE - self.end;

        let copied = if length > tail_len {
            let mut copied = input.copy_to(&mut self.window[self.end..]);
            if copied == tail_len {
                copied += input.copy_to(&mut self.window[..length - tail_len]);
            }
            copied
        } else {
            input.copy_to(&mut self.window[self.end..self.end + length])
        };

        self.end = (self.end + copied) & WINDOW_MASK;
        self.bytes_used += copied;
        self.grow_history(copied);
        copied
    }

    /// Drain unread bytes, oldest first, into `output`.
    ///
    /// Returns the number of bytes copied.
    pub fn copy_to(&mut self, output: &mut [u8]) -> usize {
        let count = output.len().min(self.bytes_used);
        if count == 0 {
            return 0;
        }

        let start = (self.end + WINDOW_SIZE - self.bytes_used) & WINDOW_MASK;
        let first = count.min(WINDOW_SIZE - start);
        output[..first].copy_from_slice(&self.window[start..start + first]);
        if first < count {
            output[first..count].copy_from_slice(&self.window[..count - first]);
        }

        self.bytes_used -= count;
        count
    }

    /// Preload history with dictionary data.
    ///
    /// The dictionary becomes reachable by back-references but is not
    /// output. Only the last [`WINDOW_SIZE`] bytes are kept.
    pub fn preload_dictionary(&mut self, dictionary: &[u8]) {
        let dict = if dictionary.len() > WINDOW_SIZE {
            &dictionary[dictionary.len() - WINDOW_SIZE..]
        } else {
            dictionary
        };

        for &byte in dict {
            self.window[self.end] = byte;
            self.end = (self.end + 1) & WINDOW_MASK;
        }
        self.grow_history(dict.len());
    }
}

impl Default for OutputWindow {
    fn default() -> Self {
        Self::new()
    }
}
