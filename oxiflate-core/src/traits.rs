//! Core traits for streaming decompression.

use crate::error::{OxiflateError, Result};

/// Status of a streaming decompression operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressStatus {
    /// All input was used up; call again with more.
    NeedsInput,
    /// The output buffer is full; call again with more room.
    NeedsOutput,
    /// The stream is complete and all output has been returned.
    Done,
}

/// A streaming decompressor (decoder).
///
/// Implementations never block: each call works with whatever input it is
/// given and reports how far it got.
pub trait Decompressor {
    /// Decompress data from input to output.
    ///
    /// # Arguments
    ///
    /// * `input` - Compressed data not yet seen by the decoder
    /// * `output` - Output buffer for decompressed data
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)>;

    /// Reset the decompressor to its initial state.
    fn reset(&mut self);

    /// Check if the decompressor has finished.
    fn is_finished(&self) -> bool;

    /// Decompress a complete stream held in memory.
    ///
    /// Fails with [`OxiflateError::UnexpectedEof`] if the input ends before
    /// the stream does.
    fn decompress_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut input_pos = 0;
        let mut buffer = vec![0u8; 32768];

        loop {
            let (consumed, produced, status) = self.decompress(&input[input_pos..], &mut buffer)?;

            input_pos += consumed;
            output.extend_from_slice(&buffer[..produced]);

            match status {
                DecompressStatus::Done => break,
                DecompressStatus::NeedsInput if input_pos >= input.len() => {
                    return Err(OxiflateError::unexpected_eof(1));
                }
                DecompressStatus::NeedsOutput | DecompressStatus::NeedsInput => continue,
            }
        }

        Ok(output)
    }
}
