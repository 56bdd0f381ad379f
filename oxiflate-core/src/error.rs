//! Error types for OxiFlate operations.
//!
//! Decoding failures fall into two groups. Corrupt or adversarial input
//! (bad block type, broken Huffman tables, impossible back-references) is
//! terminal for the stream and reported through [`OxiflateError::is_invalid_data`].
//! Everything else (I/O, truncated input, API misuse) is reported separately
//! so callers can tell "reject this stream" apart from "feed me more".
//!
//! Running out of input in the middle of a streaming call is never an error;
//! the engines signal it through their return values.

use std::io;
use thiserror::Error;

/// The main error type for OxiFlate operations.
#[derive(Debug, Error)]
pub enum OxiflateError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Block header carried the reserved block type.
    #[error("Invalid block type: {block_type}")]
    InvalidBlockType {
        /// The two-bit block type read from the stream.
        block_type: u32,
    },

    /// Stored block LEN does not match the one's complement of NLEN.
    #[error("Stored block length mismatch: LEN={length:#06x}, NLEN={complement:#06x}")]
    StoredLengthMismatch {
        /// The LEN field.
        length: u16,
        /// The NLEN field.
        complement: u16,
    },

    /// A code-length table does not describe a usable prefix code.
    #[error("Invalid Huffman table: {message}")]
    InvalidHuffmanTable {
        /// What is wrong with the table.
        message: String,
    },

    /// The bitstream contained a code with no symbol assigned to it.
    #[error("Invalid Huffman code")]
    InvalidHuffmanCode,

    /// A run-length repeat extends past the declared number of code lengths.
    #[error("Code length repeat overflows table: {needed} entries needed, {available} declared")]
    CodeLengthOverflow {
        /// Index the repeat would reach.
        needed: usize,
        /// Declared table size.
        available: usize,
    },

    /// Dynamic literal/length table has no code for the end-of-block symbol.
    #[error("Literal/length table has no end-of-block code")]
    MissingEndOfBlock,

    /// Literal/length symbol outside the length-code range.
    #[error("Invalid length code: {code}")]
    InvalidLengthCode {
        /// The literal/length symbol.
        code: u16,
    },

    /// Distance symbol outside the distance-code range.
    #[error("Invalid distance code: {code}")]
    InvalidDistanceCode {
        /// The distance symbol.
        code: u16,
    },

    /// Back-reference reaching before the start of the produced history.
    #[error("Invalid back-reference distance: {distance} exceeds history size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Bytes of history available.
        history_size: usize,
    },

    /// The decoder reached a state it cannot handle in the current block.
    #[error("Unknown decoder state: {state}")]
    UnknownState {
        /// Name of the state.
        state: String,
    },

    /// The decoder already failed on this stream and produces no more output.
    #[error("Decoder previously failed on corrupt data")]
    DecoderFailed,

    /// Invalid framing header (zlib).
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Checksum mismatch between trailer/metadata and decoded data.
    #[error("Checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Expected value.
        expected: u32,
        /// Value computed from the data.
        computed: u32,
    },

    /// The stream was compressed against a preset dictionary that was not supplied
    /// or does not match.
    #[error("Preset dictionary required: id {dict_id:#010x}")]
    DictionaryRequired {
        /// Adler-32 of the dictionary the stream expects.
        dict_id: u32,
    },

    /// Input ended before the stream was complete.
    #[error("Unexpected end of input: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes known to be missing (at least 1).
        expected: usize,
    },

    /// New input was supplied while the previous input was still unread.
    #[error("Previous input not consumed: {remaining} bytes left")]
    InputNotConsumed {
        /// Unread bytes of the previous input.
        remaining: usize,
    },
}

/// Result type alias for OxiFlate operations.
pub type Result<T> = std::result::Result<T, OxiflateError>;

impl OxiflateError {
    /// Create an invalid block type error.
    pub fn invalid_block_type(block_type: u32) -> Self {
        Self::InvalidBlockType { block_type }
    }

    /// Create a stored length mismatch error.
    pub fn stored_length_mismatch(length: u16, complement: u16) -> Self {
        Self::StoredLengthMismatch { length, complement }
    }

    /// Create an invalid Huffman table error.
    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidHuffmanTable {
            message: message.into(),
        }
    }

    /// Create a code length overflow error.
    pub fn code_length_overflow(needed: usize, available: usize) -> Self {
        Self::CodeLengthOverflow { needed, available }
    }

    /// Create an invalid length code error.
    pub fn invalid_length_code(code: u16) -> Self {
        Self::InvalidLengthCode { code }
    }

    /// Create an invalid distance code error.
    pub fn invalid_distance_code(code: u16) -> Self {
        Self::InvalidDistanceCode { code }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create an unknown state error.
    pub fn unknown_state(state: impl Into<String>) -> Self {
        Self::UnknownState {
            state: state.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(expected: u32, computed: u32) -> Self {
        Self::ChecksumMismatch { expected, computed }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Create an input-not-consumed error.
    pub fn input_not_consumed(remaining: usize) -> Self {
        Self::InputNotConsumed { remaining }
    }

    /// Whether this error means the compressed data itself is malformed.
    ///
    /// These errors are terminal: the decoder that raised them will not
    /// produce further output for the stream.
    pub fn is_invalid_data(&self) -> bool {
        matches!(
            self,
            Self::InvalidBlockType { .. }
                | Self::StoredLengthMismatch { .. }
                | Self::InvalidHuffmanTable { .. }
                | Self::InvalidHuffmanCode
                | Self::CodeLengthOverflow { .. }
                | Self::MissingEndOfBlock
                | Self::InvalidLengthCode { .. }
                | Self::InvalidDistanceCode { .. }
                | Self::InvalidDistance { .. }
                | Self::UnknownState { .. }
                | Self::DecoderFailed
                | Self::InvalidHeader { .. }
                | Self::ChecksumMismatch { .. }
                | Self::DictionaryRequired { .. }
        )
    }
}

impl From<OxiflateError> for io::Error {
    fn from(err: OxiflateError) -> Self {
        match err {
            OxiflateError::Io(e) => e,
            OxiflateError::UnexpectedEof { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            OxiflateError::InputNotConsumed { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OxiflateError::invalid_block_type(3);
        assert!(err.to_string().contains("Invalid block type: 3"));

        let err = OxiflateError::stored_length_mismatch(5, 0x1234);
        assert!(err.to_string().contains("LEN=0x0005"));

        let err = OxiflateError::checksum_mismatch(0x12345678, 0xDEADBEEF);
        assert!(err.to_string().contains("0x12345678"));
    }

    #[test]
    fn test_invalid_data_category() {
        assert!(OxiflateError::invalid_block_type(3).is_invalid_data());
        assert!(OxiflateError::code_length_overflow(300, 290).is_invalid_data());
        assert!(OxiflateError::DecoderFailed.is_invalid_data());
        assert!(!OxiflateError::unexpected_eof(1).is_invalid_data());
        assert!(!OxiflateError::input_not_consumed(4).is_invalid_data());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: OxiflateError = io_err.into();
        assert!(matches!(err, OxiflateError::Io(_)));

        let back: io::Error = OxiflateError::MissingEndOfBlock.into();
        assert_eq!(back.kind(), io::ErrorKind::InvalidData);

        let back: io::Error = OxiflateError::unexpected_eof(2).into();
        assert_eq!(back.kind(), io::ErrorKind::UnexpectedEof);

        let back: io::Error = OxiflateError::input_not_consumed(2).into();
        assert_eq!(back.kind(), io::ErrorKind::InvalidInput);
    }
}
