//! # OxiFlate Inflate
//!
//! Pure Rust streaming decompression of DEFLATE (RFC 1951), DEFLATE64 and
//! zlib (RFC 1950) data.
//!
//! The decoder never blocks and never needs the whole stream in memory:
//! compressed input is fed in chunks of any size, decompressed output is
//! collected into buffers of any size, and decoding resumes exactly where
//! it stopped.
//!
//! ## Features
//!
//! - All DEFLATE block types
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - DEFLATE64: 64 KiB window, 16-bit match lengths
//! - Declared-size governor for container formats that record the
//!   uncompressed size
//! - Zlib framing with Adler-32 verification and preset dictionaries
//! - `std::io::Read` adapter
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_inflate::{Inflater, inflate};
//!
//! // Fixed Huffman block holding "aCaB".
//! let compressed = b"KtNt\x02\x00";
//! assert_eq!(inflate(compressed).unwrap(), b"aCaB");
//!
//! // The same, a byte at a time in both directions.
//! let mut inflater = Inflater::new();
//! let mut output = Vec::new();
//! let mut pos = 0;
//! while !inflater.finished() {
//!     let mut byte = [0u8; 1];
//!     let end = (pos + 1).min(compressed.len());
//!     let result = inflater.inflate(&compressed[pos..end], &mut byte).unwrap();
//!     pos += result.bytes_consumed;
//!     output.extend_from_slice(&byte[..result.bytes_written]);
//! }
//! assert_eq!(output, b"aCaB");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod inflate;
pub mod reader;
pub mod stream;
pub mod tables;
pub mod zlib;

// Re-exports
pub use huffman::{Alphabet, HuffmanTree};
pub use inflate::{InflateResult, Inflater, InflaterState, inflate, inflate64};
pub use reader::{DecompressReader, InflateReader, ZlibReader};
pub use stream::InflateStream;
pub use zlib::{Adler32, ZlibInflater, zlib_decompress, zlib_decompress_with_dict};
