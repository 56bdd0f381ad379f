//! # OxiFlate Core
//!
//! Core components for the OxiFlate streaming decompressor.
//!
//! This crate provides the building blocks the DEFLATE engine is made of:
//!
//! - [`bitstream`]: LSB-first bit input over borrowed chunks, resumable
//! - [`window`]: Sliding output window for LZ77 back-references
//! - [`crc`]: CRC-32 checksum
//! - [`tracking`]: CRC-32/size tracking of decompressed output
//! - [`traits`]: The streaming [`Decompressor`] trait
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Surfaces                                            │
//! │     InflateStream, io::Read adapter, CLI                │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Inflater state machine, Huffman tables, zlib frame  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Primitives (this crate)                             │
//! │     InputBuffer, OutputWindow, CRC-32                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::bitstream::{BitsBuffer, InputBuffer};
//! use oxiflate_core::window::OutputWindow;
//!
//! let mut input = InputBuffer::new(BitsBuffer::new(), b"ab");
//! let mut window = OutputWindow::new();
//!
//! window.copy_from(&mut input, 2);
//! window.write_length_distance(4, 2).unwrap();
//!
//! let mut out = [0u8; 6];
//! assert_eq!(window.copy_to(&mut out), 6);
//! assert_eq!(&out, b"ababab");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;
pub mod tracking;
pub mod traits;
pub mod window;

// Re-exports for convenience
pub use bitstream::{BitsBuffer, InputBuffer};
pub use crc::Crc32;
pub use error::{OxiflateError, Result};
pub use tracking::{CrcTracker, TrackingWriter};
pub use traits::{DecompressStatus, Decompressor};
pub use window::{OutputWindow, WINDOW_SIZE};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitsBuffer, InputBuffer};
    pub use crate::crc::Crc32;
    pub use crate::error::{OxiflateError, Result};
    pub use crate::tracking::{CrcTracker, TrackingWriter};
    pub use crate::traits::{DecompressStatus, Decompressor};
    pub use crate::window::OutputWindow;
}
