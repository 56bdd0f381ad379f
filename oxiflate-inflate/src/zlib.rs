//! Zlib format (RFC 1950) decoding on top of the streaming inflater.
//!
//! # Format
//!
//! ```text
//! +---+---+=====================+============+---+---+---+---+
//! |CMF|FLG| DICTID (if FDICT)   | compressed |    ADLER32    |
//! +---+---+=====================+============+---+---+---+---+
//! ```
//!
//! - CMF: Compression Method and Flags
//!   - Bits 0-3: CM (Compression Method) - must be 8 for DEFLATE
//!   - Bits 4-7: CINFO (Compression Info) - log2(window size) - 8
//! - FLG: Flags
//!   - Bits 0-4: FCHECK - check bits so (CMF*256 + FLG) mod 31 == 0
//!   - Bit 5: FDICT - preset dictionary present
//!   - Bits 6-7: FLEVEL - compression level (0-3)
//! - DICTID: Adler-32 of the preset dictionary (big-endian)
//! - Compressed data (DEFLATE format)
//! - ADLER32: Adler-32 checksum of uncompressed data (big-endian)
//!
//! [`ZlibInflater`] parses all of this incrementally, so header, dictionary
//! id and trailer may each arrive split across input chunks.

use crate::inflate::{InflateResult, Inflater};
use oxiflate_core::error::{OxiflateError, Result};
use oxiflate_core::traits::{DecompressStatus, Decompressor};

/// Adler-32 checksum calculator.
///
/// Adler-32 is a checksum algorithm designed by Mark Adler.
/// It is faster than CRC-32 but provides less protection against random errors.
#[derive(Clone, Debug)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

/// Largest prime smaller than 65536.
const ADLER_MOD: u32 = 65521;

/// Number of bytes to process before reducing.
const NMAX: usize = 5552;

impl Adler32 {
    /// Create a new Adler-32 calculator.
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    /// Update the checksum with more data.
    pub fn update(&mut self, data: &[u8]) {
        let mut a = self.a;
        let mut b = self.b;

        // Reduce at least every NMAX bytes so the sums cannot overflow.
        for chunk in data.chunks(NMAX) {
            for &byte in chunk {
                a += byte as u32;
                b += a;
            }
            a %= ADLER_MOD;
            b %= ADLER_MOD;
        }

        self.a = a;
        self.b = b;
    }

    /// Return the checksum of everything seen so far.
    pub fn finish(&self) -> u32 {
        (self.b << 16) | self.a
    }

    /// Compute Adler-32 checksum of data in one shot.
    pub fn checksum(data: &[u8]) -> u32 {
        let mut adler = Self::new();
        adler.update(data);
        adler.finish()
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a zlib header. Returns whether FDICT is set.
fn parse_header(cmf: u8, flg: u8) -> Result<bool> {
    if cmf & 0x0F != 8 {
        return Err(OxiflateError::invalid_header(format!(
            "unsupported compression method {}",
            cmf & 0x0F
        )));
    }
    if cmf >> 4 > 7 {
        return Err(OxiflateError::invalid_header("invalid window size"));
    }
    if (u16::from(cmf) * 256 + u16::from(flg)) % 31 != 0 {
        return Err(OxiflateError::invalid_header("zlib header check failed"));
    }
    Ok(flg & 0x20 != 0)
}

/// Check if zlib data requires a preset dictionary.
///
/// Returns `Some(checksum)` if a dictionary is required, where `checksum`
/// is the Adler-32 checksum of the expected dictionary.
/// Returns `None` if no dictionary is required or the header is invalid.
pub fn zlib_requires_dictionary(input: &[u8]) -> Option<u32> {
    if input.len() < 6 || !parse_header(input[0], input[1]).ok()? {
        return None;
    }
    Some(u32::from_be_bytes([input[2], input[3], input[4], input[5]]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZlibState {
    ReadingHeader,
    ReadingDictionaryId,
    Inflating,
    VerifyingTrailer,
    Done,
    Failed,
}

/// Streaming zlib decompressor.
///
/// # Example
///
/// ```
/// use oxiflate_inflate::ZlibInflater;
///
/// // Header, a stored block holding "Hello", Adler-32 trailer.
/// let data = [
///     0x78, 0x01, 0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o',
///     0x05, 0x8C, 0x01, 0xF5,
/// ];
///
/// let mut zlib = ZlibInflater::new();
/// let mut out = [0u8; 16];
/// let result = zlib.inflate(&data, &mut out).unwrap();
///
/// assert_eq!(&out[..result.bytes_written], b"Hello");
/// assert!(zlib.finished());
/// ```
#[derive(Debug)]
pub struct ZlibInflater {
    inflater: Inflater,
    state: ZlibState,
    /// Header, dictionary id or trailer bytes gathered so far.
    field: [u8; 4],
    field_read: usize,
    adler: Adler32,
    dictionary: Option<Vec<u8>>,
}

impl ZlibInflater {
    /// Create a new zlib decompressor.
    pub fn new() -> Self {
        Self {
            inflater: Inflater::new(),
            state: ZlibState::ReadingHeader,
            field: [0; 4],
            field_read: 0,
            adler: Adler32::new(),
            dictionary: None,
        }
    }

    /// Create a decompressor that can satisfy an FDICT header.
    ///
    /// The dictionary is only used if the stream asks for it and its
    /// Adler-32 matches the header's DICTID.
    pub fn with_dictionary(dictionary: &[u8]) -> Self {
        let mut zlib = Self::new();
        zlib.dictionary = Some(dictionary.to_vec());
        zlib
    }

    /// True once the DEFLATE payload has ended and all output is returned.
    ///
    /// The trailer may still be unverified.
    pub fn payload_finished(&self) -> bool {
        matches!(self.state, ZlibState::VerifyingTrailer | ZlibState::Done)
    }

    /// True once the trailer has been read and verified.
    pub fn finished(&self) -> bool {
        self.state == ZlibState::Done
    }

    /// Total decompressed bytes returned.
    pub fn total_out(&self) -> u64 {
        self.inflater.total_out()
    }

    /// Return to the initial state. A configured dictionary is kept.
    pub fn reset(&mut self) {
        self.inflater.reset();
        self.state = ZlibState::ReadingHeader;
        self.field_read = 0;
        self.adler = Adler32::new();
    }

    /// Decompress from `input` into `output`.
    ///
    /// Same contract as [`Inflater::inflate`]: consumed input is never needed
    /// again, and data errors (including a checksum mismatch) are fatal.
    pub fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> Result<InflateResult> {
        let mut result = InflateResult::default();

        match self.inflate_inner(input, output, &mut result) {
            Ok(()) => Ok(result),
            Err(err) => {
                if err.is_invalid_data() && self.state != ZlibState::Failed {
                    log::warn!("zlib stream rejected: {}", err);
                    self.state = ZlibState::Failed;
                }
                Err(err)
            }
        }
    }

    /// Gather `len` bytes of a fixed-size field. Returns `true` when complete.
    fn fill_field(&mut self, input: &[u8], consumed: &mut usize, len: usize) -> bool {
        let take = (len - self.field_read).min(input.len() - *consumed);
        self.field[self.field_read..self.field_read + take]
            .copy_from_slice(&input[*consumed..*consumed + take]);
        self.field_read += take;
        *consumed += take;
        self.field_read == len
    }

    fn inflate_inner(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        result: &mut InflateResult,
    ) -> Result<()> {
        let consumed = &mut result.bytes_consumed;

        loop {
            match self.state {
                ZlibState::ReadingHeader => {
                    if !self.fill_field(input, consumed, 2) {
                        return Ok(());
                    }
                    let fdict = parse_header(self.field[0], self.field[1])?;
                    self.field_read = 0;
                    self.state = if fdict {
                        ZlibState::ReadingDictionaryId
                    } else {
                        ZlibState::Inflating
                    };
                }
                ZlibState::ReadingDictionaryId => {
                    if !self.fill_field(input, consumed, 4) {
                        return Ok(());
                    }
                    let dict_id = u32::from_be_bytes(self.field);
                    match &self.dictionary {
                        Some(dict) if Adler32::checksum(dict) == dict_id => {
                            self.inflater.set_dictionary(dict);
                        }
                        _ => return Err(OxiflateError::DictionaryRequired { dict_id }),
                    }
                    self.field_read = 0;
                    self.state = ZlibState::Inflating;
                }
                ZlibState::Inflating => {
                    let written = result.bytes_written;
                    let step = self.inflater.inflate(&input[*consumed..], &mut output[written..])?;
                    self.adler
                        .update(&output[written..written + step.bytes_written]);
                    *consumed += step.bytes_consumed;
                    result.bytes_written += step.bytes_written;

                    if !self.inflater.finished() {
                        return Ok(());
                    }
                    // The inflater may have read into the trailer already.
                    self.field_read = self.inflater.take_buffered_bytes(&mut self.field);
                    self.state = ZlibState::VerifyingTrailer;
                }
                ZlibState::VerifyingTrailer => {
                    if !self.fill_field(input, consumed, 4) {
                        return Ok(());
                    }
                    let expected = u32::from_be_bytes(self.field);
                    let computed = self.adler.finish();
                    if expected != computed {
                        return Err(OxiflateError::checksum_mismatch(expected, computed));
                    }
                    log::debug!(
                        "zlib stream complete: {} bytes, adler32 {:#010x}",
                        self.inflater.total_out(),
                        computed
                    );
                    self.state = ZlibState::Done;
                }
                ZlibState::Done => return Ok(()),
                ZlibState::Failed => return Err(OxiflateError::DecoderFailed),
            }
        }
    }
}

impl Default for ZlibInflater {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for ZlibInflater {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)> {
        let result = self.inflate(input, output)?;

        let status = if self.finished() {
            DecompressStatus::Done
        } else if result.bytes_written == output.len() {
            DecompressStatus::NeedsOutput
        } else {
            DecompressStatus::NeedsInput
        };

        Ok((result.bytes_consumed, result.bytes_written, status))
    }

    fn reset(&mut self) {
        ZlibInflater::reset(self);
    }

    fn is_finished(&self) -> bool {
        self.finished()
    }
}

/// Decompress zlib format data.
///
/// Fails with [`OxiflateError::DictionaryRequired`] if the stream was
/// compressed against a preset dictionary; use
/// [`zlib_decompress_with_dict`] for those.
pub fn zlib_decompress(input: &[u8]) -> Result<Vec<u8>> {
    ZlibInflater::new().decompress_all(input)
}

/// Decompress zlib format data with a preset dictionary.
///
/// The dictionary must match the one used during compression; the header's
/// DICTID is checked against it.
pub fn zlib_decompress_with_dict(input: &[u8], dictionary: &[u8]) -> Result<Vec<u8>> {
    ZlibInflater::with_dictionary(dictionary).decompress_all(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "Hello" as a stored block in a zlib frame.
    const HELLO: [u8; 16] = [
        0x78, 0x01, 0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o', 0x05, 0x8C, 0x01,
        0xF5,
    ];

    /// Fixed block copying "abc" out of a preset dictionary, FDICT set.
    const DICT_ABC: [u8; 13] = [
        0x78, 0x20, 0x02, 0x4D, 0x01, 0x27, 0x03, 0x22, 0x00, 0x02, 0x4D, 0x01, 0x27,
    ];

    #[test]
    fn test_adler32_empty() {
        let checksum = Adler32::checksum(&[]);
        assert_eq!(checksum, 1);
    }

    #[test]
    fn test_adler32_hello() {
        // Known value for "Hello"
        let checksum = Adler32::checksum(b"Hello");
        assert_eq!(checksum, 0x058C01F5);
    }

    #[test]
    fn test_adler32_incremental() {
        let data = b"Hello, World!";

        let one_shot = Adler32::checksum(data);

        let mut adler = Adler32::new();
        adler.update(&data[..6]);
        adler.update(&data[6..]);
        let incremental = adler.finish();

        assert_eq!(one_shot, incremental);
    }

    #[test]
    fn test_adler32_large() {
        // Larger than NMAX: the sums must be reduced along the way.
        let data = vec![0xFFu8; 10000];
        let one_shot = Adler32::checksum(&data);

        let mut adler = Adler32::new();
        for chunk in data.chunks(333) {
            adler.update(chunk);
        }
        assert_eq!(adler.finish(), one_shot);
        assert_eq!(Adler32::checksum(b"abc"), 0x024D0127);
    }

    #[test]
    fn test_parse_header() {
        assert!(!parse_header(0x78, 0x9C).unwrap());
        assert!(!parse_header(0x78, 0x01).unwrap());
        assert!(parse_header(0x78, 0x20).unwrap());
        // Wrong method, oversized window, bad check bits.
        assert!(parse_header(0x79, 0x9C).is_err());
        assert!(parse_header(0x88, 0x1D).is_err());
        assert!(parse_header(0x78, 0x9D).is_err());
    }

    #[test]
    fn test_zlib_decompress() {
        assert_eq!(zlib_decompress(&HELLO).unwrap(), b"Hello");
    }

    #[test]
    fn test_zlib_byte_at_a_time() {
        let mut zlib = ZlibInflater::new();
        let mut output = Vec::new();
        let mut out = [0u8; 2];

        for (i, byte) in HELLO.iter().enumerate() {
            let result = zlib.inflate(std::slice::from_ref(byte), &mut out).unwrap();
            assert_eq!(result.bytes_consumed, 1, "byte {}", i);
            output.extend_from_slice(&out[..result.bytes_written]);

            // Drain anything still buffered before the next byte.
            loop {
                let result = zlib.inflate(&[], &mut out).unwrap();
                if result.bytes_written == 0 {
                    break;
                }
                output.extend_from_slice(&out[..result.bytes_written]);
            }
        }

        assert_eq!(output, b"Hello");
        assert!(zlib.payload_finished());
        assert!(zlib.finished());
    }

    #[test]
    fn test_zlib_payload_finished_before_trailer() {
        let mut zlib = ZlibInflater::new();
        let mut out = [0u8; 16];
        let result = zlib.inflate(&HELLO[..13], &mut out).unwrap();

        assert_eq!(&out[..result.bytes_written], b"Hello");
        assert!(zlib.payload_finished());
        assert!(!zlib.finished());

        zlib.inflate(&HELLO[13..], &mut out).unwrap();
        assert!(zlib.finished());
    }

    #[test]
    fn test_zlib_checksum_verification() {
        let mut corrupted = HELLO;
        corrupted[15] ^= 0xFF;

        let err = zlib_decompress(&corrupted).unwrap_err();
        assert!(matches!(
            err,
            OxiflateError::ChecksumMismatch {
                computed: 0x058C01F5,
                ..
            }
        ));
    }

    #[test]
    fn test_zlib_invalid_header() {
        let mut bad = HELLO;
        bad[0] = 0x79;
        assert!(matches!(
            zlib_decompress(&bad),
            Err(OxiflateError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_zlib_too_short() {
        assert!(matches!(
            zlib_decompress(&HELLO[..10]),
            Err(OxiflateError::UnexpectedEof { .. })
        ));
        assert!(zlib_decompress(&[0x78]).is_err());
    }

    #[test]
    fn test_zlib_error_is_sticky() {
        let mut zlib = ZlibInflater::new();
        let mut out = [0u8; 16];
        assert!(zlib.inflate(&[0x79, 0x9C], &mut out).is_err());
        assert!(matches!(
            zlib.inflate(&HELLO, &mut out),
            Err(OxiflateError::DecoderFailed)
        ));

        zlib.reset();
        let result = zlib.inflate(&HELLO, &mut out).unwrap();
        assert_eq!(&out[..result.bytes_written], b"Hello");
    }

    #[test]
    fn test_zlib_dictionary() {
        assert_eq!(zlib_requires_dictionary(&DICT_ABC), Some(0x024D0127));
        assert_eq!(zlib_requires_dictionary(&HELLO), None);

        assert_eq!(zlib_decompress_with_dict(&DICT_ABC, b"abc").unwrap(), b"abc");
    }

    #[test]
    fn test_zlib_dictionary_missing_or_wrong() {
        assert!(matches!(
            zlib_decompress(&DICT_ABC),
            Err(OxiflateError::DictionaryRequired {
                dict_id: 0x024D0127
            })
        ));
        assert!(matches!(
            zlib_decompress_with_dict(&DICT_ABC, b"abd"),
            Err(OxiflateError::DictionaryRequired { .. })
        ));
    }

    #[test]
    fn test_zlib_dictionary_unused_without_fdict() {
        assert_eq!(zlib_decompress_with_dict(&HELLO, b"abc").unwrap(), b"Hello");
    }
}
