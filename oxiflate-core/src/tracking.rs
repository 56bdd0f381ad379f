//! CRC-32 and size tracking for decompressed output.
//!
//! Container formats record the CRC-32 and length of the uncompressed data
//! next to the compressed stream. [`CrcTracker`] accumulates both as bytes
//! are produced and checks them against the recorded values;
//! [`TrackingWriter`] does the same for anything written through it.

use crate::crc::Crc32;
use crate::error::{OxiflateError, Result};
use std::io::{self, Write};

/// Running CRC-32 and byte count.
#[derive(Debug, Clone, Default)]
pub struct CrcTracker {
    crc: Crc32,
    bytes: u64,
}

impl CrcTracker {
    /// Create a tracker with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record another chunk of output.
    pub fn update(&mut self, data: &[u8]) {
        self.crc.update(data);
        self.bytes += data.len() as u64;
    }

    /// CRC-32 of everything recorded so far.
    pub fn crc32(&self) -> u32 {
        self.crc.value()
    }

    /// Number of bytes recorded so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Check the recorded data against expected metadata.
    ///
    /// Either expectation may be omitted. A short stream is reported as
    /// [`OxiflateError::UnexpectedEof`], any other mismatch as
    /// [`OxiflateError::ChecksumMismatch`].
    pub fn verify(&self, expected_crc: Option<u32>, expected_size: Option<u64>) -> Result<()> {
        if let Some(size) = expected_size {
            if self.bytes < size {
                return Err(OxiflateError::unexpected_eof(
                    usize::try_from(size - self.bytes).unwrap_or(usize::MAX),
                ));
            }
            if self.bytes > size {
                return Err(OxiflateError::invalid_header(format!(
                    "decompressed size {} exceeds expected {}",
                    self.bytes, size
                )));
            }
        }

        if let Some(crc) = expected_crc {
            let computed = self.crc32();
            if computed != crc {
                return Err(OxiflateError::checksum_mismatch(crc, computed));
            }
        }

        Ok(())
    }

    /// Forget everything recorded.
    pub fn reset(&mut self) {
        self.crc.reset();
        self.bytes = 0;
    }
}

/// A writer that tracks CRC-32 and size of the bytes passing through it.
#[derive(Debug)]
pub struct TrackingWriter<W: Write> {
    inner: W,
    tracker: CrcTracker,
}

impl<W: Write> TrackingWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            tracker: CrcTracker::new(),
        }
    }

    /// The tracker for the bytes written so far.
    pub fn tracker(&self) -> &CrcTracker {
        &self.tracker
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap into the inner writer and the final tracker.
    pub fn into_parts(self) -> (W, CrcTracker) {
        (self.inner, self.tracker)
    }
}

impl<W: Write> Write for TrackingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.tracker.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_accumulates() {
        let mut tracker = CrcTracker::new();
        tracker.update(b"12345");
        tracker.update(b"6789");
        assert_eq!(tracker.bytes(), 9);
        assert_eq!(tracker.crc32(), 0xCBF43926);
        tracker.verify(Some(0xCBF43926), Some(9)).unwrap();
        tracker.verify(None, None).unwrap();
    }

    #[test]
    fn test_tracker_mismatches() {
        let mut tracker = CrcTracker::new();
        tracker.update(b"123456789");

        let err = tracker.verify(Some(0xDEADBEEF), None).unwrap_err();
        assert!(matches!(
            err,
            OxiflateError::ChecksumMismatch {
                expected: 0xDEADBEEF,
                computed: 0xCBF43926
            }
        ));

        let err = tracker.verify(None, Some(12)).unwrap_err();
        assert!(matches!(err, OxiflateError::UnexpectedEof { expected: 3 }));

        assert!(tracker.verify(None, Some(4)).unwrap_err().is_invalid_data());
    }

    #[test]
    fn test_tracking_writer() {
        let mut writer = TrackingWriter::new(Vec::new());
        writer.write_all(b"Hello, World!").unwrap();
        writer.flush().unwrap();

        assert_eq!(writer.get_ref().as_slice(), b"Hello, World!");
        let (inner, tracker) = writer.into_parts();
        assert_eq!(inner.len(), 13);
        assert_eq!(tracker.crc32(), 0xEC4AC3D0);
        assert_eq!(tracker.bytes(), 13);
    }
}
