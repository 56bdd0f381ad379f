//! CRC-32 (ISO 3309) checksum.
//!
//! The CRC used by ZIP, GZIP and PNG to validate decompressed payloads.
//! Inputs of 16 bytes or more are processed eight bytes at a time with
//! slicing-by-8 tables; shorter inputs use the single-table loop.

/// Reflected CRC-32 polynomial.
const POLY: u32 = 0xEDB88320;

/// Slicing-by-8 tables. Table 0 is the classic byte-at-a-time table.
const CRC32_TABLES: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];

    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
            j += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev & 0xFF) as usize] ^ (prev >> 8);
            i += 1;
        }
        t += 1;
    }

    tables
};

/// CRC-32 calculator (ISO 3309).
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
///
/// # Example
///
/// ```
/// use oxiflate_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: 0xFFFFFFFF }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0xFFFFFFFF;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= 16 {
            crc32_slice8(&mut self.crc, data);
        } else {
            crc32_bytewise(&mut self.crc, data);
        }
    }

    /// Get the current CRC value (without finalizing).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.value()
    }

    /// Compute CRC-32 for a slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn crc32_bytewise(crc: &mut u32, data: &[u8]) {
    for &byte in data {
        *crc = CRC32_TABLES[0][((*crc ^ byte as u32) & 0xFF) as usize] ^ (*crc >> 8);
    }
}

#[inline]
fn crc32_slice8(crc: &mut u32, data: &[u8]) {
    let mut c = *crc;
    let mut chunks = data.chunks_exact(8);

    for chunk in &mut chunks {
        let lo = c ^ u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        c = CRC32_TABLES[7][(lo & 0xFF) as usize]
            ^ CRC32_TABLES[6][((lo >> 8) & 0xFF) as usize]
            ^ CRC32_TABLES[5][((lo >> 16) & 0xFF) as usize]
            ^ CRC32_TABLES[4][(lo >> 24) as usize]
            ^ CRC32_TABLES[3][chunk[4] as usize]
            ^ CRC32_TABLES[2][chunk[5] as usize]
            ^ CRC32_TABLES[1][chunk[6] as usize]
            ^ CRC32_TABLES[0][chunk[7] as usize];
    }

    crc32_bytewise(&mut c, chunks.remainder());
    *crc = c;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::compute(b""), 0x00000000);
    }

    #[test]
    fn test_crc32_check() {
        // Standard CRC-32 check value for "123456789"
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_table_correctness() {
        assert_eq!(CRC32_TABLES[0][0], 0x00000000);
        assert_eq!(CRC32_TABLES[0][1], 0x77073096);
        assert_eq!(CRC32_TABLES[0][255], 0x2D02EF8D);
    }

    #[test]
    fn test_crc32_slicing_matches_bytewise() {
        for size in [1, 7, 8, 15, 16, 17, 31, 32, 63, 64, 127, 128, 255, 256, 1024] {
            let data: Vec<u8> = (0..size).map(|i| (i * 31 + 7) as u8).collect();
            let crc1 = Crc32::compute(&data);

            let mut crc2 = Crc32::new();
            for &byte in &data {
                crc2.update(&[byte]);
            }

            assert_eq!(crc1, crc2.finalize(), "CRC mismatch for size {}", size);
        }
    }

    #[test]
    fn test_crc32_reset() {
        let mut crc = Crc32::new();
        crc.update(b"garbage");
        crc.reset();
        crc.update(b"123456789");
        assert_eq!(crc.value(), 0xCBF43926);
    }
}
