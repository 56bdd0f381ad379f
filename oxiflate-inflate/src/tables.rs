//! Static code tables for DEFLATE (RFC 1951) and DEFLATE64.
//!
//! Length and distance symbols carry a base value plus a number of extra
//! bits read straight from the stream. DEFLATE64 reuses the standard
//! tables with two changes: length symbol 285 becomes base 3 with 16 extra
//! bits, and distance symbols 30 and 31 become valid.

use crate::huffman::{Alphabet, HuffmanTree};
use std::sync::OnceLock;

/// First length symbol in the literal/length alphabet.
pub const FIRST_LENGTH_SYMBOL: u16 = 257;

/// Longest match in standard DEFLATE.
pub const MAX_MATCH: usize = 258;

/// Longest match in DEFLATE64 (base 3 + 16 extra bits).
pub const MAX_MATCH_DEFLATE64: usize = 3 + 0xFFFF;

/// Number of distance symbols valid in standard DEFLATE.
pub const DISTANCE_CODES: usize = 30;

/// Number of distance symbols valid in DEFLATE64.
pub const DISTANCE_CODES_DEFLATE64: usize = 32;

/// Most literal/length codes a dynamic block may declare.
pub const MAX_LITERAL_CODES: usize = 286;

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6).
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub fn fixed_litlen_lengths() -> [u8; 288] {
    let mut lengths = [0u8; 288];

    for len in lengths.iter_mut().take(144) {
        *len = 8;
    }
    for len in lengths.iter_mut().take(256).skip(144) {
        *len = 9;
    }
    for len in lengths.iter_mut().take(280).skip(256) {
        *len = 7;
    }
    for len in lengths.iter_mut().skip(280) {
        *len = 8;
    }

    lengths
}

/// Fixed distance code lengths: all 32 symbols use 5 bits.
///
/// Symbols 30 and 31 only decode to a valid distance under DEFLATE64.
pub fn fixed_distance_lengths() -> [u8; 32] {
    [5u8; 32]
}

/// Get the fixed literal/length Huffman tree.
///
/// This tree is cached after first construction.
pub fn fixed_litlen_tree() -> &'static HuffmanTree {
    static TREE: OnceLock<HuffmanTree> = OnceLock::new();

    TREE.get_or_init(|| {
        HuffmanTree::new(&fixed_litlen_lengths(), Alphabet::LiteralLength)
            .expect("Fixed litlen tree construction should never fail")
    })
}

/// Get the fixed distance Huffman tree.
///
/// This tree is cached after first construction.
pub fn fixed_distance_tree() -> &'static HuffmanTree {
    static TREE: OnceLock<HuffmanTree> = OnceLock::new();

    TREE.get_or_init(|| {
        HuffmanTree::new(&fixed_distance_lengths(), Alphabet::Distance)
            .expect("Fixed distance tree construction should never fail")
    })
}

/// Length code base values (RFC 1951 Section 3.2.5).
///
/// For length codes 257-285, this gives the base length value.
/// Extra bits are added to get the final length.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, // 257-264: 0 extra bits
    11, 13, 15, 17, // 265-268: 1 extra bit
    19, 23, 27, 31, // 269-272: 2 extra bits
    35, 43, 51, 59, // 273-276: 3 extra bits
    67, 83, 99, 115, // 277-280: 4 extra bits
    131, 163, 195, 227, // 281-284: 5 extra bits
    258, // 285: 0 extra bits
];

/// Number of extra bits for length codes 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 257-264
    1, 1, 1, 1, // 265-268
    2, 2, 2, 2, // 269-272
    3, 3, 3, 3, // 273-276
    4, 4, 4, 4, // 277-280
    5, 5, 5, 5, // 281-284
    0, // 285
];

/// Distance code base values (RFC 1951 Section 3.2.5), plus the two
/// DEFLATE64 codes.
pub const DISTANCE_BASE: [u32; 32] = [
    1, 2, 3, 4, // 0-3: 0 extra bits
    5, 7, // 4-5: 1 extra bit
    9, 13, // 6-7: 2 extra bits
    17, 25, // 8-9: 3 extra bits
    33, 49, // 10-11: 4 extra bits
    65, 97, // 12-13: 5 extra bits
    129, 193, // 14-15: 6 extra bits
    257, 385, // 16-17: 7 extra bits
    513, 769, // 18-19: 8 extra bits
    1025, 1537, // 20-21: 9 extra bits
    2049, 3073, // 22-23: 10 extra bits
    4097, 6145, // 24-25: 11 extra bits
    8193, 12289, // 26-27: 12 extra bits
    16385, 24577, // 28-29: 13 extra bits
    32769, 49153, // 30-31: 14 extra bits (DEFLATE64)
];

/// Number of extra bits for distance codes 0-31.
pub const DISTANCE_EXTRA_BITS: [u8; 32] = [
    0, 0, 0, 0, // 0-3
    1, 1, // 4-5
    2, 2, // 6-7
    3, 3, // 8-9
    4, 4, // 10-11
    5, 5, // 12-13
    6, 6, // 14-15
    7, 7, // 16-17
    8, 8, // 18-19
    9, 9, // 20-21
    10, 10, // 22-23
    11, 11, // 24-25
    12, 12, // 26-27
    13, 13, // 28-29
    14, 14, // 30-31
];

/// Order of code length codes in dynamic block header.
///
/// Code length codes are transmitted in this order (RFC 1951 Section 3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Base length and extra bit count for a length symbol (257-285).
///
/// Returns `None` for symbols outside the length range.
pub fn length_base(symbol: u16, deflate64: bool) -> Option<(usize, u32)> {
    let index = symbol.checked_sub(FIRST_LENGTH_SYMBOL)? as usize;
    if index >= LENGTH_BASE.len() {
        return None;
    }
    if deflate64 && index == LENGTH_BASE.len() - 1 {
        return Some((3, 16));
    }
    Some((LENGTH_BASE[index] as usize, LENGTH_EXTRA_BITS[index] as u32))
}

/// Base distance and extra bit count for a distance symbol.
///
/// Symbols 30 and 31 are only accepted when `deflate64` is set.
pub fn distance_base(symbol: u16, deflate64: bool) -> Option<(usize, u32)> {
    let limit = if deflate64 {
        DISTANCE_CODES_DEFLATE64
    } else {
        DISTANCE_CODES
    };
    let index = symbol as usize;
    if index >= limit {
        return None;
    }
    Some((DISTANCE_BASE[index] as usize, DISTANCE_EXTRA_BITS[index] as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiflate_core::{BitsBuffer, InputBuffer};

    #[test]
    fn test_fixed_litlen_lengths() {
        let lengths = fixed_litlen_lengths();
        assert_eq!(lengths[0], 8);
        assert_eq!(lengths[143], 8);
        assert_eq!(lengths[144], 9);
        assert_eq!(lengths[255], 9);
        assert_eq!(lengths[256], 7);
        assert_eq!(lengths[279], 7);
        assert_eq!(lengths[280], 8);
        assert_eq!(lengths[287], 8);
    }

    #[test]
    fn test_fixed_trees_decode() {
        // End of block is seven zero bits in the fixed code.
        let mut input = InputBuffer::new(BitsBuffer::new(), &[0x00]);
        assert_eq!(
            fixed_litlen_tree().get_next_symbol(&mut input).unwrap(),
            Some(256)
        );

        // Distance code 31 is 11111, reversed 11111.
        let mut input = InputBuffer::new(BitsBuffer::new(), &[0x1F]);
        assert_eq!(
            fixed_distance_tree().get_next_symbol(&mut input).unwrap(),
            Some(31)
        );
    }

    #[test]
    fn test_length_base() {
        assert_eq!(length_base(257, false), Some((3, 0)));
        assert_eq!(length_base(265, false), Some((11, 1)));
        assert_eq!(length_base(284, false), Some((227, 5)));
        assert_eq!(length_base(285, false), Some((258, 0)));
        assert_eq!(length_base(285, true), Some((3, 16)));
        assert_eq!(length_base(286, false), None);
        assert_eq!(length_base(287, true), None);
        assert_eq!(length_base(256, false), None);
    }

    #[test]
    fn test_distance_base() {
        assert_eq!(distance_base(0, false), Some((1, 0)));
        assert_eq!(distance_base(29, false), Some((24577, 13)));
        assert_eq!(distance_base(30, false), None);
        assert_eq!(distance_base(30, true), Some((32769, 14)));
        assert_eq!(distance_base(31, true), Some((49153, 14)));
        assert_eq!(distance_base(32, true), None);
    }

    #[test]
    fn test_maximum_values() {
        assert_eq!(
            LENGTH_BASE[28] as usize + LENGTH_EXTRA_BITS[28] as usize,
            MAX_MATCH
        );
        // Largest DEFLATE64 distance is 49153 + 16383.
        assert_eq!(DISTANCE_BASE[31] + (1 << DISTANCE_EXTRA_BITS[31]) - 1, 65536);
    }
}
