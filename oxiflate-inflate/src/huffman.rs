//! Huffman decoding for DEFLATE (RFC 1951).
//!
//! DEFLATE transmits canonical Huffman codes as a list of code lengths.
//! [`HuffmanTree`] rebuilds the codes from those lengths and decodes one
//! symbol at a time from an [`InputBuffer`].
//!
//! # Layout
//!
//! Codes no longer than the table width are resolved with one lookup in a
//! table of `2^table_bits` entries, indexed by the next input bits. Longer
//! codes store a node index in the table; the remaining bits walk a binary
//! tree held in the flat `left`/`right` arrays. Entries are:
//!
//! - `0..=287`: a symbol
//! - negative: `-node`, continue in `left[node]` / `right[node]`
//! - [`UNUSED`]: no code has this prefix
//!
//! # Alphabets
//!
//! - **Literal/Length**: 0-287 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-31 (30 and 31 only used by DEFLATE64)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman trees)

use oxiflate_core::InputBuffer;
use oxiflate_core::error::{OxiflateError, Result};

/// Maximum code length in DEFLATE (15 bits).
pub const MAX_CODE_LENGTH: usize = 15;

/// Largest literal/length alphabet (fixed tables use all 288 symbols).
pub const MAX_LITERAL_TREE_ELEMENTS: usize = 288;

/// Largest distance alphabet.
pub const MAX_DIST_TREE_ELEMENTS: usize = 32;

/// Size of the code length alphabet (0-18).
pub const CODE_LENGTH_TREE_ELEMENTS: usize = 19;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// Table entry with no code behind it.
const UNUSED: i16 = i16::MAX;

/// Which alphabet a tree decodes; selects table width and validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// Literal/length codes (9-bit table).
    LiteralLength,
    /// Distance codes (7-bit table).
    Distance,
    /// Code length codes of a dynamic block header (7-bit table).
    CodeLength,
}

impl Alphabet {
    fn table_bits(self) -> u32 {
        match self {
            Self::LiteralLength => 9,
            Self::Distance | Self::CodeLength => 7,
        }
    }

    fn max_symbols(self) -> usize {
        match self {
            Self::LiteralLength => MAX_LITERAL_TREE_ELEMENTS,
            Self::Distance => MAX_DIST_TREE_ELEMENTS,
            Self::CodeLength => CODE_LENGTH_TREE_ELEMENTS,
        }
    }
}

#[derive(Clone, Copy)]
enum Slot {
    Table,
    Left,
    Right,
}

/// A canonical Huffman decoder.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    table_bits: u32,
    table_mask: u32,
    table: Vec<i16>,
    left: Vec<i16>,
    right: Vec<i16>,
    code_lengths: Vec<u8>,
}

impl HuffmanTree {
    /// Build a decoder from per-symbol code lengths.
    ///
    /// `code_lengths[i]` is the bit length of symbol `i`; zero means unused.
    ///
    /// Over-subscribed code sets are rejected. Incomplete sets are rejected
    /// too, except a lone one-bit code in the literal/length or distance
    /// alphabet. A set with no codes at all builds a tree that fails on the
    /// first decode.
    pub fn new(code_lengths: &[u8], alphabet: Alphabet) -> Result<Self> {
        if code_lengths.len() > alphabet.max_symbols() {
            return Err(OxiflateError::invalid_table(format!(
                "{} code lengths for an alphabet of {}",
                code_lengths.len(),
                alphabet.max_symbols()
            )));
        }

        let mut bl_count = [0u32; MAX_CODE_LENGTH + 1];
        for &len in code_lengths {
            if len as usize > MAX_CODE_LENGTH {
                return Err(OxiflateError::invalid_table(format!(
                    "Code length {} exceeds maximum {}",
                    len, MAX_CODE_LENGTH
                )));
            }
            bl_count[len as usize] += 1;
        }
        bl_count[0] = 0;

        let max_length = (1..=MAX_CODE_LENGTH)
            .rev()
            .find(|&len| bl_count[len] != 0)
            .unwrap_or(0);

        let table_bits = alphabet.table_bits();
        let mut tree = Self {
            table_bits,
            table_mask: (1 << table_bits) - 1,
            table: vec![UNUSED; 1 << table_bits],
            left: vec![UNUSED; 2 * code_lengths.len()],
            right: vec![UNUSED; 2 * code_lengths.len()],
            code_lengths: code_lengths.to_vec(),
        };

        if max_length == 0 {
            return Ok(tree);
        }

        // Kraft check: `left` counts unused codes at each length.
        let mut left: i64 = 1;
        for &count in &bl_count[1..] {
            left = (left << 1) - count as i64;
            if left < 0 {
                return Err(OxiflateError::invalid_table("Over-subscribed Huffman code"));
            }
        }
        if left > 0 && (alphabet == Alphabet::CodeLength || max_length != 1) {
            return Err(OxiflateError::invalid_table("Incomplete Huffman code"));
        }

        tree.fill_table()?;
        Ok(tree)
    }

    /// Canonical codes for every symbol, bit-reversed to DEFLATE's packing order.
    fn canonical_codes(&self) -> Vec<u32> {
        let mut bl_count = [0u32; MAX_CODE_LENGTH + 1];
        for &len in &self.code_lengths {
            bl_count[len as usize] += 1;
        }
        bl_count[0] = 0;

        let mut next_code = [0u32; MAX_CODE_LENGTH + 1];
        let mut code = 0u32;
        for bits in 1..=MAX_CODE_LENGTH {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        self.code_lengths
            .iter()
            .map(|&len| {
                if len == 0 {
                    return 0;
                }
                let code = next_code[len as usize];
                next_code[len as usize] += 1;
                reverse_bits(code, len as u32)
            })
            .collect()
    }

    fn slot_mut(&mut self, slot: Slot, index: usize) -> Result<&mut i16> {
        let entry = match slot {
            Slot::Table => self.table.get_mut(index),
            Slot::Left => self.left.get_mut(index),
            Slot::Right => self.right.get_mut(index),
        };
        entry.ok_or_else(|| OxiflateError::invalid_table("Huffman tree node out of range"))
    }

    fn fill_table(&mut self) -> Result<()> {
        let codes = self.canonical_codes();
        let table_bits = self.table_bits;
        // Node 0 would be indistinguishable from symbol 0 once negated.
        let mut avail = self.code_lengths.len().max(1);

        for symbol in 0..self.code_lengths.len() {
            let len = self.code_lengths[symbol] as u32;
            if len == 0 {
                continue;
            }
            let mut start = codes[symbol];

            if len <= table_bits {
                let increment = 1u32 << len;
                if start >= increment {
                    return Err(OxiflateError::invalid_table("Bad Huffman code"));
                }
                for _ in 0..(1u32 << (table_bits - len)) {
                    let entry = &mut self.table[start as usize];
                    if *entry != UNUSED {
                        return Err(OxiflateError::invalid_table("Conflicting Huffman codes"));
                    }
                    *entry = symbol as i16;
                    start += increment;
                }
            } else {
                let mut code_bit_mask = 1u32 << table_bits;
                let mut slot = Slot::Table;
                let mut index = (start & self.table_mask) as usize;

                for _ in 0..(len - table_bits) {
                    let entry = self.slot_mut(slot, index)?;
                    if *entry == UNUSED {
                        *entry = -(avail as i16);
                        avail += 1;
                    }
                    let value = *entry;
                    if value >= 0 {
                        return Err(OxiflateError::invalid_table("Conflicting Huffman codes"));
                    }
                    slot = if start & code_bit_mask == 0 {
                        Slot::Left
                    } else {
                        Slot::Right
                    };
                    index = (-value) as usize;
                    code_bit_mask <<= 1;
                }

                let entry = self.slot_mut(slot, index)?;
                if *entry != UNUSED {
                    return Err(OxiflateError::invalid_table("Conflicting Huffman codes"));
                }
                *entry = symbol as i16;
            }
        }

        Ok(())
    }

    /// Code lengths this tree was built from.
    pub fn code_lengths(&self) -> &[u8] {
        &self.code_lengths
    }

    /// Decode the next symbol.
    ///
    /// Returns `Ok(None)` when the input does not hold enough bits for the
    /// next code yet; nothing is consumed in that case. Bits that resolve to
    /// no symbol are an [`OxiflateError::InvalidHuffmanCode`].
    #[inline]
    pub fn get_next_symbol(&self, input: &mut InputBuffer<'_>) -> Result<Option<u16>> {
        let bit_buffer = input.try_load_16_bits();
        let available = input.available_bits();
        if available == 0 {
            return Ok(None);
        }

        let mut entry = self.table[(bit_buffer & self.table_mask) as usize];
        let mut depth = self.table_bits;

        if entry < 0 {
            let mut mask = 1u32 << self.table_bits;
            while entry < 0 && depth < MAX_CODE_LENGTH as u32 {
                let node = (-entry) as usize;
                entry = if bit_buffer & mask == 0 {
                    self.left[node]
                } else {
                    self.right[node]
                };
                mask <<= 1;
                depth += 1;
            }
        }

        if entry == UNUSED || entry < 0 {
            // Missing bits read as zeros and may have led here.
            if depth > available {
                return Ok(None);
            }
            return Err(OxiflateError::InvalidHuffmanCode);
        }

        let symbol = entry as usize;
        let code_length = self.code_lengths.get(symbol).copied().unwrap_or(0) as u32;
        if code_length == 0 {
            return Err(OxiflateError::InvalidHuffmanCode);
        }
        if code_length > available {
            return Ok(None);
        }

        input.skip_bits(code_length);
        Ok(Some(symbol as u16))
    }
}

/// Reverse the low `length` bits of `code`.
fn reverse_bits(mut code: u32, length: u32) -> u32 {
    let mut reversed = 0u32;
    for _ in 0..length {
        reversed = (reversed << 1) | (code & 1);
        code >>= 1;
    }
    reversed
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiflate_core::BitsBuffer;

    fn decode_all(tree: &HuffmanTree, data: &[u8], count: usize) -> Vec<u16> {
        let mut input = InputBuffer::new(BitsBuffer::new(), data);
        (0..count)
            .map(|_| tree.get_next_symbol(&mut input).unwrap().unwrap())
            .collect()
    }

    #[test]
    fn test_huffman_tree_simple() {
        // A=0 (1 bit), B=10, C=11 (2 bits). LSB-first: A=0, B=01, C=11.
        let tree = HuffmanTree::new(&[1, 2, 2], Alphabet::LiteralLength).unwrap();

        // A B C A -> bits 0 | 01 | 11 | 0 -> 0b0001_1010
        let symbols = decode_all(&tree, &[0b0001_1010], 4);
        assert_eq!(symbols, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_canonical_order() {
        // RFC 1951 section 3.2.2 example: lengths (3,3,3,3,3,2,4,4)
        // give codes 010 011 100 101 110 00 1110 1111.
        let tree = HuffmanTree::new(&[3, 3, 3, 3, 3, 2, 4, 4], Alphabet::Distance).unwrap();
        let codes = tree.canonical_codes();
        let expected = [0b010, 0b011, 0b100, 0b101, 0b110, 0b00, 0b1110, 0b1111];
        let lens = [3, 3, 3, 3, 3, 2, 4, 4];
        for i in 0..8 {
            assert_eq!(codes[i], reverse_bits(expected[i], lens[i]), "symbol {}", i);
        }
    }

    #[test]
    fn test_long_codes_use_overflow_tree() {
        // 1, 2, ..., 14, 15, 15: a complete code deeper than the 9-bit table.
        let mut lengths: Vec<u8> = (1..=15).collect();
        lengths.push(15);
        let tree = HuffmanTree::new(&lengths, Alphabet::LiteralLength).unwrap();

        // Symbol 15 has code 111111111111111 (15 ones), symbol 14 is
        // fourteen ones followed by 0. Packed LSB-first, MSB of the code first.
        let mut bits: Vec<u8> = vec![1; 15];
        bits.extend(std::iter::repeat_n(1, 14));
        bits.push(0);
        bits.push(0); // symbol 0
        let mut bytes = vec![0u8; bits.len().div_ceil(8)];
        for (i, &b) in bits.iter().enumerate() {
            bytes[i / 8] |= b << (i % 8);
        }

        let symbols = decode_all(&tree, &bytes, 3);
        assert_eq!(symbols, vec![15, 14, 0]);
    }

    #[test]
    fn test_suspends_on_partial_code() {
        let mut lengths: Vec<u8> = (1..=15).collect();
        lengths.push(15);
        let tree = HuffmanTree::new(&lengths, Alphabet::LiteralLength).unwrap();

        // Only 8 of the 15 one-bits of symbol 15 are present.
        let mut input = InputBuffer::new(BitsBuffer::new(), &[0xFF]);
        assert_eq!(tree.get_next_symbol(&mut input).unwrap(), None);
        assert_eq!(input.available_bits(), 8);

        let mut input = InputBuffer::new(input.into_bits(), &[0x7F]);
        assert_eq!(tree.get_next_symbol(&mut input).unwrap(), Some(15));
        assert_eq!(input.available_bits(), 1);
    }

    #[test]
    fn test_empty_input_suspends() {
        let tree = HuffmanTree::new(&[1, 1], Alphabet::CodeLength).unwrap();
        let mut input = InputBuffer::new(BitsBuffer::new(), &[]);
        assert_eq!(tree.get_next_symbol(&mut input).unwrap(), None);
    }

    #[test]
    fn test_over_subscribed_rejected() {
        let err = HuffmanTree::new(&[1, 1, 1], Alphabet::LiteralLength).unwrap_err();
        assert!(err.is_invalid_data());
    }

    #[test]
    fn test_incomplete_rejected() {
        assert!(HuffmanTree::new(&[2, 2, 2], Alphabet::LiteralLength).is_err());
        assert!(HuffmanTree::new(&[1, 0, 0], Alphabet::CodeLength).is_err());
    }

    #[test]
    fn test_single_code_allowed() {
        let tree = HuffmanTree::new(&[0, 1, 0], Alphabet::Distance).unwrap();
        // Bit 0 decodes symbol 1, bit 1 has no symbol.
        let mut input = InputBuffer::new(BitsBuffer::new(), &[0b10]);
        assert_eq!(tree.get_next_symbol(&mut input).unwrap(), Some(1));
        assert!(matches!(
            tree.get_next_symbol(&mut input),
            Err(OxiflateError::InvalidHuffmanCode)
        ));
    }

    #[test]
    fn test_empty_tree_fails_on_decode() {
        let tree = HuffmanTree::new(&[0; 30], Alphabet::Distance).unwrap();
        let mut input = InputBuffer::new(BitsBuffer::new(), &[0x00, 0x00]);
        assert!(matches!(
            tree.get_next_symbol(&mut input),
            Err(OxiflateError::InvalidHuffmanCode)
        ));
    }

    #[test]
    fn test_length_out_of_range() {
        let mut lengths = [0u8; 19];
        lengths[0] = 16;
        assert!(HuffmanTree::new(&lengths, Alphabet::CodeLength).is_err());
        assert!(HuffmanTree::new(&[1; 33], Alphabet::Distance).is_err());
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0b001, 3), 0b100);
        assert_eq!(reverse_bits(0b1101, 4), 0b1011);
        assert_eq!(reverse_bits(0b1, 1), 0b1);
    }
}
