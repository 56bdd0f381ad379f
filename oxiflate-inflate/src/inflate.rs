//! Streaming DEFLATE decompression (inflate).
//!
//! This module implements RFC 1951 decompression as a resumable state
//! machine. It supports all three block types:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! and the DEFLATE64 extension (64 KiB distances, 16-bit match lengths)
//! when enabled at construction.
//!
//! Input arrives in arbitrary chunks and output is collected into
//! caller-sized buffers. Whenever either side runs dry, [`Inflater::inflate`]
//! returns and the next call resumes at the same bit, even in the middle of
//! a block header or a length/distance pair.

use crate::huffman::{Alphabet, END_OF_BLOCK, HuffmanTree};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_CODES, DISTANCE_CODES_DEFLATE64, MAX_LITERAL_CODES, MAX_MATCH,
    MAX_MATCH_DEFLATE64, distance_base, fixed_distance_tree, fixed_litlen_tree, length_base,
};
use oxiflate_core::error::{OxiflateError, Result};
use oxiflate_core::traits::{DecompressStatus, Decompressor};
use oxiflate_core::{BitsBuffer, InputBuffer, OutputWindow};

/// Outcome of one [`Inflater::inflate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InflateResult {
    /// Bytes taken from the input slice.
    pub bytes_consumed: usize,
    /// Bytes written to the output slice.
    pub bytes_written: usize,
}

/// Where the decoder stands between calls.
///
/// Variants are ordered: every dynamic header state sorts before
/// [`InflaterState::DecodeTop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InflaterState {
    /// Waiting for the BFINAL bit.
    ReadingFinalBlockFlag,
    /// Waiting for the two BTYPE bits.
    ReadingBlockType,
    /// Waiting for HLIT.
    ReadingLiteralCodeCount,
    /// Waiting for HDIST.
    ReadingDistanceCodeCount,
    /// Waiting for HCLEN.
    ReadingCodeLengthCodeCount,
    /// Reading the 3-bit code length code lengths.
    ReadingCodeLengthCodes,
    /// About to decode the next code length symbol.
    ReadingTreeCodesBefore,
    /// A repeat symbol was decoded; its extra bits are pending.
    ReadingTreeCodesAfter,
    /// About to decode a literal/length symbol.
    DecodeTop,
    /// Length base known; extra bits pending.
    HaveInitialLength,
    /// Length complete; distance symbol pending.
    HaveFullLength,
    /// Distance symbol known; extra bits pending.
    HaveDistCode,
    /// Stored block: discard bits up to the byte boundary.
    StoredAligning,
    /// Stored block: reading LEN and NLEN.
    ReadingStoredLength,
    /// Stored block: copying raw bytes.
    CopyingStored,
    /// The final block ended or the declared size was reached.
    Done,
    /// A fatal error was reported; the stream cannot continue.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockType {
    Stored,
    Fixed,
    Dynamic,
}

/// Result of one step of block decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    /// Out of input bits.
    Suspended,
    /// Window needs draining before more can be decoded.
    Continue,
    /// The current block ended.
    EndOfBlock,
}

/// Streaming DEFLATE decompressor.
///
/// # Example
///
/// ```
/// use oxiflate_inflate::Inflater;
///
/// // A stored block holding "Hello".
/// let data = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
///
/// let mut inflater = Inflater::new();
/// let mut out = [0u8; 16];
/// let result = inflater.inflate(&data, &mut out).unwrap();
///
/// assert_eq!(&out[..result.bytes_written], b"Hello");
/// assert!(inflater.finished());
/// ```
#[derive(Debug)]
pub struct Inflater {
    /// Bits carried between calls.
    bits: BitsBuffer,
    /// History and undrained output.
    output: OutputWindow,
    state: InflaterState,
    block_type: BlockType,
    final_block: bool,
    deflate64: bool,
    /// Stop after this many output bytes, whatever the bitstream says.
    declared_size: Option<u64>,
    /// Bytes handed to the caller so far.
    total_out: u64,

    // Dynamic block header.
    literal_code_count: usize,
    distance_code_count: usize,
    code_length_code_count: usize,
    loop_counter: usize,
    code_length_lengths: [u8; 19],
    code_lengths: [u8; MAX_LITERAL_CODES + DISTANCE_CODES_DEFLATE64],
    /// Code length symbol whose repeat bits are pending.
    length_code: u16,
    code_length_tree: Option<HuffmanTree>,
    literal_tree: Option<HuffmanTree>,
    distance_tree: Option<HuffmanTree>,

    // Length/distance pair in progress.
    length: usize,
    extra_bits: u32,
    distance_code: u16,

    // Stored block.
    stored_header: [u8; 4],
    stored_header_read: usize,
    block_length: usize,
}

impl Inflater {
    /// Create a standard DEFLATE decompressor.
    pub fn new() -> Self {
        Self::with_options(false, None)
    }

    /// Create a DEFLATE64 decompressor.
    pub fn deflate64() -> Self {
        Self::with_options(true, None)
    }

    /// Create a decompressor.
    ///
    /// # Arguments
    ///
    /// * `deflate64` - Accept the DEFLATE64 length and distance extensions
    /// * `declared_size` - Stop after producing this many bytes, even if the
    ///   bitstream continues
    pub fn with_options(deflate64: bool, declared_size: Option<u64>) -> Self {
        Self {
            bits: BitsBuffer::new(),
            output: OutputWindow::new(),
            state: InflaterState::ReadingFinalBlockFlag,
            block_type: BlockType::Stored,
            final_block: false,
            deflate64,
            declared_size,
            total_out: 0,
            literal_code_count: 0,
            distance_code_count: 0,
            code_length_code_count: 0,
            loop_counter: 0,
            code_length_lengths: [0; 19],
            code_lengths: [0; MAX_LITERAL_CODES + DISTANCE_CODES_DEFLATE64],
            length_code: 0,
            code_length_tree: None,
            literal_tree: None,
            distance_tree: None,
            length: 0,
            extra_bits: 0,
            distance_code: 0,
            stored_header: [0; 4],
            stored_header_read: 0,
            block_length: 0,
        }
    }

    /// Whether DEFLATE64 extensions are enabled.
    pub fn is_deflate64(&self) -> bool {
        self.deflate64
    }

    /// Current decoder state.
    pub fn state(&self) -> InflaterState {
        self.state
    }

    /// True once the stream is complete and every byte has been returned.
    pub fn finished(&self) -> bool {
        self.state == InflaterState::Done && self.output.available_bytes() == 0
    }

    /// Decoded bytes waiting to be collected.
    pub fn available_output(&self) -> usize {
        self.output.available_bytes()
    }

    /// Total bytes returned to the caller.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Preload history with a preset dictionary.
    ///
    /// Must be called before any data is decoded.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) {
        debug_assert_eq!(self.total_out, 0, "Dictionary set after decoding started");
        self.output.preload_dictionary(dictionary);
    }

    /// Return to the initial state, keeping the mode and declared size.
    pub fn reset(&mut self) {
        *self = Self::with_options(self.deflate64, self.declared_size);
    }

    /// Hand back whole bytes that were read ahead of the bit position.
    ///
    /// After the final block, the accumulator may hold bytes that follow the
    /// DEFLATE stream (a container trailer, for instance). This drops any
    /// partial byte and copies up to `dst.len()` of those bytes out.
    pub fn take_buffered_bytes(&mut self, dst: &mut [u8]) -> usize {
        let mut input = InputBuffer::new(self.bits, &[]);
        input.skip_to_byte_boundary();
        let copied = input.copy_to(dst);
        self.bits = input.into_bits();
        copied
    }

    /// Decompress from `input` into `output`.
    ///
    /// Consumes as much input and fills as much output as possible. Input
    /// bytes reported as consumed are never needed again; the caller passes
    /// the rest (plus anything new) on the next call.
    ///
    /// A data error is fatal: once reported, every later call fails with
    /// [`OxiflateError::DecoderFailed`].
    pub fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> Result<InflateResult> {
        if self.state == InflaterState::Failed {
            return Err(OxiflateError::DecoderFailed);
        }

        let mut input = InputBuffer::new(self.bits, input);
        let result = self.inflate_inner(&mut input, output);
        let bytes_consumed = input.bytes_consumed();
        self.bits = input.into_bits();

        match result {
            Ok(bytes_written) => Ok(InflateResult {
                bytes_consumed,
                bytes_written,
            }),
            Err(err) => {
                if err.is_invalid_data() {
                    log::warn!("inflate failed after {} output bytes: {}", self.total_out, err);
                    self.state = InflaterState::Failed;
                }
                Err(err)
            }
        }
    }

    fn remaining_budget(&self) -> Option<u64> {
        self.declared_size
            .map(|size| size.saturating_sub(self.total_out))
    }

    fn inflate_inner(&mut self, input: &mut InputBuffer<'_>, output: &mut [u8]) -> Result<usize> {
        let mut written = 0;
        let mut suspended = false;

        loop {
            let room = output.len() - written;
            let limit = match self.remaining_budget() {
                Some(budget) => room.min(usize::try_from(budget).unwrap_or(usize::MAX)),
                None => room,
            };
            let copied = self.output.copy_to(&mut output[written..written + limit]);
            written += copied;
            self.total_out += copied as u64;

            if self.remaining_budget() == Some(0) {
                if self.state != InflaterState::Done {
                    log::debug!("declared size of {} bytes reached", self.total_out);
                    self.state = InflaterState::Done;
                }
                self.output.clear_bytes_used();
            }

            if written == output.len() || self.state == InflaterState::Done || suspended {
                break;
            }
            suspended = !self.decode(input)?;
        }

        Ok(written)
    }

    /// Advance decoding. Returns `false` when out of input.
    fn decode(&mut self, input: &mut InputBuffer<'_>) -> Result<bool> {
        if self.state == InflaterState::ReadingFinalBlockFlag {
            let Some(bit) = input.get_bits(1) else {
                return Ok(false);
            };
            self.final_block = bit == 1;
            self.state = InflaterState::ReadingBlockType;
        }

        if self.state == InflaterState::ReadingBlockType {
            let Some(block_type) = input.get_bits(2) else {
                return Ok(false);
            };
            (self.block_type, self.state) = match block_type {
                0 => (BlockType::Stored, InflaterState::StoredAligning),
                1 => (BlockType::Fixed, InflaterState::DecodeTop),
                2 => (BlockType::Dynamic, InflaterState::ReadingLiteralCodeCount),
                other => return Err(OxiflateError::invalid_block_type(other)),
            };
            log::debug!(
                "block header: type={:?}, final={}",
                self.block_type,
                self.final_block
            );
        }

        let progress = match self.block_type {
            BlockType::Dynamic if self.state < InflaterState::DecodeTop => {
                self.decode_dynamic_header(input)?
            }
            BlockType::Dynamic | BlockType::Fixed => self.decode_block(input)?,
            BlockType::Stored => self.decode_stored_block(input)?,
        };

        if progress == Progress::EndOfBlock && self.final_block {
            log::debug!("final block complete");
            self.state = InflaterState::Done;
        }

        Ok(progress != Progress::Suspended)
    }

    /// Decode literal/length and distance symbols of a Huffman block.
    fn decode_block(&mut self, input: &mut InputBuffer<'_>) -> Result<Progress> {
        let (literal_tree, distance_tree) = match self.block_type {
            BlockType::Fixed => (fixed_litlen_tree(), fixed_distance_tree()),
            _ => match (&self.literal_tree, &self.distance_tree) {
                (Some(literal), Some(distance)) => (literal, distance),
                _ => return Err(OxiflateError::unknown_state("Huffman block without trees")),
            },
        };

        let (max_match, distance_codes) = if self.deflate64 {
            (MAX_MATCH_DEFLATE64, DISTANCE_CODES_DEFLATE64)
        } else {
            (MAX_MATCH, DISTANCE_CODES)
        };

        let mut free_bytes = self.output.free_bytes();
        while free_bytes >= max_match {
            match self.state {
                InflaterState::DecodeTop => {
                    let Some(symbol) = literal_tree.get_next_symbol(input)? else {
                        return Ok(Progress::Suspended);
                    };

                    if symbol < END_OF_BLOCK {
                        self.output.write(symbol as u8);
                        free_bytes -= 1;
                    } else if symbol == END_OF_BLOCK {
                        self.state = InflaterState::ReadingFinalBlockFlag;
                        return Ok(Progress::EndOfBlock);
                    } else {
                        let (base, extra_bits) = length_base(symbol, self.deflate64)
                            .ok_or(OxiflateError::invalid_length_code(symbol))?;
                        self.length = base;
                        self.extra_bits = extra_bits;
                        self.state = InflaterState::HaveInitialLength;
                    }
                }
                InflaterState::HaveInitialLength => {
                    if self.extra_bits > 0 {
                        let Some(bits) = input.get_bits(self.extra_bits) else {
                            return Ok(Progress::Suspended);
                        };
                        self.length += bits as usize;
                    }
                    self.state = InflaterState::HaveFullLength;
                }
                InflaterState::HaveFullLength => {
                    let Some(code) = distance_tree.get_next_symbol(input)? else {
                        return Ok(Progress::Suspended);
                    };
                    if code as usize >= distance_codes {
                        return Err(OxiflateError::invalid_distance_code(code));
                    }
                    self.distance_code = code;
                    self.state = InflaterState::HaveDistCode;
                }
                InflaterState::HaveDistCode => {
                    let (base, extra_bits) = distance_base(self.distance_code, self.deflate64)
                        .ok_or(OxiflateError::invalid_distance_code(self.distance_code))?;
                    let distance = if extra_bits > 0 {
                        let Some(bits) = input.get_bits(extra_bits) else {
                            return Ok(Progress::Suspended);
                        };
                        base + bits as usize
                    } else {
                        base
                    };

                    self.output.write_length_distance(self.length, distance)?;
                    free_bytes -= self.length;
                    self.state = InflaterState::DecodeTop;
                }
                other => {
                    return Err(OxiflateError::unknown_state(format!("{:?}", other)));
                }
            }
        }

        Ok(Progress::Continue)
    }

    /// Copy a stored block through the window.
    fn decode_stored_block(&mut self, input: &mut InputBuffer<'_>) -> Result<Progress> {
        loop {
            match self.state {
                InflaterState::StoredAligning => {
                    input.skip_to_byte_boundary();
                    self.stored_header_read = 0;
                    self.state = InflaterState::ReadingStoredLength;
                }
                InflaterState::ReadingStoredLength => {
                    while self.stored_header_read < self.stored_header.len() {
                        let Some(byte) = input.get_bits(8) else {
                            return Ok(Progress::Suspended);
                        };
                        self.stored_header[self.stored_header_read] = byte as u8;
                        self.stored_header_read += 1;
                    }

                    let [len_lo, len_hi, nlen_lo, nlen_hi] = self.stored_header;
                    let length = u16::from_le_bytes([len_lo, len_hi]);
                    let complement = u16::from_le_bytes([nlen_lo, nlen_hi]);
                    if length != !complement {
                        return Err(OxiflateError::stored_length_mismatch(length, complement));
                    }

                    log::trace!("stored block of {} bytes", length);
                    self.block_length = length as usize;
                    self.state = InflaterState::CopyingStored;
                }
                InflaterState::CopyingStored => {
                    let copied = self.output.copy_from(input, self.block_length);
                    self.block_length -= copied;

                    if self.block_length == 0 {
                        self.state = InflaterState::ReadingFinalBlockFlag;
                        return Ok(Progress::EndOfBlock);
                    }
                    if self.output.free_bytes() == 0 {
                        return Ok(Progress::Continue);
                    }
                    return Ok(Progress::Suspended);
                }
                other => {
                    return Err(OxiflateError::unknown_state(format!("{:?}", other)));
                }
            }
        }
    }

    /// Read a dynamic block header and build its trees.
    fn decode_dynamic_header(&mut self, input: &mut InputBuffer<'_>) -> Result<Progress> {
        loop {
            match self.state {
                InflaterState::ReadingLiteralCodeCount => {
                    let Some(bits) = input.get_bits(5) else {
                        return Ok(Progress::Suspended);
                    };
                    self.literal_code_count = bits as usize + 257;
                    if self.literal_code_count > MAX_LITERAL_CODES {
                        return Err(OxiflateError::invalid_table(format!(
                            "Too many literal/length codes: {}",
                            self.literal_code_count
                        )));
                    }
                    self.state = InflaterState::ReadingDistanceCodeCount;
                }
                InflaterState::ReadingDistanceCodeCount => {
                    let Some(bits) = input.get_bits(5) else {
                        return Ok(Progress::Suspended);
                    };
                    self.distance_code_count = bits as usize + 1;
                    if !self.deflate64 && self.distance_code_count > DISTANCE_CODES {
                        return Err(OxiflateError::invalid_table(format!(
                            "Too many distance codes: {}",
                            self.distance_code_count
                        )));
                    }
                    self.state = InflaterState::ReadingCodeLengthCodeCount;
                }
                InflaterState::ReadingCodeLengthCodeCount => {
                    let Some(bits) = input.get_bits(4) else {
                        return Ok(Progress::Suspended);
                    };
                    self.code_length_code_count = bits as usize + 4;
                    self.loop_counter = 0;
                    self.state = InflaterState::ReadingCodeLengthCodes;
                }
                InflaterState::ReadingCodeLengthCodes => {
                    while self.loop_counter < self.code_length_code_count {
                        let Some(bits) = input.get_bits(3) else {
                            return Ok(Progress::Suspended);
                        };
                        self.code_length_lengths[CODE_LENGTH_ORDER[self.loop_counter]] = bits as u8;
                        self.loop_counter += 1;
                    }
                    for &symbol in &CODE_LENGTH_ORDER[self.code_length_code_count..] {
                        self.code_length_lengths[symbol] = 0;
                    }

                    self.code_length_tree =
                        Some(HuffmanTree::new(&self.code_length_lengths, Alphabet::CodeLength)?);
                    self.code_lengths.fill(0);
                    self.loop_counter = 0;
                    self.state = InflaterState::ReadingTreeCodesBefore;
                }
                InflaterState::ReadingTreeCodesBefore | InflaterState::ReadingTreeCodesAfter => {
                    return self.read_tree_codes(input);
                }
                other => {
                    return Err(OxiflateError::unknown_state(format!("{:?}", other)));
                }
            }
        }
    }

    /// Decode the run-length coded literal/length and distance code lengths.
    fn read_tree_codes(&mut self, input: &mut InputBuffer<'_>) -> Result<Progress> {
        let Some(tree) = self.code_length_tree.as_ref() else {
            return Err(OxiflateError::unknown_state("Code length tree missing"));
        };
        let total = self.literal_code_count + self.distance_code_count;

        while self.loop_counter < total {
            if self.state == InflaterState::ReadingTreeCodesBefore {
                let Some(symbol) = tree.get_next_symbol(input)? else {
                    return Ok(Progress::Suspended);
                };
                self.length_code = symbol;
            }

            match self.length_code {
                0..=15 => {
                    self.code_lengths[self.loop_counter] = self.length_code as u8;
                    self.loop_counter += 1;
                }
                16..=18 => {
                    let (extra_bits, base) = match self.length_code {
                        16 => (2, 3),
                        17 => (3, 3),
                        _ => (7, 11),
                    };
                    let Some(bits) = input.get_bits(extra_bits) else {
                        self.state = InflaterState::ReadingTreeCodesAfter;
                        return Ok(Progress::Suspended);
                    };
                    let repeat = base + bits as usize;

                    let value = if self.length_code == 16 {
                        if self.loop_counter == 0 {
                            return Err(OxiflateError::invalid_table(
                                "Repeat code with no previous length",
                            ));
                        }
                        self.code_lengths[self.loop_counter - 1]
                    } else {
                        0
                    };

                    let end = self.loop_counter + repeat;
                    if end > total {
                        return Err(OxiflateError::code_length_overflow(end, total));
                    }
                    self.code_lengths[self.loop_counter..end].fill(value);
                    self.loop_counter = end;
                }
                _ => return Err(OxiflateError::InvalidHuffmanCode),
            }
            self.state = InflaterState::ReadingTreeCodesBefore;
        }

        let (literal_lengths, distance_lengths) =
            self.code_lengths[..total].split_at(self.literal_code_count);
        if literal_lengths[END_OF_BLOCK as usize] == 0 {
            return Err(OxiflateError::MissingEndOfBlock);
        }

        log::trace!(
            "dynamic trees: {} literal/length codes, {} distance codes, {} code length codes",
            self.literal_code_count,
            self.distance_code_count,
            self.code_length_code_count
        );
        self.literal_tree = Some(HuffmanTree::new(literal_lengths, Alphabet::LiteralLength)?);
        self.distance_tree = Some(HuffmanTree::new(distance_lengths, Alphabet::Distance)?);
        self.code_length_tree = None;
        self.state = InflaterState::DecodeTop;

        Ok(Progress::Continue)
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for Inflater {
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
        Inflater::reset(self);
    }

    fn is_finished(&self) -> bool {
        self.finished()
    }
}

/// Decompress a complete raw DEFLATE stream.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    Inflater::new().decompress_all(data)
}

/// Decompress a complete raw DEFLATE64 stream.
pub fn inflate64(data: &[u8]) -> Result<Vec<u8>> {
    Inflater::deflate64().decompress_all(data)
}
