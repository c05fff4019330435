//! DEFLATE decompression (inflate).
//!
//! This module implements the DEFLATE decompression algorithm as specified
//! in RFC 1951. It supports all three block types:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! The [`Inflater`] is an explicit state machine:
//!
//! ```text
//! BlockHeader -> Stored ---------------------> BlockEnd -> BlockHeader | Done
//!             -> Fixed ----------------------> BlockEnd
//!             -> DynamicTrees -> Dynamic ----> BlockEnd
//! ```
//!
//! Any error aborts the whole stream and discards the partial output.

use crate::block::{BlockInfo, BlockKind};
use crate::huffman::{
    CODELEN_ALPHABET_SIZE, DISTANCE_ALPHABET_SIZE, END_OF_BLOCK, LITLEN_ALPHABET_SIZE,
};
use crate::huft::{Alphabet, DecodeTable, HuftOp};
use crate::tables::{CODE_LENGTH_ORDER, fixed_distance_table, fixed_litlen_table};
use rawflate_core::error::{CorruptStreamError, Result};
use rawflate_core::{BitReader, OutputWindow};
use tracing::debug;

/// Header fields of the block being decoded.
#[derive(Debug, Clone, Copy)]
struct OpenBlock {
    kind: BlockKind,
    is_final: bool,
    /// Output length when the block started.
    start: usize,
}

#[derive(Debug)]
enum State {
    BlockHeader,
    Stored(OpenBlock),
    Fixed(OpenBlock),
    DynamicTrees(OpenBlock),
    Dynamic(OpenBlock, Box<(DecodeTable, DecodeTable)>),
    BlockEnd(OpenBlock),
    Done,
}

/// DEFLATE decompressor.
#[derive(Debug)]
pub struct Inflater {
    /// Output buffer; also the window back-references copy from.
    window: OutputWindow,
    /// Maximum output size, if any.
    limit: Option<usize>,
    state: State,
    /// One entry per completed block.
    blocks: Vec<BlockInfo>,
    /// Input bytes used by the stream, known once it is done.
    consumed: usize,
    finished: bool,
}

impl Inflater {
    /// Create a new DEFLATE decompressor without an output limit.
    pub fn new() -> Self {
        Self {
            window: OutputWindow::new(),
            limit: None,
            state: State::BlockHeader,
            blocks: Vec::new(),
            consumed: 0,
            finished: false,
        }
    }

    /// Create a decompressor that fails with `OutputLimitExceeded` instead
    /// of producing more than `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            window: OutputWindow::with_limit(limit),
            limit: Some(limit),
            ..Self::new()
        }
    }

    /// Reset the decompressor, keeping its output limit.
    pub fn reset(&mut self) {
        self.window = match self.limit {
            Some(limit) => OutputWindow::with_limit(limit),
            None => OutputWindow::new(),
        };
        self.state = State::BlockHeader;
        self.blocks.clear();
        self.consumed = 0;
        self.finished = false;
    }

    /// Decode one complete DEFLATE stream from `input`.
    ///
    /// Bytes after the final block are left untouched; see
    /// [`consumed_bytes`](Self::consumed_bytes).
    ///
    /// On error the partial output and block statistics are discarded.
    pub fn inflate(&mut self, input: &[u8]) -> Result<()> {
        self.reset();
        let mut reader = BitReader::new(input);

        if let Err(e) = self.run(&mut reader) {
            self.reset();
            return Err(e);
        }

        self.consumed = reader.consumed_bytes();
        self.finished = true;
        Ok(())
    }

    fn run(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        loop {
            self.state = match std::mem::replace(&mut self.state, State::Done) {
                State::BlockHeader => self.read_block_header(reader)?,
                State::Stored(block) => {
                    self.inflate_stored(reader)?;
                    State::BlockEnd(block)
                }
                State::Fixed(block) => {
                    let (litlen, distance) = (fixed_litlen_table()?, fixed_distance_table()?);
                    self.inflate_codes(reader, litlen, distance)?;
                    State::BlockEnd(block)
                }
                State::DynamicTrees(block) => {
                    let tables = Self::read_dynamic_tables(reader)?;
                    State::Dynamic(block, Box::new(tables))
                }
                State::Dynamic(block, tables) => {
                    self.inflate_codes(reader, &tables.0, &tables.1)?;
                    State::BlockEnd(block)
                }
                State::BlockEnd(block) => {
                    self.blocks.push(BlockInfo {
                        kind: block.kind,
                        is_final: block.is_final,
                        output_len: self.window.len() - block.start,
                    });
                    if block.is_final {
                        State::Done
                    } else {
                        State::BlockHeader
                    }
                }
                State::Done => return Ok(()),
            };
        }
    }

    fn read_block_header(&mut self, reader: &mut BitReader<'_>) -> Result<State> {
        let is_final = reader.read_bit()?;
        let btype = reader.read_bits(2)? as u8;
        let kind = BlockKind::from_btype(btype)
            .ok_or_else(|| CorruptStreamError::invalid_block_type(btype))?;

        debug!(
            %kind,
            is_final,
            bit_position = reader.bit_position(),
            output = self.window.len(),
            "block header"
        );

        let block = OpenBlock {
            kind,
            is_final,
            start: self.window.len(),
        };
        Ok(match kind {
            BlockKind::Stored => State::Stored(block),
            BlockKind::Fixed => State::Fixed(block),
            BlockKind::Dynamic => State::DynamicTrees(block),
        })
    }

    /// Inflate a stored (uncompressed) block.
    fn inflate_stored(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        reader.align_to_byte();

        let len = reader.read_bits(16)? as u16;
        let nlen = reader.read_bits(16)? as u16;
        if len != !nlen {
            return Err(CorruptStreamError::length_mismatch(len, nlen));
        }

        let bytes = reader.read_aligned_bytes(len as usize)?;
        self.window.write_literals(bytes)
    }

    /// Read the code-length header of a dynamic block and build its tables.
    fn read_dynamic_tables(reader: &mut BitReader<'_>) -> Result<(DecodeTable, DecodeTable)> {
        let hlit = reader.read_bits(5)? as usize + 257;
        let hdist = reader.read_bits(5)? as usize + 1;
        let hclen = reader.read_bits(4)? as usize + 4;

        if hlit > LITLEN_ALPHABET_SIZE {
            return Err(CorruptStreamError::invalid_lengths(
                "more than 286 literal/length codes",
            ));
        }
        if hdist > DISTANCE_ALPHABET_SIZE {
            return Err(CorruptStreamError::invalid_lengths(
                "more than 30 distance codes",
            ));
        }

        let mut codelen_lengths = [0u8; CODELEN_ALPHABET_SIZE];
        for &sym in &CODE_LENGTH_ORDER[..hclen] {
            codelen_lengths[sym] = reader.read_bits(3)? as u8;
        }
        let codelen_table = DecodeTable::build(&codelen_lengths, Alphabet::CodeLength)?;

        let total = hlit + hdist;
        let mut lengths = vec![0u8; total];
        let mut i = 0;

        while i < total {
            let entry = codelen_table.decode(reader)?;
            let (value, count) = match entry.value {
                len @ 0..=15 => (len as u8, 1),
                16 => {
                    if i == 0 {
                        return Err(CorruptStreamError::invalid_lengths(
                            "repeat with no previous length",
                        ));
                    }
                    (lengths[i - 1], 3 + reader.read_bits(2)? as usize)
                }
                17 => (0, 3 + reader.read_bits(3)? as usize),
                _ => (0, 11 + reader.read_bits(7)? as usize),
            };

            if i + count > total {
                return Err(CorruptStreamError::invalid_lengths(
                    "code length repeat past the end",
                ));
            }
            lengths[i..i + count].fill(value);
            i += count;
        }

        if lengths[END_OF_BLOCK as usize] == 0 {
            return Err(CorruptStreamError::invalid_lengths(
                "missing end-of-block code",
            ));
        }

        let litlen = DecodeTable::build(&lengths[..hlit], Alphabet::LiteralLength)?;
        let distance = DecodeTable::build(&lengths[hlit..], Alphabet::Distance)?;
        Ok((litlen, distance))
    }

    /// Decode literal/length and distance symbols until end of block.
    fn inflate_codes(
        &mut self,
        reader: &mut BitReader<'_>,
        litlen: &DecodeTable,
        distance: &DecodeTable,
    ) -> Result<()> {
        loop {
            let entry = litlen.decode(reader)?;
            match entry.op {
                HuftOp::Literal => self.window.write_literal(entry.value as u8)?,
                HuftOp::EndOfBlock => return Ok(()),
                HuftOp::Base { extra } => {
                    let length = entry.value as usize + reader.read_bits(extra)? as usize;

                    let start = reader.bit_position();
                    let dist = distance.decode(reader)?;
                    let HuftOp::Base { extra } = dist.op else {
                        return Err(CorruptStreamError::invalid_code(start));
                    };
                    let dist = dist.value as usize + reader.read_bits(extra)? as usize;

                    self.window.copy_match(dist, length)?;
                }
                HuftOp::Link { .. } | HuftOp::Invalid => {
                    return Err(CorruptStreamError::invalid_code(reader.bit_position()));
                }
            }
        }
    }

    /// Whether a complete stream has been decoded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Per-block statistics of the decoded stream.
    pub fn blocks(&self) -> &[BlockInfo] {
        &self.blocks
    }

    /// Input bytes the stream occupied, including the final partial byte.
    pub fn consumed_bytes(&self) -> usize {
        self.consumed
    }

    /// Get the decompressed output.
    pub fn output(&self) -> &[u8] {
        self.window.output()
    }

    /// Take ownership of the output buffer.
    pub fn into_output(self) -> Vec<u8> {
        self.window.into_output()
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

/// Decompress a DEFLATE stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Inflater::new();
    inflater.inflate(data)?;
    Ok(inflater.into_output())
}

/// Decompress a DEFLATE stream, refusing to produce more than `limit` bytes.
pub fn decompress_with_limit(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut inflater = Inflater::with_limit(limit);
    inflater.inflate(data)?;
    Ok(inflater.into_output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflate::compress;
    use crate::tables::{
        distance_to_code, fixed_distance_codes, fixed_litlen_codes, length_to_code,
    };
    use rawflate_core::BitWriter;
    use rawflate_core::error::ErrorKind;

    /// Symbols of a hand-assembled fixed-Huffman block.
    enum Sym {
        Lit(u8),
        Copy(u16, u16),
    }

    fn fixed_block(symbols: &[Sym]) -> Vec<u8> {
        let litlen = fixed_litlen_codes();
        let dist = fixed_distance_codes();
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b01, 2);

        for sym in symbols {
            match *sym {
                Sym::Lit(b) => {
                    let (code, len) = litlen.get(b as u16);
                    writer.write_bits(code as u32, len);
                }
                Sym::Copy(length, distance) => {
                    let (lc, lbits, lextra) = length_to_code(length);
                    let (code, len) = litlen.get(lc);
                    writer.write_bits(code as u32, len);
                    writer.write_bits(lextra as u32, lbits);
                    let (dc, dbits, dextra) = distance_to_code(distance);
                    let (code, len) = dist.get(dc);
                    writer.write_bits(code as u32, len);
                    writer.write_bits(dextra as u32, dbits);
                }
            }
        }
        let (code, len) = litlen.get(END_OF_BLOCK);
        writer.write_bits(code as u32, len);
        writer.finish()
    }

    #[test]
    fn test_inflate_stored() {
        // BFINAL=1, BTYPE=00, LEN=5, NLEN=!5, "Hello"
        let data = [
            0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o',
        ];
        assert_eq!(decompress(&data).unwrap(), b"Hello");
    }

    #[test]
    fn test_inflate_empty() {
        let data = [0x01, 0x00, 0x00, 0xFF, 0xFF];
        assert!(decompress(&data).unwrap().is_empty());
    }

    #[test]
    fn test_inflate_fixed_overlapping_copy() {
        let data = fixed_block(&[Sym::Lit(b'a'), Sym::Lit(b'b'), Sym::Copy(7, 2)]);
        assert_eq!(decompress(&data).unwrap(), b"ababababa");
    }

    #[test]
    fn test_invalid_block_type() {
        // BFINAL=1, BTYPE=11
        let err = decompress(&[0b111, 0, 0, 0]).unwrap_err();
        assert_eq!(err, CorruptStreamError::InvalidBlockType { btype: 3 });
    }

    #[test]
    fn test_length_mismatch() {
        let data = [0x01, 0x05, 0x00, 0xFB, 0xFF, b'H', b'e', b'l', b'l', b'o'];
        let err = decompress(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LengthMismatch);
    }

    #[test]
    fn test_distance_before_start() {
        let data = fixed_block(&[Sym::Lit(b'a'), Sym::Copy(3, 2)]);
        let err = decompress(&data).unwrap_err();
        assert_eq!(
            err,
            CorruptStreamError::InvalidDistance {
                distance: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_too_many_litlen_codes() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b10, 2);
        writer.write_bits(30, 5); // HLIT = 287
        writer.write_bits(0, 5);
        writer.write_bits(0, 4);
        writer.write_bits(0, 32);

        let err = decompress(&writer.finish()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCodeLengths);
    }

    #[test]
    fn test_repeat_without_previous_length() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b10, 2);
        writer.write_bits(0, 5);
        writer.write_bits(0, 5);
        writer.write_bits(0, 4); // HCLEN = 4: symbols 16, 17, 18, 0
        for len in [1, 0, 0, 1] {
            writer.write_bits(len, 3);
        }
        // Symbol 0 has code 0, symbol 16 code 1.
        writer.write_bits(1, 1);
        writer.write_bits(0, 16);

        let err = decompress(&writer.finish()).unwrap_err();
        assert_eq!(
            err,
            CorruptStreamError::InvalidCodeLengths {
                reason: "repeat with no previous length"
            }
        );
    }

    #[test]
    fn test_truncated_stream() {
        let input = b"The quick brown fox jumps over the lazy dog, again and again.";
        let compressed = compress(input, 6);

        let err = decompress(&compressed[..compressed.len() / 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEndOfStream);
        assert_eq!(
            decompress(&[]).unwrap_err().kind(),
            ErrorKind::UnexpectedEndOfStream
        );
    }

    #[test]
    fn test_block_info_and_trailing_bytes() {
        let input = vec![9u8; 70_000];
        let mut stream = compress(&input, 0);
        let len = stream.len();
        stream.extend_from_slice(&[0xDE, 0xAD]);

        let mut inflater = Inflater::new();
        inflater.inflate(&stream).unwrap();

        assert!(inflater.is_finished());
        assert_eq!(inflater.consumed_bytes(), len);
        assert_eq!(
            inflater.blocks(),
            &[
                BlockInfo {
                    kind: BlockKind::Stored,
                    is_final: false,
                    output_len: 65535
                },
                BlockInfo {
                    kind: BlockKind::Stored,
                    is_final: true,
                    output_len: 4465
                },
            ]
        );
        assert_eq!(inflater.into_output(), input);
    }

    #[test]
    fn test_output_limit() {
        let input = vec![0u8; 1000];
        let compressed = compress(&input, 6);

        assert_eq!(
            decompress_with_limit(&compressed, 999).unwrap_err(),
            CorruptStreamError::OutputLimitExceeded { limit: 999 }
        );
        assert_eq!(decompress_with_limit(&compressed, 1000).unwrap(), input);
    }

    #[test]
    fn test_inflater_reusable() {
        let first = compress(b"first stream", 6);
        let second = compress(b"second", 1);

        let mut inflater = Inflater::new();
        inflater.inflate(&first).unwrap();
        assert_eq!(inflater.output(), b"first stream");
        inflater.inflate(&second).unwrap();
        assert_eq!(inflater.output(), b"second");
        assert_eq!(inflater.blocks().len(), 1);
    }

    #[test]
    fn test_error_discards_partial_output() {
        let input = b"decoded bytes stay private until the final block ends ".repeat(50);
        let compressed = compress(&input, 6);
        let truncated = &compressed[..compressed.len() - 3];

        let mut inflater = Inflater::new();
        let err = inflater.inflate(truncated).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEndOfStream);
        assert!(inflater.output().is_empty());
        assert!(inflater.blocks().is_empty());
        assert!(!inflater.is_finished());
        assert!(inflater.into_output().is_empty());
    }
}
