//! DEFLATE compression.
//!
//! This module implements DEFLATE compression as specified in RFC 1951.
//! Input is tokenized by the LZ77 match finder in blocks of at most
//! [`MAX_BLOCK_TOKENS`] tokens. For every block the exact bit cost of all
//! three encodings is computed and the cheapest one is emitted:
//! - Stored blocks (no compression)
//! - Fixed Huffman codes
//! - Dynamic Huffman codes
//!
//! Level 0 skips matching and always emits stored blocks.

use crate::block::BlockKind;
use crate::config::CompressionLevel;
use crate::huffman::{
    CODELEN_ALPHABET_SIZE, CodeTable, DISTANCE_ALPHABET_SIZE, END_OF_BLOCK, HuffmanBuilder,
    LITLEN_ALPHABET_SIZE, MAX_CODE_LENGTH, MAX_CODELEN_LENGTH,
};
use crate::lz77::{Lz77Encoder, Lz77Token};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_EXTRA_BITS, LENGTH_EXTRA_BITS, distance_to_code,
    fixed_distance_codes, fixed_distance_lengths, fixed_litlen_codes, fixed_litlen_lengths,
    length_to_code,
};
use rawflate_core::BitWriter;
use tracing::debug;

/// Maximum number of tokens collected before a block is emitted.
pub const MAX_BLOCK_TOKENS: usize = 16384;

/// Maximum payload of a single stored block.
const MAX_STORED_BLOCK: usize = 65535;

/// DEFLATE compressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deflater {
    level: CompressionLevel,
}

impl Deflater {
    /// Create a new DEFLATE compressor; levels above 9 are clamped.
    pub fn new(level: impl Into<CompressionLevel>) -> Self {
        Self {
            level: level.into(),
        }
    }

    /// The compression level in use.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compress `data` into a complete DEFLATE stream.
    pub fn compress(&self, data: &[u8]) -> Vec<u8> {
        let mut writer = BitWriter::with_capacity(data.len() / 2 + 64);

        if !self.level.match_config().finds_matches() {
            debug!(level = 0, bytes = data.len(), "storing input");
            write_stored(&mut writer, data, true);
            return writer.finish();
        }

        let mut encoder = Lz77Encoder::with_level(data, self.level);
        let mut tokens = Vec::with_capacity(MAX_BLOCK_TOKENS);

        loop {
            tokens.clear();
            let start = encoder.position();
            encoder.fill(&mut tokens, MAX_BLOCK_TOKENS);
            let is_final = encoder.is_finished();

            write_block(
                &mut writer,
                &tokens,
                &data[start..encoder.position()],
                is_final,
            );

            if is_final {
                break;
            }
        }

        writer.finish()
    }
}

/// Compress data using DEFLATE at the given level (0-9, clamped).
pub fn compress(data: &[u8], level: u8) -> Vec<u8> {
    Deflater::new(level).compress(data)
}

/// Symbol frequencies of one block.
#[derive(Debug, Clone)]
struct Frequencies {
    litlen: [u32; LITLEN_ALPHABET_SIZE],
    distance: [u32; DISTANCE_ALPHABET_SIZE],
}

impl Frequencies {
    /// Count symbols in tokens, plus the end-of-block symbol.
    fn count(tokens: &[Lz77Token]) -> Self {
        let mut litlen = [0u32; LITLEN_ALPHABET_SIZE];
        let mut distance = [0u32; DISTANCE_ALPHABET_SIZE];

        for token in tokens {
            match *token {
                Lz77Token::Literal(byte) => litlen[byte as usize] += 1,
                Lz77Token::Match {
                    length,
                    distance: dist,
                } => {
                    let (len_code, _, _) = length_to_code(length);
                    litlen[len_code as usize] += 1;
                    let (dist_code, _, _) = distance_to_code(dist);
                    distance[dist_code as usize] += 1;
                }
            }
        }
        litlen[END_OF_BLOCK as usize] += 1;

        Self { litlen, distance }
    }

    /// Bits needed for the token payload (including EOB) with these lengths.
    fn payload_bits(&self, litlen_lengths: &[u8], dist_lengths: &[u8]) -> u64 {
        let litlen: u64 = self
            .litlen
            .iter()
            .enumerate()
            .map(|(sym, &freq)| {
                let extra = if sym > END_OF_BLOCK as usize {
                    LENGTH_EXTRA_BITS[sym - 257]
                } else {
                    0
                };
                freq as u64 * (litlen_lengths[sym] as u64 + extra as u64)
            })
            .sum();

        let distance: u64 = self
            .distance
            .iter()
            .enumerate()
            .map(|(sym, &freq)| {
                freq as u64 * (dist_lengths[sym] as u64 + DISTANCE_EXTRA_BITS[sym] as u64)
            })
            .sum();

        litlen + distance
    }
}

/// One symbol of the run-length encoded code-length sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CodeLengthSymbol {
    symbol: u8,
    extra: u8,
    extra_bits: u8,
}

impl CodeLengthSymbol {
    fn plain(symbol: u8) -> Self {
        Self {
            symbol,
            extra: 0,
            extra_bits: 0,
        }
    }

    fn repeat(symbol: u8, extra: usize, extra_bits: u8) -> Self {
        Self {
            symbol,
            extra: extra as u8,
            extra_bits,
        }
    }
}

/// Run-length encode code lengths with symbols 16, 17 and 18.
fn rle_code_lengths(lengths: &[u8]) -> Vec<CodeLengthSymbol> {
    let mut symbols = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let len = lengths[i];
        let run = lengths[i..].iter().take_while(|&&l| l == len).count();
        let mut left = run;

        if len == 0 {
            while left >= 11 {
                let chunk = left.min(138);
                symbols.push(CodeLengthSymbol::repeat(18, chunk - 11, 7));
                left -= chunk;
            }
            if left >= 3 {
                symbols.push(CodeLengthSymbol::repeat(17, left - 3, 3));
                left = 0;
            }
        } else {
            // Code 16 repeats the previous length, which must be sent once.
            symbols.push(CodeLengthSymbol::plain(len));
            left -= 1;
            while left >= 3 {
                let chunk = left.min(6);
                symbols.push(CodeLengthSymbol::repeat(16, chunk - 3, 2));
                left -= chunk;
            }
        }
        symbols.extend(std::iter::repeat_n(CodeLengthSymbol::plain(len), left));

        i += run;
    }

    symbols
}

/// Dynamic Huffman trees for one block and their header encoding.
#[derive(Debug, Clone)]
struct DynamicTrees {
    litlen: CodeTable,
    distance: CodeTable,
    codelen: CodeTable,
    /// Number of literal/length lengths sent (257-286).
    hlit: usize,
    /// Number of distance lengths sent (1-30).
    hdist: usize,
    /// Number of code-length lengths sent (4-19).
    hclen: usize,
    rle: Vec<CodeLengthSymbol>,
}

impl DynamicTrees {
    fn build(freqs: &Frequencies) -> Self {
        let litlen_lengths =
            HuffmanBuilder::from_frequencies(&freqs.litlen, MAX_CODE_LENGTH as u8).build_lengths();
        let dist_lengths = HuffmanBuilder::from_frequencies(&freqs.distance, MAX_CODE_LENGTH as u8)
            .build_lengths();

        let hlit = last_used(&litlen_lengths).max(257);
        let hdist = last_used(&dist_lengths).max(1);

        let mut combined = Vec::with_capacity(hlit + hdist);
        combined.extend_from_slice(&litlen_lengths[..hlit]);
        combined.extend_from_slice(&dist_lengths[..hdist]);
        let rle = rle_code_lengths(&combined);

        let mut codelen_builder = HuffmanBuilder::new(CODELEN_ALPHABET_SIZE, MAX_CODELEN_LENGTH as u8);
        for sym in &rle {
            codelen_builder.add(sym.symbol as u16);
        }
        let codelen_lengths = codelen_builder.build_lengths();

        let hclen = CODE_LENGTH_ORDER
            .iter()
            .rposition(|&sym| codelen_lengths[sym] != 0)
            .map_or(0, |i| i + 1)
            .max(4);

        Self {
            litlen: CodeTable::from_lengths(&litlen_lengths),
            distance: CodeTable::from_lengths(&dist_lengths),
            codelen: CodeTable::from_lengths(&codelen_lengths),
            hlit,
            hdist,
            hclen,
            rle,
        }
    }

    /// Bits of the tree description following the 3-bit block header.
    fn header_bits(&self) -> u64 {
        let rle_bits: u64 = self
            .rle
            .iter()
            .map(|sym| self.codelen.length(sym.symbol as u16) as u64 + sym.extra_bits as u64)
            .sum();
        5 + 5 + 4 + 3 * self.hclen as u64 + rle_bits
    }

    fn write_header(&self, writer: &mut BitWriter) {
        writer.write_bits((self.hlit - 257) as u32, 5);
        writer.write_bits((self.hdist - 1) as u32, 5);
        writer.write_bits((self.hclen - 4) as u32, 4);

        for &sym in &CODE_LENGTH_ORDER[..self.hclen] {
            writer.write_bits(self.codelen.length(sym as u16) as u32, 3);
        }

        for sym in &self.rle {
            let (code, len) = self.codelen.get(sym.symbol as u16);
            writer.write_bits(code as u32, len);
            if sym.extra_bits > 0 {
                writer.write_bits(sym.extra as u32, sym.extra_bits);
            }
        }
    }
}

/// One past the index of the last nonzero length.
fn last_used(lengths: &[u8]) -> usize {
    lengths.iter().rposition(|&l| l != 0).map_or(0, |i| i + 1)
}

/// Exact size of `len` bytes as stored blocks starting at bit `bit_pos`.
fn stored_bits(bit_pos: u64, len: usize) -> u64 {
    let blocks = len.div_ceil(MAX_STORED_BLOCK).max(1) as u64;
    let first_pad = (8 - (bit_pos + 3) % 8) % 8;
    // Blocks after the first start byte-aligned, so they pad 5 bits.
    3 + first_pad + 32 + (blocks - 1) * (3 + 5 + 32) + 8 * len as u64
}

/// Emit one block in whichever encoding is cheapest.
///
/// `raw` is the input covered by `tokens`; stored blocks copy it verbatim.
fn write_block(writer: &mut BitWriter, tokens: &[Lz77Token], raw: &[u8], is_final: bool) {
    let freqs = Frequencies::count(tokens);
    let trees = DynamicTrees::build(&freqs);

    let stored_cost = stored_bits(writer.bits_written(), raw.len());
    let fixed_cost =
        3 + freqs.payload_bits(&fixed_litlen_lengths(), &fixed_distance_lengths());
    let dynamic_cost = 3
        + trees.header_bits()
        + freqs.payload_bits(trees.litlen.lengths(), trees.distance.lengths());

    let kind = if fixed_cost <= dynamic_cost && fixed_cost <= stored_cost {
        BlockKind::Fixed
    } else if dynamic_cost <= stored_cost {
        BlockKind::Dynamic
    } else {
        BlockKind::Stored
    };

    debug!(
        %kind,
        is_final,
        tokens = tokens.len(),
        bytes = raw.len(),
        stored_cost,
        fixed_cost,
        dynamic_cost,
        "emitting block"
    );

    match kind {
        BlockKind::Stored => write_stored(writer, raw, is_final),
        BlockKind::Fixed => {
            write_header(writer, kind, is_final);
            write_tokens(writer, tokens, fixed_litlen_codes(), fixed_distance_codes());
        }
        BlockKind::Dynamic => {
            write_header(writer, kind, is_final);
            trees.write_header(writer);
            write_tokens(writer, tokens, &trees.litlen, &trees.distance);
        }
    }
}

fn write_header(writer: &mut BitWriter, kind: BlockKind, is_final: bool) {
    writer.write_bit(is_final);
    writer.write_bits(kind.btype() as u32, 2);
}

/// Write `data` as stored blocks; empty input still produces one block.
fn write_stored(writer: &mut BitWriter, data: &[u8], is_final: bool) {
    let mut offset = 0;
    loop {
        let end = (offset + MAX_STORED_BLOCK).min(data.len());
        let last = end == data.len();

        write_header(writer, BlockKind::Stored, is_final && last);
        writer.align_to_byte();

        let len = (end - offset) as u16;
        writer.write_bits(len as u32, 16);
        writer.write_bits(!len as u32, 16);
        writer.write_bytes(&data[offset..end]);

        offset = end;
        if last {
            break;
        }
    }
}

/// Write the token stream and end-of-block with the given codes.
fn write_tokens(
    writer: &mut BitWriter,
    tokens: &[Lz77Token],
    litlen: &CodeTable,
    distance: &CodeTable,
) {
    for token in tokens {
        match *token {
            Lz77Token::Literal(byte) => {
                let (code, len) = litlen.get(byte as u16);
                writer.write_bits(code as u32, len);
            }
            Lz77Token::Match {
                length,
                distance: dist,
            } => {
                let (len_code, len_extra_bits, len_extra) = length_to_code(length);
                let (code, len) = litlen.get(len_code);
                writer.write_bits(code as u32, len);
                if len_extra_bits > 0 {
                    writer.write_bits(len_extra as u32, len_extra_bits);
                }

                let (dist_code, dist_extra_bits, dist_extra) = distance_to_code(dist);
                let (code, len) = distance.get(dist_code);
                writer.write_bits(code as u32, len);
                if dist_extra_bits > 0 {
                    writer.write_bits(dist_extra as u32, dist_extra_bits);
                }
            }
        }
    }

    let (code, len) = litlen.get(END_OF_BLOCK);
    writer.write_bits(code as u32, len);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflate::{Inflater, decompress};

    fn lcg_text(len: usize, alphabet: &[u8], mut seed: u64) -> Vec<u8> {
        (0..len)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                alphabet[(seed >> 33) as usize % alphabet.len()]
            })
            .collect()
    }

    fn block_kinds(stream: &[u8]) -> Vec<BlockKind> {
        let mut inflater = Inflater::new();
        inflater.inflate(stream).unwrap();
        inflater.blocks().iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_deflate_stored() {
        let input = b"Hello, World!";
        let compressed = compress(input, 0);

        // BFINAL=1, BTYPE=00, then LEN/NLEN on the next byte boundary.
        assert_eq!(compressed[0], 0b001);
        assert_eq!(&compressed[1..5], &[13, 0, !13u8, 0xFF]);
        assert_eq!(&compressed[5..], input);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_deflate_compressed() {
        let input = b"AAAAAAAAAABBBBBBBBBBCCCCCCCCCC";
        let compressed = compress(input, 6);

        assert!(
            compressed.len() < input.len(),
            "Compressed {} bytes to {} bytes",
            input.len(),
            compressed.len()
        );
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_deflate_empty() {
        for level in 0..=9 {
            let compressed = compress(b"", level);
            assert!(!compressed.is_empty());
            assert!(decompress(&compressed).unwrap().is_empty());
        }
        // A lone end-of-block in a fixed block beats an empty stored block.
        assert_eq!(compress(b"", 6), vec![0x03, 0x00]);
    }

    #[test]
    fn test_deflate_roundtrip() {
        let inputs = [
            b"Hello".to_vec(),
            b"The quick brown fox jumps over the lazy dog".to_vec(),
            vec![0u8; 1000],
            (0..=255).collect::<Vec<u8>>(),
        ];

        for input in &inputs {
            for level in 0..=9 {
                let compressed = compress(input, level);
                let decompressed = decompress(&compressed).unwrap();
                assert_eq!(
                    &decompressed,
                    input,
                    "Roundtrip failed for level {} with {} bytes",
                    level,
                    input.len()
                );
            }
        }
    }

    #[test]
    fn test_skewed_text_uses_dynamic_block() {
        let input = lcg_text(4000, b"etaoin shrdlu", 11);
        let compressed = compress(&input, 6);

        assert_eq!(block_kinds(&compressed), vec![BlockKind::Dynamic]);
        assert!(compressed.len() < input.len() * 6 / 10);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_random_bytes_fall_back_to_stored() {
        let bytes: Vec<u8> = (0..=255).collect();
        let input = lcg_text(5000, &bytes, 23);
        let compressed = compress(&input, 9);

        assert_eq!(block_kinds(&compressed), vec![BlockKind::Stored]);
        assert_eq!(compressed.len(), input.len() + 5);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_large_input_splits_blocks() {
        let input = lcg_text(300_000, b"ab", 5);
        let compressed = compress(&input, 1);

        let kinds = block_kinds(&compressed);
        assert!(kinds.len() > 1);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_stored_splits_at_65535() {
        let input = vec![7u8; 70_000];
        let compressed = compress(&input, 0);

        assert_eq!(block_kinds(&compressed), vec![BlockKind::Stored; 2]);
        assert_eq!(compressed.len(), 70_000 + 2 * 5);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_stored_bits_accounts_for_padding() {
        // Header ends at bit 3: 5 padding bits, then LEN/NLEN.
        assert_eq!(stored_bits(0, 0), 40);
        assert_eq!(stored_bits(5, 10), 35 + 80);
        assert_eq!(stored_bits(0, 65536), 40 + 40 + 8 * 65536);
    }

    #[test]
    fn test_rle_zero_runs() {
        let symbols = rle_code_lengths(&[0u8; 140]);
        assert_eq!(
            symbols,
            vec![
                CodeLengthSymbol::repeat(18, 127, 7),
                CodeLengthSymbol::plain(0),
                CodeLengthSymbol::plain(0),
            ]
        );

        let symbols = rle_code_lengths(&[0u8; 149]);
        assert_eq!(
            symbols,
            vec![
                CodeLengthSymbol::repeat(18, 127, 7),
                CodeLengthSymbol::repeat(18, 0, 7),
            ]
        );
    }

    #[test]
    fn test_rle_nonzero_runs() {
        let symbols = rle_code_lengths(&[7u8; 8]);
        assert_eq!(
            symbols,
            vec![
                CodeLengthSymbol::plain(7),
                CodeLengthSymbol::repeat(16, 3, 2),
                CodeLengthSymbol::plain(7),
            ]
        );

        let symbols = rle_code_lengths(&[3, 3, 0, 0, 0, 5]);
        assert_eq!(
            symbols,
            vec![
                CodeLengthSymbol::plain(3),
                CodeLengthSymbol::plain(3),
                CodeLengthSymbol::repeat(17, 0, 3),
                CodeLengthSymbol::plain(5),
            ]
        );
    }

    #[test]
    fn test_dynamic_header_counts() {
        let tokens = [Lz77Token::Literal(b'x'), Lz77Token::Literal(b'y')];
        let trees = DynamicTrees::build(&Frequencies::count(&tokens));

        assert_eq!(trees.hlit, 257);
        // No matches: the padded distance tree still carries two codes.
        assert_eq!(trees.hdist, 2);
        assert!((4..=19).contains(&trees.hclen));
        assert_eq!(trees.distance.lengths()[..2], [1, 1]);
    }

    #[test]
    fn test_level_clamped() {
        assert_eq!(Deflater::new(200u8).level(), CompressionLevel::BEST);
        let input = b"clamp clamp clamp clamp";
        assert_eq!(compress(input, 200), compress(input, 9));
    }
}
