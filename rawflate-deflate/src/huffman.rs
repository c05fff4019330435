//! Huffman code construction for DEFLATE compression.
//!
//! DEFLATE uses canonical Huffman codes: only the code length of each symbol
//! is transmitted, and codes of the same length are assigned consecutive
//! values in symbol order. [`canonical_codes`] is the single implementation
//! of that assignment; the decoder's table builder uses it as well, so both
//! directions always agree on the symbol to code mapping.
//!
//! # Alphabets
//!
//! DEFLATE uses three Huffman alphabets:
//! - **Literal/Length**: 0-285 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-29 (back-reference distances)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman trees)

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Maximum code length for the literal/length and distance codes.
pub const MAX_CODE_LENGTH: usize = 15;

/// Maximum code length for the code-length alphabet.
pub const MAX_CODELEN_LENGTH: usize = 7;

/// Size of the literal/length alphabet (0-285).
pub const LITLEN_ALPHABET_SIZE: usize = 286;

/// Size of the distance alphabet (0-29).
pub const DISTANCE_ALPHABET_SIZE: usize = 30;

/// Size of the code length alphabet (0-18).
pub const CODELEN_ALPHABET_SIZE: usize = 19;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// Assign canonical codes to a list of code lengths (RFC 1951 3.2.2).
///
/// `lengths[i]` is the bit length of symbol `i`, 0 meaning unused. The
/// result holds the MSB-first code of every symbol (0 for unused ones).
/// Lengths above [`MAX_CODE_LENGTH`] are treated as unused; callers
/// validate before relying on the result.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u16> {
    let mut bl_count = [0u32; MAX_CODE_LENGTH + 1];
    for &len in lengths {
        if len > 0 && len as usize <= MAX_CODE_LENGTH {
            bl_count[len as usize] += 1;
        }
    }

    let mut next_code = [0u32; MAX_CODE_LENGTH + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_CODE_LENGTH {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    lengths
        .iter()
        .map(|&len| {
            if len == 0 || len as usize > MAX_CODE_LENGTH {
                return 0;
            }
            let code = next_code[len as usize];
            next_code[len as usize] += 1;
            code as u16
        })
        .collect()
}

/// Reverse the low `length` bits of `code`.
///
/// Huffman codes are defined MSB-first but travel through the LSB-first
/// bitstream, so both the encoder and the decode tables work with the
/// reversed form.
#[inline]
pub fn reverse_bits(code: u16, length: u8) -> u16 {
    if length == 0 {
        return 0;
    }
    code.reverse_bits() >> (16 - length as u32)
}

/// Encode-side code table: bit-reversed code and length per symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: Vec<u16>,
    lengths: Vec<u8>,
}

impl CodeTable {
    /// Build the canonical codes for the given lengths.
    pub fn from_lengths(lengths: &[u8]) -> Self {
        let codes = canonical_codes(lengths)
            .into_iter()
            .zip(lengths)
            .map(|(code, &len)| reverse_bits(code, len))
            .collect();

        Self {
            codes,
            lengths: lengths.to_vec(),
        }
    }

    /// `(reversed code, length)` of a symbol; length 0 for unused symbols.
    #[inline]
    pub fn get(&self, symbol: u16) -> (u16, u8) {
        let i = symbol as usize;
        (self.codes[i], self.lengths[i])
    }

    /// Code length of a symbol.
    #[inline]
    pub fn length(&self, symbol: u16) -> u8 {
        self.lengths[symbol as usize]
    }

    /// All code lengths, indexed by symbol.
    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }
}

/// Builder for length-limited Huffman code lengths from frequencies.
#[derive(Debug, Clone)]
pub struct HuffmanBuilder {
    frequencies: Vec<u32>,
    max_length: u8,
}

/// Node of the merge tree; leaves carry a symbol, inner nodes two children.
#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf(usize),
    Inner(usize, usize),
}

impl HuffmanBuilder {
    /// Create a new Huffman builder.
    pub fn new(alphabet_size: usize, max_length: u8) -> Self {
        debug_assert!(
            (1..=MAX_CODE_LENGTH as u8).contains(&max_length),
            "Unsupported length limit {}",
            max_length
        );
        Self {
            frequencies: vec![0; alphabet_size],
            max_length,
        }
    }

    /// Build from an existing frequency table.
    pub fn from_frequencies(frequencies: &[u32], max_length: u8) -> Self {
        let mut builder = Self::new(frequencies.len(), max_length);
        builder.frequencies.copy_from_slice(frequencies);
        builder
    }

    /// Add a symbol occurrence.
    pub fn add(&mut self, symbol: u16) {
        self.add_count(symbol, 1);
    }

    /// Add multiple occurrences of a symbol.
    pub fn add_count(&mut self, symbol: u16, count: u32) {
        if let Some(freq) = self.frequencies.get_mut(symbol as usize) {
            *freq = freq.saturating_add(count);
        }
    }

    /// Build code lengths from the frequencies.
    ///
    /// Returns an array where `result[i]` is the code length for symbol `i`
    /// (0 for absent symbols). At least two symbols always receive a code,
    /// so even a block with a single distinct symbol transmits a complete
    /// tree. No length exceeds the builder's limit.
    pub fn build_lengths(&self) -> Vec<u8> {
        let n = self.frequencies.len();
        let mut lengths = vec![0u8; n];

        let mut used: Vec<(u32, usize)> = self
            .frequencies
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f > 0)
            .map(|(i, &f)| (f, i))
            .collect();

        // Pad with the lowest unused symbols until there are two.
        let mut filler = 0;
        while used.len() < 2 && filler < n {
            if self.frequencies[filler] == 0 {
                used.push((1, filler));
            }
            filler += 1;
        }

        if used.len() == 1 {
            lengths[used[0].1] = 1;
            return lengths;
        }
        if used.is_empty() {
            return lengths;
        }

        let depths = Self::tree_depths(&used);

        // Count leaves per depth, folding anything too deep into the limit.
        let max_len = self.max_length as usize;
        let mut bl_count = vec![0u32; max_len + 1];
        let mut overflow = false;
        for &depth in &depths {
            if depth > max_len {
                overflow = true;
            }
            bl_count[depth.min(max_len)] += 1;
        }
        if overflow {
            Self::limit_lengths(&mut bl_count, max_len);
        }

        // Most frequent symbols take the shortest codes.
        used.sort_by_key(|&(f, sym)| (Reverse(f), sym));
        let mut symbols = used.iter();
        for (len, &count) in bl_count.iter().enumerate().skip(1) {
            for _ in 0..count {
                if let Some(&(_, sym)) = symbols.next() {
                    lengths[sym] = len as u8;
                }
            }
        }

        lengths
    }

    /// Leaf depths of an optimal (unbounded) Huffman tree, in `used` order.
    fn tree_depths(used: &[(u32, usize)]) -> Vec<usize> {
        let mut nodes: Vec<Node> = (0..used.len()).map(Node::Leaf).collect();

        // Ties break on node index so the shape is deterministic.
        let mut heap: BinaryHeap<Reverse<(u64, usize)>> = used
            .iter()
            .enumerate()
            .map(|(i, &(f, _))| Reverse((f as u64, i)))
            .collect();

        while heap.len() > 1 {
            let (Some(Reverse((fa, a))), Some(Reverse((fb, b)))) = (heap.pop(), heap.pop()) else {
                break;
            };
            nodes.push(Node::Inner(a, b));
            heap.push(Reverse((fa + fb, nodes.len() - 1)));
        }

        let mut depths = vec![0usize; used.len()];
        let mut stack = vec![(nodes.len() - 1, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match nodes[idx] {
                Node::Leaf(i) => depths[i] = depth,
                Node::Inner(a, b) => {
                    stack.push((a, depth + 1));
                    stack.push((b, depth + 1));
                }
            }
        }
        depths
    }

    /// Restore the Kraft equality after deep leaves were clamped to
    /// `max_len`.
    ///
    /// Each pass removes one leaf from the deepest level and splits the
    /// deepest shorter leaf into two, which shrinks the Kraft sum by exactly
    /// one unit of `2^-max_len`.
    fn limit_lengths(bl_count: &mut [u32], max_len: usize) {
        let mut total: u64 = (1..=max_len)
            .map(|len| (bl_count[len] as u64) << (max_len - len))
            .sum();

        while total > 1u64 << max_len {
            bl_count[max_len] -= 1;
            for len in (1..max_len).rev() {
                if bl_count[len] != 0 {
                    bl_count[len] -= 1;
                    bl_count[len + 1] += 2;
                    break;
                }
            }
            total -= 1;
        }
    }
}
