//! Multi-level Huffman decode tables.
//!
//! A [`DecodeTable`] is a direct-indexed table keyed by the next `root_bits`
//! bits of input (9 for literal/length, 6 for distance, 7 for the code-length
//! alphabet). Codes no longer than the root width are replicated into every
//! slot whose low bits match the bit-reversed code. Longer codes share a root
//! slot per prefix; that slot links to a sub-table indexed by the following
//! bits. Sub-tables live in the same arena `Vec` as the root table and are
//! addressed by offset, so a lookup takes at most two probes.
//!
//! Entries carry the decoded meaning directly: a literal, end of block, or a
//! length/distance base plus its extra-bit count.

use crate::huffman::{MAX_CODE_LENGTH, canonical_codes, reverse_bits};
use crate::tables::{DISTANCE_BASE, DISTANCE_EXTRA_BITS, LENGTH_BASE, LENGTH_EXTRA_BITS};
use rawflate_core::BitReader;
use rawflate_core::error::{CorruptStreamError, Result};

/// Which alphabet a table decodes; decides root width and entry meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// Literal/length alphabet (0-285; 286 and 287 are unused code points).
    LiteralLength,
    /// Distance alphabet (0-29; 30 and 31 are unused code points).
    Distance,
    /// Code-length alphabet (0-18).
    CodeLength,
}

impl Alphabet {
    /// Root table width in bits.
    pub fn root_bits(self) -> u8 {
        match self {
            Self::LiteralLength => 9,
            Self::Distance => 6,
            Self::CodeLength => 7,
        }
    }

    fn entry(self, symbol: usize, bits: u8) -> HuftEntry {
        let (op, value) = match self {
            Self::LiteralLength => match symbol {
                0..=255 => (HuftOp::Literal, symbol as u16),
                256 => (HuftOp::EndOfBlock, 0),
                257..=285 => (
                    HuftOp::Base {
                        extra: LENGTH_EXTRA_BITS[symbol - 257],
                    },
                    LENGTH_BASE[symbol - 257],
                ),
                _ => return HuftEntry::INVALID,
            },
            Self::Distance => match symbol {
                0..=29 => (
                    HuftOp::Base {
                        extra: DISTANCE_EXTRA_BITS[symbol],
                    },
                    DISTANCE_BASE[symbol],
                ),
                _ => return HuftEntry::INVALID,
            },
            Self::CodeLength => (HuftOp::Literal, symbol as u16),
        };
        HuftEntry { op, bits, value }
    }
}

/// What a table entry tells the decoder to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuftOp {
    /// `value` is the symbol itself (literal byte or code-length symbol).
    Literal,
    /// End of block (symbol 256).
    EndOfBlock,
    /// `value` is a base length or distance, refined by `extra` raw bits.
    Base {
        /// Number of extra bits following the code.
        extra: u8,
    },
    /// Continue in the sub-table at `offset`, indexed by the next `bits` bits.
    Link {
        /// Arena offset of the sub-table.
        offset: usize,
        /// Sub-table width in bits.
        bits: u8,
    },
    /// No code maps here.
    Invalid,
}

/// One slot of a decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuftEntry {
    /// Decoded meaning.
    pub op: HuftOp,
    /// Code bits consumed at this table level.
    pub bits: u8,
    /// Symbol or base value, depending on `op`.
    pub value: u16,
}

impl HuftEntry {
    const INVALID: Self = Self {
        op: HuftOp::Invalid,
        bits: 0,
        value: 0,
    };
}

/// Arena of a root table plus its sub-tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeTable {
    entries: Vec<HuftEntry>,
    root_bits: u8,
}

impl DecodeTable {
    /// Build a decode table from code lengths.
    ///
    /// `lengths[i]` is the bit length of symbol `i`, 0 meaning unused.
    /// Over-subscribed length sets are rejected; incomplete ones are
    /// accepted and their unused code points decode as invalid.
    pub fn build(lengths: &[u8], alphabet: Alphabet) -> Result<Self> {
        let mut bl_count = [0u32; MAX_CODE_LENGTH + 1];
        for &len in lengths {
            if len as usize > MAX_CODE_LENGTH {
                return Err(CorruptStreamError::invalid_lengths(
                    "code length exceeds 15 bits",
                ));
            }
            bl_count[len as usize] += 1;
        }

        let mut left = 1i64;
        for &count in &bl_count[1..] {
            left = (left << 1) - count as i64;
            if left < 0 {
                return Err(CorruptStreamError::invalid_lengths("over-subscribed code"));
            }
        }

        let max_len = lengths.iter().copied().max().unwrap_or(0);
        let root_bits = alphabet.root_bits().min(max_len).max(1);
        let root_size = 1usize << root_bits;
        let root_mask = root_size - 1;

        let codes = canonical_codes(lengths);
        let mut entries = vec![HuftEntry::INVALID; root_size];

        // Widest remainder under each root prefix decides the sub-table size.
        let mut sub_bits = vec![0u8; root_size];
        for (&code, &len) in codes.iter().zip(lengths) {
            if len > root_bits {
                let prefix = reverse_bits(code, len) as usize & root_mask;
                sub_bits[prefix] = sub_bits[prefix].max(len - root_bits);
            }
        }
        for (prefix, &bits) in sub_bits.iter().enumerate() {
            if bits > 0 {
                let offset = entries.len();
                entries.resize(offset + (1 << bits), HuftEntry::INVALID);
                entries[prefix] = HuftEntry {
                    op: HuftOp::Link { offset, bits },
                    bits: root_bits,
                    value: 0,
                };
            }
        }

        for (symbol, (&code, &len)) in codes.iter().zip(lengths).enumerate() {
            if len == 0 {
                continue;
            }
            let reversed = reverse_bits(code, len) as usize;

            if len <= root_bits {
                let entry = alphabet.entry(symbol, len);
                for slot in (reversed..root_size).step_by(1 << len) {
                    entries[slot] = entry;
                }
            } else {
                let HuftOp::Link { offset, bits } = entries[reversed & root_mask].op else {
                    continue;
                };
                let rest_len = len - root_bits;
                let entry = alphabet.entry(symbol, rest_len);
                for slot in ((reversed >> root_bits)..(1 << bits)).step_by(1 << rest_len) {
                    entries[offset + slot] = entry;
                }
            }
        }

        tracing::trace!(
            ?alphabet,
            symbols = lengths.iter().filter(|&&l| l > 0).count(),
            root_bits,
            entries = entries.len(),
            "built decode table"
        );

        Ok(Self { entries, root_bits })
    }

    /// Root table width in bits.
    pub fn root_bits(&self) -> u8 {
        self.root_bits
    }

    /// Total entries across the root table and all sub-tables.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Decode one symbol, consuming exactly its code bits.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<HuftEntry> {
        let start = reader.bit_position();

        let mut width = self.root_bits;
        let mut entry = self.entries[reader.peek_bits(width) as usize];

        if let HuftOp::Link { offset, bits } = entry.op {
            reader.skip_bits(self.root_bits)?;
            width = bits;
            entry = self.entries[offset + reader.peek_bits(width) as usize];
        }

        if entry.op == HuftOp::Invalid {
            // Zero padding past the end may be what made the code invalid.
            return if reader.available_bits() < width as u64 {
                Err(CorruptStreamError::unexpected_end(reader.bit_position()))
            } else {
                Err(CorruptStreamError::invalid_code(start))
            };
        }

        reader.skip_bits(entry.bits)?;
        Ok(entry)
    }
}
