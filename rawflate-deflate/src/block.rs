//! Block types shared by the compressor and decompressor.

use std::fmt;

/// DEFLATE block encoding (the BTYPE header field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// BTYPE 00: raw bytes behind a LEN/NLEN header.
    Stored,
    /// BTYPE 01: the fixed Huffman codes of RFC 1951 3.2.6.
    Fixed,
    /// BTYPE 10: Huffman codes transmitted in the block header.
    Dynamic,
}

impl BlockKind {
    /// The two-bit BTYPE value.
    pub fn btype(self) -> u8 {
        match self {
            Self::Stored => 0b00,
            Self::Fixed => 0b01,
            Self::Dynamic => 0b10,
        }
    }

    /// Parse a BTYPE value; `None` for the reserved `11`.
    pub fn from_btype(btype: u8) -> Option<Self> {
        match btype {
            0b00 => Some(Self::Stored),
            0b01 => Some(Self::Fixed),
            0b10 => Some(Self::Dynamic),
            _ => None,
        }
    }

    /// Lowercase name used in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Fixed => "fixed",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary of one decoded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// How the block was encoded.
    pub kind: BlockKind,
    /// Whether BFINAL was set.
    pub is_final: bool,
    /// Bytes this block contributed to the output.
    pub output_len: usize,
}
