//! Constant tables for DEFLATE (RFC 1951).
//!
//! Base values and extra-bit counts for the length and distance alphabets,
//! the code-length permutation, and the fixed Huffman code lengths. The
//! fixed code and decode tables built from those lengths are cached
//! process-wide after first use.

use crate::huffman::CodeTable;
use crate::huft::{Alphabet, DecodeTable};
use rawflate_core::error::Result;
use std::sync::OnceLock;

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6).
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub fn fixed_litlen_lengths() -> [u8; 288] {
    let mut lengths = [0u8; 288];
    lengths[..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..].fill(8);
    lengths
}

/// Fixed distance code lengths (RFC 1951 Section 3.2.6).
///
/// All 30 distance codes use 5 bits; the two unused code points 30 and 31
/// are part of the fixed code space too.
pub fn fixed_distance_lengths() -> [u8; 32] {
    [5u8; 32]
}

/// Encode-side fixed literal/length codes, cached after first use.
pub fn fixed_litlen_codes() -> &'static CodeTable {
    static CODES: OnceLock<CodeTable> = OnceLock::new();
    CODES.get_or_init(|| CodeTable::from_lengths(&fixed_litlen_lengths()))
}

/// Encode-side fixed distance codes, cached after first use.
pub fn fixed_distance_codes() -> &'static CodeTable {
    static CODES: OnceLock<CodeTable> = OnceLock::new();
    CODES.get_or_init(|| CodeTable::from_lengths(&fixed_distance_lengths()))
}

/// Decode table for the fixed literal/length code.
pub fn fixed_litlen_table() -> Result<&'static DecodeTable> {
    static TABLE: OnceLock<Result<DecodeTable>> = OnceLock::new();

    TABLE
        .get_or_init(|| DecodeTable::build(&fixed_litlen_lengths(), Alphabet::LiteralLength))
        .as_ref()
        .map_err(Clone::clone)
}

/// Decode table for the fixed distance code.
pub fn fixed_distance_table() -> Result<&'static DecodeTable> {
    static TABLE: OnceLock<Result<DecodeTable>> = OnceLock::new();

    TABLE
        .get_or_init(|| DecodeTable::build(&fixed_distance_lengths(), Alphabet::Distance))
        .as_ref()
        .map_err(Clone::clone)
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
    258, // 285: 0 extra bits (special case)
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

/// Distance code base values (RFC 1951 Section 3.2.5).
pub const DISTANCE_BASE: [u16; 30] = [
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
];

/// Number of extra bits for distance codes 0-29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
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
];

/// Order of code length codes in dynamic block header.
///
/// Code length codes are transmitted in this order (RFC 1951 Section 3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Convert a length value (3-258) to `(code, extra_bits, extra_value)`.
pub fn length_to_code(length: u16) -> (u16, u8, u16) {
    debug_assert!(
        (3..=258).contains(&length),
        "Length out of range: {}",
        length
    );

    let length = length as usize;

    let code = match length {
        3..=10 => length - 3 + 257,
        11..=18 => (length - 11) / 2 + 265,
        19..=34 => (length - 19) / 4 + 269,
        35..=66 => (length - 35) / 8 + 273,
        67..=130 => (length - 67) / 16 + 277,
        131..=257 => (length - 131) / 32 + 281,
        _ => 285,
    };

    let base = LENGTH_BASE[code - 257] as usize;
    let extra_bits = LENGTH_EXTRA_BITS[code - 257];
    let extra_value = (length - base) as u16;

    (code as u16, extra_bits, extra_value)
}

/// Convert a distance value (1-32768) to `(code, extra_bits, extra_value)`.
pub fn distance_to_code(distance: u16) -> (u16, u8, u16) {
    debug_assert!(distance >= 1, "Distance out of range: {}", distance);

    // Codes come in pairs per power of two: 2 * (bit index) plus the
    // next-highest bit picks the code for distances above 4.
    let code = if distance <= 4 {
        distance as usize - 1
    } else {
        let d = (distance - 1) as u32;
        let top = 31 - d.leading_zeros();
        (2 * top + ((d >> (top - 1)) & 1)) as usize
    };

    let base = DISTANCE_BASE[code];
    let extra_bits = DISTANCE_EXTRA_BITS[code];
    let extra_value = distance - base;

    (code as u16, extra_bits, extra_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_length(code: u16, extra: u16) -> u16 {
        LENGTH_BASE[(code - 257) as usize] + extra
    }

    fn decode_distance(code: u16, extra: u16) -> u16 {
        DISTANCE_BASE[code as usize] + extra
    }

    #[test]
    fn test_fixed_litlen_lengths() {
        let lengths = fixed_litlen_lengths();

        assert_eq!(lengths[0], 8);
        assert_eq!(lengths[143], 8);
        assert_eq!(lengths[144], 9);
        assert_eq!(lengths[255], 9);
        assert_eq!(lengths[256], 7); // End of block
        assert_eq!(lengths[279], 7);
        assert_eq!(lengths[280], 8);
        assert_eq!(lengths[287], 8);
    }

    #[test]
    fn test_fixed_tables() {
        assert!(fixed_litlen_table().is_ok());
        assert!(fixed_distance_table().is_ok());

        // End of block is the 7-bit all-zero code.
        assert_eq!(fixed_litlen_codes().get(256), (0, 7));
        assert_eq!(fixed_distance_codes().get(29).1, 5);
    }

    #[test]
    fn test_length_to_code_roundtrip() {
        for length in 3..=258 {
            let (code, extra_bits, extra_value) = length_to_code(length);
            assert!(extra_value < (1 << extra_bits));
            assert_eq!(
                decode_length(code, extra_value),
                length,
                "Roundtrip failed for length {}: code={}, extra_bits={}",
                length,
                code,
                extra_bits
            );
        }
    }

    #[test]
    fn test_distance_to_code_roundtrip() {
        for distance in 1..=32768u16 {
            let (code, extra_bits, extra_value) = distance_to_code(distance);
            assert!(u32::from(extra_value) < (1u32 << extra_bits));
            assert_eq!(
                decode_distance(code, extra_value),
                distance,
                "Roundtrip failed for distance {}: code={}",
                distance,
                code
            );
        }
    }

    #[test]
    fn test_specific_lengths() {
        assert_eq!(length_to_code(3), (257, 0, 0));
        assert_eq!(length_to_code(10), (264, 0, 0));
        assert_eq!(length_to_code(11), (265, 1, 0));
        assert_eq!(length_to_code(12), (265, 1, 1));
        assert_eq!(length_to_code(257), (284, 5, 30));
        assert_eq!(length_to_code(258), (285, 0, 0));
    }

    #[test]
    fn test_specific_distances() {
        assert_eq!(distance_to_code(1), (0, 0, 0));
        assert_eq!(distance_to_code(4), (3, 0, 0));
        assert_eq!(distance_to_code(5), (4, 1, 0));
        assert_eq!(distance_to_code(6), (4, 1, 1));
        assert_eq!(distance_to_code(7), (5, 1, 0));
        assert_eq!(distance_to_code(24577), (29, 13, 0));
        assert_eq!(distance_to_code(32768), (29, 13, 8191));
    }
}
