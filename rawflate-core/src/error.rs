//! Error types for rawflate operations.
//!
//! Compression has no error path. Every failure reported here comes from
//! decoding a malformed DEFLATE stream and aborts the whole decode: no
//! partial output is handed back to the caller.

use thiserror::Error;

/// A DEFLATE stream that cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptStreamError {
    /// Block header carried the reserved block type `11`.
    #[error("Invalid block type: {btype:#04b}")]
    InvalidBlockType {
        /// The BTYPE bits that were read.
        btype: u8,
    },

    /// Stored block whose NLEN is not the one's complement of LEN.
    #[error("Stored block length mismatch: LEN={len:#06x}, NLEN={nlen:#06x}")]
    LengthMismatch {
        /// LEN field.
        len: u16,
        /// NLEN field.
        nlen: u16,
    },

    /// Back-reference reaching before the start of the output.
    #[error("Invalid back-reference distance: {distance} exceeds {available} bytes produced")]
    InvalidDistance {
        /// The decoded distance.
        distance: usize,
        /// Bytes produced so far.
        available: usize,
    },

    /// The next bits do not form any code of the active Huffman table.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidCode {
        /// Bit position where the code started.
        bit_position: u64,
    },

    /// Input ran out before a field or symbol was complete.
    #[error("Unexpected end of stream at bit position {bit_position}")]
    UnexpectedEndOfStream {
        /// Bit position where more input was needed.
        bit_position: u64,
    },

    /// A dynamic block header described an unusable code.
    #[error("Invalid code lengths: {reason}")]
    InvalidCodeLengths {
        /// What was wrong with the lengths.
        reason: &'static str,
    },

    /// Decoded output would exceed the caller-supplied limit.
    #[error("Decompressed output exceeds limit of {limit} bytes")]
    OutputLimitExceeded {
        /// The configured limit.
        limit: usize,
    },
}

/// Fieldless discriminant of [`CorruptStreamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`CorruptStreamError::InvalidBlockType`].
    InvalidBlockType,
    /// See [`CorruptStreamError::LengthMismatch`].
    LengthMismatch,
    /// See [`CorruptStreamError::InvalidDistance`].
    InvalidDistance,
    /// See [`CorruptStreamError::InvalidCode`].
    InvalidCode,
    /// See [`CorruptStreamError::UnexpectedEndOfStream`].
    UnexpectedEndOfStream,
    /// See [`CorruptStreamError::InvalidCodeLengths`].
    InvalidCodeLengths,
    /// See [`CorruptStreamError::OutputLimitExceeded`].
    OutputLimitExceeded,
}

/// Result type alias for rawflate operations.
pub type Result<T> = std::result::Result<T, CorruptStreamError>;

impl CorruptStreamError {
    /// Create an invalid block type error.
    pub fn invalid_block_type(btype: u8) -> Self {
        Self::InvalidBlockType { btype }
    }

    /// Create a stored-block length mismatch error.
    pub fn length_mismatch(len: u16, nlen: u16) -> Self {
        Self::LengthMismatch { len, nlen }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, available: usize) -> Self {
        Self::InvalidDistance {
            distance,
            available,
        }
    }

    /// Create an invalid code error.
    pub fn invalid_code(bit_position: u64) -> Self {
        Self::InvalidCode { bit_position }
    }

    /// Create an unexpected end of stream error.
    pub fn unexpected_end(bit_position: u64) -> Self {
        Self::UnexpectedEndOfStream { bit_position }
    }

    /// Create an invalid code lengths error.
    pub fn invalid_lengths(reason: &'static str) -> Self {
        Self::InvalidCodeLengths { reason }
    }

    /// Create an output limit error.
    pub fn output_limit(limit: usize) -> Self {
        Self::OutputLimitExceeded { limit }
    }

    /// The kind of corruption, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidBlockType { .. } => ErrorKind::InvalidBlockType,
            Self::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            Self::InvalidDistance { .. } => ErrorKind::InvalidDistance,
            Self::InvalidCode { .. } => ErrorKind::InvalidCode,
            Self::UnexpectedEndOfStream { .. } => ErrorKind::UnexpectedEndOfStream,
            Self::InvalidCodeLengths { .. } => ErrorKind::InvalidCodeLengths,
            Self::OutputLimitExceeded { .. } => ErrorKind::OutputLimitExceeded,
        }
    }
}
