//! # rawflate Core
//!
//! Core components for the rawflate DEFLATE codec.
//!
//! This crate provides the building blocks the codec is layered on:
//!
//! - [`bitstream`]: LSB-first bit-level I/O for Huffman codes and headers
//! - [`window`]: Output buffer that doubles as the decoder's sliding window
//! - [`error`]: The corrupt-stream error taxonomy
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Caller                                                  │
//! │     CLI, container formats (gzip/zlib), transport       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Codec (rawflate-deflate)                                │
//! │     Match finder, Huffman builders, Deflater, Inflater  │
//! ├─────────────────────────────────────────────────────────┤
//! │ BitStream (this crate)                                  │
//! │     BitReader/BitWriter, OutputWindow, errors           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rawflate_core::bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0xABC, 12);
//! let data = writer.finish();
//!
//! let mut reader = BitReader::new(&data);
//! assert_eq!(reader.read_bits(12).unwrap(), 0xABC);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;
pub mod window;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use error::{CorruptStreamError, ErrorKind, Result};
pub use window::{OutputWindow, WINDOW_SIZE};
