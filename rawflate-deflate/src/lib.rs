//! # rawflate Deflate
//!
//! Pure Rust implementation of the DEFLATE compression algorithm (RFC 1951).
//!
//! This crate compresses and decompresses raw DEFLATE streams. Container
//! formats (gzip, zlib, ZIP) wrap such streams with their own headers and
//! checksums and are left to callers.
//!
//! ## Features
//!
//! - **Decompression**: Full support for all DEFLATE block types
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - **Compression**: hash-chained LZ77 with lazy matching
//!   - Compression levels 0-9
//!   - Per-block choice of the cheapest encoding
//! - Per-block statistics and an optional output limit on the decode side
//!
//! ## Example
//!
//! ```rust
//! use rawflate_deflate::{compress, decompress};
//!
//! // Compress data
//! let original = b"Hello, World! Hello, World!";
//! let compressed = compress(original, 6);
//!
//! // Decompress data
//! let decompressed = decompress(&compressed).unwrap();
//! assert_eq!(&decompressed, original);
//! ```
//!
//! ## Compression Levels
//!
//! - Level 0: No compression (stored blocks)
//! - Level 1-3: Fast compression
//! - Level 4-6: Balanced (default is 6)
//! - Level 7-9: Best compression (slower)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod config;
pub mod deflate;
pub mod huffman;
pub mod huft;
pub mod inflate;
pub mod lz77;
pub mod tables;

// Re-exports
pub use block::{BlockInfo, BlockKind};
pub use config::{CompressionLevel, MatchConfig};
pub use deflate::{Deflater, compress};
pub use huffman::{CodeTable, HuffmanBuilder, canonical_codes};
pub use huft::{Alphabet, DecodeTable};
pub use inflate::{Inflater, decompress, decompress_with_limit};
pub use lz77::{Lz77Encoder, Lz77Token};
pub use rawflate_core::error::{CorruptStreamError, ErrorKind, Result};
