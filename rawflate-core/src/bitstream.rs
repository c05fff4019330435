//! Bit-level I/O for the DEFLATE bitstream.
//!
//! This module provides `BitReader` and `BitWriter` for reading and writing
//! data at the bit level, which is what variable-length Huffman codes and
//! the DEFLATE block headers need.
//!
//! # Bit Ordering
//!
//! DEFLATE packs bits LSB-first: the first bit of a field lands in the least
//! significant free bit of the current byte, and fields may straddle byte
//! boundaries. Huffman codes are the one exception at the format level; the
//! codec stores them bit-reversed so both directions can stay LSB-first here.
//!
//! # Example
//!
//! ```
//! use rawflate_core::bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3);
//! writer.write_bits(0b1100, 4);
//! let output = writer.finish();
//!
//! let mut reader = BitReader::new(&output);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(4).unwrap(), 0b1100);
//! ```

use crate::error::{CorruptStreamError, Result};

/// A bit-level reader over an in-memory byte slice.
///
/// `BitReader` keeps up to 64 bits of lookahead in a buffer so that codes
/// can be peeked before they are consumed.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// Input bytes.
    data: &'a [u8],
    /// Index of the next byte to load into the buffer.
    pos: usize,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of valid bits in buffer.
    bits_in_buffer: u8,
    /// Total bits consumed (for error reporting).
    total_bits_read: u64,
}

impl<'a> BitReader<'a> {
    /// Create a new `BitReader` over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits_read: 0,
        }
    }

    /// Get the current bit position (for error reporting).
    pub fn bit_position(&self) -> u64 {
        self.total_bits_read
    }

    /// Number of input bytes consumed so far, counting a partially read
    /// byte as consumed.
    pub fn consumed_bytes(&self) -> usize {
        self.pos - (self.bits_in_buffer / 8) as usize
    }

    /// Number of bits still available, buffered or not.
    pub fn available_bits(&self) -> u64 {
        self.bits_in_buffer as u64 + (self.data.len() - self.pos) as u64 * 8
    }

    /// Top up the buffer with as many whole bytes as fit.
    #[inline]
    fn refill(&mut self) {
        while self.bits_in_buffer <= 56 && self.pos < self.data.len() {
            self.buffer |= (self.data[self.pos] as u64) << self.bits_in_buffer;
            self.bits_in_buffer += 8;
            self.pos += 1;
        }
    }

    /// Ensure at least `count` bits are buffered.
    #[inline]
    fn fill_buffer(&mut self, count: u8) -> Result<()> {
        debug_assert!(count <= 57, "Cannot fill more than 57 bits at once");

        if self.bits_in_buffer < count {
            self.refill();
            if self.bits_in_buffer < count {
                return Err(CorruptStreamError::unexpected_end(self.total_bits_read));
            }
        }
        Ok(())
    }

    /// Read up to 32 bits from the stream.
    ///
    /// The first bit read ends up in the LSB of the result. Fails with
    /// `UnexpectedEndOfStream` if fewer than `count` bits remain, in which
    /// case nothing is consumed.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");

        if count == 0 {
            return Ok(0);
        }

        self.fill_buffer(count)?;

        let mask = (1u64 << count).wrapping_sub(1);
        let result = (self.buffer & mask) as u32;

        self.buffer >>= count;
        self.bits_in_buffer -= count;
        self.total_bits_read += count as u64;

        Ok(result)
    }

    /// Peek at up to 32 bits without consuming them.
    ///
    /// Past the end of input the missing high bits read as zero; callers
    /// compare the length they actually consume against
    /// [`available_bits`](Self::available_bits).
    #[inline]
    pub fn peek_bits(&mut self, count: u8) -> u32 {
        debug_assert!(count <= 32, "Cannot peek more than 32 bits at once");

        if self.bits_in_buffer < count {
            self.refill();
        }

        let mask = (1u64 << count).wrapping_sub(1);
        (self.buffer & mask) as u32
    }

    /// Skip a number of bits.
    pub fn skip_bits(&mut self, count: u8) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        self.fill_buffer(count)?;

        self.buffer >>= count;
        self.bits_in_buffer -= count;
        self.total_bits_read += count as u64;

        Ok(())
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Align to the next byte boundary by discarding partial bits.
    pub fn align_to_byte(&mut self) {
        let remainder = self.bits_in_buffer % 8;
        if remainder > 0 {
            self.buffer >>= remainder;
            self.bits_in_buffer -= remainder;
            self.total_bits_read += remainder as u64;
        }
    }

    /// Take `len` raw bytes starting at the current byte boundary.
    ///
    /// The reader must be byte-aligned. Whole bytes still sitting in the bit
    /// buffer are handed back to the slice first so the result borrows the
    /// input directly.
    pub fn read_aligned_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        debug_assert!(self.bits_in_buffer % 8 == 0, "Reader is not byte-aligned");

        self.pos -= (self.bits_in_buffer / 8) as usize;
        self.buffer = 0;
        self.bits_in_buffer = 0;

        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| CorruptStreamError::unexpected_end(self.total_bits_read))?;

        let bytes = &self.data[self.pos..end];
        self.pos = end;
        self.total_bits_read += len as u64 * 8;
        Ok(bytes)
    }
}

/// A bit-level writer into a growing byte buffer.
///
/// `BitWriter` accumulates bits in an internal buffer and moves complete
/// bytes into the output. [`finish`](Self::finish) zero-pads the trailing
/// partial byte. Writing into memory cannot fail.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// Output bytes.
    output: Vec<u8>,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of bits in buffer.
    bits_in_buffer: u8,
    /// Total bits written.
    total_bits_written: u64,
}

impl BitWriter {
    /// Create a new, empty `BitWriter`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `BitWriter` with room for `capacity` output bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Get the total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.total_bits_written
    }

    /// Move complete bytes from the buffer to the output.
    #[inline]
    fn flush_bytes(&mut self) {
        if self.bits_in_buffer >= 32 {
            self.output
                .extend_from_slice(&(self.buffer as u32).to_le_bytes());
            self.buffer >>= 32;
            self.bits_in_buffer -= 32;
        }

        while self.bits_in_buffer >= 8 {
            self.output.push((self.buffer & 0xFF) as u8);
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Write the low `count` bits of `value` (0-32 bits), LSB first.
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32, "Cannot write more than 32 bits at once");

        if count == 0 {
            return;
        }

        let mask = (1u64 << count).wrapping_sub(1);
        self.buffer |= (value as u64 & mask) << self.bits_in_buffer;
        self.bits_in_buffer += count;
        self.total_bits_written += count as u64;

        self.flush_bytes();
    }

    /// Write a single bit.
    #[inline(always)]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Pad to the next byte boundary with zeros.
    pub fn align_to_byte(&mut self) {
        if self.bits_in_buffer % 8 != 0 {
            let padding = 8 - (self.bits_in_buffer % 8);
            self.write_bits(0, padding);
        }
    }

    /// Append raw bytes. The writer must be byte-aligned.
    pub fn write_bytes(&mut self, buf: &[u8]) {
        debug_assert!(self.bits_in_buffer % 8 == 0, "Writer is not byte-aligned");

        self.flush_bytes();
        self.output.extend_from_slice(buf);
        self.total_bits_written += buf.len() as u64 * 8;
    }

    /// Pad the final partial byte with zeros and return the output.
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.flush_bytes();
        self.output
    }
}
