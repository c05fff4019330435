//! Output buffer that doubles as the decoder's sliding window.
//!
//! DEFLATE back-references reach at most 32 KiB behind the current output
//! position. Because decompression here always produces the whole output in
//! memory, the output itself is the window: a back-reference copies from
//! `len - distance` forward, one byte at a time, so that a distance shorter
//! than the length repeats the bytes it has just produced.

use crate::error::{CorruptStreamError, Result};

/// Maximum back-reference distance in DEFLATE (32 KiB).
pub const WINDOW_SIZE: usize = 32768;

/// Growing output buffer with back-reference support.
#[derive(Debug, Clone, Default)]
pub struct OutputWindow {
    /// Everything produced so far.
    output: Vec<u8>,
    /// Upper bound on `output.len()`, if any.
    limit: Option<usize>,
}

impl OutputWindow {
    /// Create an empty, unbounded window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty window that refuses to grow beyond `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            output: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Check that `additional` more bytes still fit under the limit.
    #[inline]
    fn reserve_checked(&mut self, additional: usize) -> Result<()> {
        if let Some(limit) = self.limit {
            if self.output.len().saturating_add(additional) > limit {
                return Err(CorruptStreamError::output_limit(limit));
            }
        }
        self.output.reserve(additional);
        Ok(())
    }

    /// Append one literal byte.
    #[inline]
    pub fn write_literal(&mut self, byte: u8) -> Result<()> {
        self.reserve_checked(1)?;
        self.output.push(byte);
        Ok(())
    }

    /// Append raw bytes (stored block payload).
    pub fn write_literals(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve_checked(bytes.len())?;
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    /// Copy `length` bytes starting `distance` bytes back.
    ///
    /// The copy runs byte by byte, so overlapping runs (`distance < length`)
    /// replicate the pattern.
    pub fn copy_match(&mut self, distance: usize, length: usize) -> Result<()> {
        if distance == 0 || distance > self.output.len() || distance > WINDOW_SIZE {
            return Err(CorruptStreamError::invalid_distance(
                distance,
                self.output.len(),
            ));
        }
        self.reserve_checked(length)?;

        let mut src = self.output.len() - distance;
        for _ in 0..length {
            let byte = self.output[src];
            self.output.push(byte);
            src += 1;
        }

        Ok(())
    }

    /// Get the total output length.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    /// Check whether nothing has been produced yet.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Get the output data.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Consume and return the output data.
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_copy_match() {
        let mut window = OutputWindow::new();
        window.write_literals(b"ABCD").unwrap();

        window.copy_match(4, 4).unwrap();
        assert_eq!(window.output(), b"ABCDABCD");
    }

    #[test]
    fn test_copy_overlap() {
        // "AB" -> copy distance=2, length=6 -> "ABABAB"
        let mut window = OutputWindow::new();
        window.write_literals(b"AB").unwrap();

        window.copy_match(2, 6).unwrap();
        assert_eq!(window.output(), b"ABABABAB");
    }

    #[test]
    fn test_run_of_single_byte() {
        let mut window = OutputWindow::new();
        window.write_literal(b'z').unwrap();
        window.copy_match(1, 258).unwrap();
        assert_eq!(window.len(), 259);
        assert!(window.output().iter().all(|&b| b == b'z'));
    }

    #[test]
    fn test_distance_beyond_output() {
        let mut window = OutputWindow::new();
        window.write_literals(b"abc").unwrap();

        let err = window.copy_match(4, 3).unwrap_err();
        assert_eq!(err, CorruptStreamError::invalid_distance(4, 3));

        let err = window.copy_match(0, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDistance);
    }

    #[test]
    fn test_full_window_distance() {
        let mut window = OutputWindow::new();
        let prefix: Vec<u8> = (0..WINDOW_SIZE).map(|i| (i % 251) as u8).collect();
        window.write_literals(&prefix).unwrap();

        window.copy_match(WINDOW_SIZE, 3).unwrap();
        assert_eq!(&window.output()[WINDOW_SIZE..], &prefix[..3]);
    }

    #[test]
    fn test_limit() {
        let mut window = OutputWindow::with_limit(4);
        window.write_literals(b"ab").unwrap();
        window.copy_match(2, 2).unwrap();

        let err = window.write_literal(b'x').unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutputLimitExceeded);
        assert_eq!(window.output(), b"abab");
    }
}
