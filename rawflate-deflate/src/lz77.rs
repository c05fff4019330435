//! LZ77 match finding for DEFLATE.
//!
//! This module turns input bytes into a stream of literals and
//! (length, distance) back-references.
//!
//! # Algorithm
//!
//! Every position with at least three bytes left is hashed on its 3-byte
//! prefix. `head` maps a hash to the most recent position with that hash and
//! `prev`, indexed by position modulo the 32 KiB window, links each position
//! to the previous one with the same hash. A search walks that chain from
//! the newest candidate backwards, keeping the longest match, and stops once
//! a match reaches `nice_length`, the chain leaves the window, or
//! `max_chain` hops have been made. Equal-length candidates never replace an
//! earlier (closer) one, so ties resolve to the smaller distance.
//!
//! Lazy evaluation: a match shorter than `max_lazy` is only committed if
//! the next position does not have a strictly longer one. Otherwise a
//! literal is emitted and the longer match becomes the candidate for the
//! next position.

use crate::config::{CompressionLevel, MatchConfig};
pub use rawflate_core::WINDOW_SIZE;

/// Minimum match length.
pub const MIN_MATCH: usize = 3;

/// Maximum match length.
pub const MAX_MATCH: usize = 258;

/// Size of the hash table (power of 2).
const HASH_SIZE: usize = 32768;

/// Hash mask.
const HASH_MASK: usize = HASH_SIZE - 1;

/// Window mask for the `prev` chain links.
const WINDOW_MASK: usize = WINDOW_SIZE - 1;

/// Minimum-length matches further back than this cost more than literals.
const TOO_FAR: usize = 4096;

/// Empty hash slot / end of chain.
const NIL: usize = usize::MAX;

/// A token produced by LZ77 compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz77Token {
    /// A literal byte.
    Literal(u8),
    /// A back-reference to previously seen data.
    Match {
        /// Number of bytes to copy (3-258).
        length: u16,
        /// Distance back into the window (1-32768).
        distance: u16,
    },
}

impl Lz77Token {
    /// Number of input bytes this token stands for.
    pub fn input_len(&self) -> usize {
        match self {
            Self::Literal(_) => 1,
            Self::Match { length, .. } => *length as usize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Match {
    length: usize,
    distance: usize,
}

/// Hash-chained LZ77 encoder over one in-memory input.
#[derive(Debug)]
pub struct Lz77Encoder<'a> {
    /// Entire input; the window is the 32 KiB before `pos`.
    input: &'a [u8],
    /// Next position to tokenize.
    pos: usize,
    /// Positions below this are linked into the hash chains.
    inserted: usize,
    /// Hash table: maps hash -> most recent position.
    head: Vec<usize>,
    /// Hash chain: previous position with same hash.
    prev: Vec<usize>,
    /// Level tunables.
    config: MatchConfig,
    /// Match already found for `pos` by the previous lazy look-ahead.
    pending: Option<Match>,
}

impl<'a> Lz77Encoder<'a> {
    /// Create an encoder over `input` with the given tunables.
    pub fn new(input: &'a [u8], config: MatchConfig) -> Self {
        Self {
            input,
            pos: 0,
            inserted: 0,
            head: vec![NIL; HASH_SIZE],
            prev: vec![NIL; WINDOW_SIZE],
            config,
            pending: None,
        }
    }

    /// Create an encoder using the tunables of a compression level.
    pub fn with_level(input: &'a [u8], level: CompressionLevel) -> Self {
        Self::new(input, level.match_config())
    }

    /// Input bytes covered by the tokens produced so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether every input byte has been tokenized.
    pub fn is_finished(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Compute hash for 3 bytes.
    #[inline(always)]
    fn hash(b0: u8, b1: u8, b2: u8) -> usize {
        let h = ((b0 as usize).wrapping_mul(506832829))
            ^ ((b1 as usize).wrapping_mul(2654435761) << 8)
            ^ ((b2 as usize).wrapping_mul(374761393) << 16);
        (h ^ (h >> 15)) & HASH_MASK
    }

    #[inline]
    fn hash_at(&self, pos: usize) -> usize {
        Self::hash(self.input[pos], self.input[pos + 1], self.input[pos + 2])
    }

    /// Link every position below `pos` into the hash chains.
    fn insert_until(&mut self, pos: usize) {
        while self.inserted < pos {
            let i = self.inserted;
            if i + MIN_MATCH <= self.input.len() {
                let h = self.hash_at(i);
                self.prev[i & WINDOW_MASK] = self.head[h];
                self.head[h] = i;
            }
            self.inserted += 1;
        }
    }

    /// Find the longest match at `pos` that is strictly longer than
    /// `prev_len` (and at least [`MIN_MATCH`]).
    fn find_match(&mut self, pos: usize, prev_len: usize) -> Option<Match> {
        self.insert_until(pos);

        let max_len = MAX_MATCH.min(self.input.len() - pos);
        let mut best_len = prev_len.max(MIN_MATCH - 1);
        if best_len >= max_len {
            return None;
        }

        let mut chain = self.config.max_chain as usize;
        if prev_len >= self.config.good_length as usize {
            chain >>= 2;
        }
        let nice = (self.config.nice_length as usize).min(max_len);
        let limit = pos.saturating_sub(WINDOW_SIZE);
        let window = self.input;

        let mut best_dist = 0;
        let mut candidate = self.head[self.hash_at(pos)];

        while candidate != NIL && candidate >= limit && chain > 0 {
            // Cheap rejection: the byte that would extend the best match.
            if window[candidate + best_len] == window[pos + best_len]
                && window[candidate] == window[pos]
            {
                let len = window[candidate..candidate + max_len]
                    .iter()
                    .zip(&window[pos..pos + max_len])
                    .take_while(|(a, b)| a == b)
                    .count();

                if len > best_len {
                    best_len = len;
                    best_dist = pos - candidate;
                    if len >= nice {
                        break;
                    }
                }
            }

            chain -= 1;
            let next = self.prev[candidate & WINDOW_MASK];
            if next >= candidate {
                break;
            }
            candidate = next;
        }

        if best_dist == 0 || (best_len == MIN_MATCH && best_dist > TOO_FAR) {
            return None;
        }
        Some(Match {
            length: best_len,
            distance: best_dist,
        })
    }

    /// Append tokens until `tokens` holds `max_tokens` or the input ends.
    pub fn fill(&mut self, tokens: &mut Vec<Lz77Token>, max_tokens: usize) {
        let len = self.input.len();

        while tokens.len() < max_tokens && self.pos < len {
            if !self.config.finds_matches() {
                tokens.push(Lz77Token::Literal(self.input[self.pos]));
                self.pos += 1;
                continue;
            }

            let current = match self.pending.take() {
                Some(m) => Some(m),
                None => self.find_match(self.pos, 0),
            };

            let Some(current) = current else {
                tokens.push(Lz77Token::Literal(self.input[self.pos]));
                self.pos += 1;
                continue;
            };

            let lazy = if current.length < self.config.max_lazy as usize && self.pos + 1 < len {
                self.find_match(self.pos + 1, current.length)
            } else {
                None
            };
            if let Some(next) = lazy {
                tokens.push(Lz77Token::Literal(self.input[self.pos]));
                self.pos += 1;
                self.pending = Some(next);
                continue;
            }

            tokens.push(Lz77Token::Match {
                length: current.length as u16,
                distance: current.distance as u16,
            });
            self.pos += current.length;
        }
    }

    /// Tokenize all of `input` at once (convenience method).
    pub fn compress_all(input: &[u8], level: CompressionLevel) -> Vec<Lz77Token> {
        let mut encoder = Lz77Encoder::with_level(input, level);
        let mut tokens = Vec::with_capacity(input.len() / 2);
        encoder.fill(&mut tokens, usize::MAX);
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(n: u8) -> CompressionLevel {
        CompressionLevel::new(n)
    }

    fn reconstruct(tokens: &[Lz77Token]) -> Vec<u8> {
        let mut output = Vec::new();
        for token in tokens {
            match token {
                Lz77Token::Literal(b) => output.push(*b),
                Lz77Token::Match { length, distance } => {
                    for _ in 0..*length {
                        let pos = output.len() - *distance as usize;
                        output.push(output[pos]);
                    }
                }
            }
        }
        output
    }

    fn lcg_bytes(len: usize, mut seed: u64) -> Vec<u8> {
        (0..len)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                (seed >> 33) as u8
            })
            .collect()
    }

    #[test]
    fn test_literals_only() {
        let tokens = Lz77Encoder::compress_all(b"abcdefgh", level(6));

        assert!(tokens.iter().all(|t| matches!(t, Lz77Token::Literal(_))));
        assert_eq!(tokens.len(), 8);
    }

    #[test]
    fn test_simple_match() {
        let tokens = Lz77Encoder::compress_all(b"abcabcabc", level(6));

        assert_eq!(
            tokens,
            vec![
                Lz77Token::Literal(b'a'),
                Lz77Token::Literal(b'b'),
                Lz77Token::Literal(b'c'),
                Lz77Token::Match {
                    length: 6,
                    distance: 3
                },
            ]
        );
    }

    #[test]
    fn test_token_input_len() {
        assert_eq!(Lz77Token::Literal(b'x').input_len(), 1);
        let token = Lz77Token::Match {
            length: 258,
            distance: 1,
        };
        assert_eq!(token.input_len(), 258);
    }

    #[test]
    fn test_repeated_char() {
        let input = b"aaaaaaaaaa";
        let tokens = Lz77Encoder::compress_all(input, level(6));

        let covered: usize = tokens.iter().map(Lz77Token::input_len).sum();
        assert_eq!(covered, 10);
        assert_eq!(
            tokens,
            vec![
                Lz77Token::Literal(b'a'),
                Lz77Token::Match {
                    length: 9,
                    distance: 1
                },
            ]
        );
    }

    #[test]
    fn test_decode_matches() {
        let input = b"Hello, Hello, Hello!";
        for n in 1..=9 {
            let tokens = Lz77Encoder::compress_all(input, level(n));
            assert_eq!(reconstruct(&tokens), input, "level {}", n);
        }
    }

    #[test]
    fn test_level_0_store() {
        let tokens = Lz77Encoder::compress_all(b"test data test data", level(0));
        assert!(tokens.iter().all(|t| matches!(t, Lz77Token::Literal(_))));
    }

    #[test]
    fn test_ties_prefer_smaller_distance() {
        let tokens = Lz77Encoder::compress_all(b"abcXabcYabc", level(9));
        assert_eq!(
            tokens.last(),
            Some(&Lz77Token::Match {
                length: 3,
                distance: 4
            })
        );
    }

    #[test]
    fn test_lazy_prefers_longer_next_match() {
        let input = b"abc_bcdefgh_abcdefgh";
        let tokens = Lz77Encoder::compress_all(input, level(9));

        assert_eq!(
            &tokens[tokens.len() - 2..],
            &[
                Lz77Token::Literal(b'a'),
                Lz77Token::Match {
                    length: 7,
                    distance: 9
                },
            ]
        );
        assert_eq!(reconstruct(&tokens), input);
    }

    #[test]
    fn test_far_minimum_match_dropped() {
        // "xyz" recurs 5000 bytes later with nothing longer to match.
        let mut input = b"xyz".to_vec();
        input.extend(std::iter::repeat_n(b'.', 4997));
        input.extend_from_slice(b"xyz");
        let tokens = Lz77Encoder::compress_all(&input, level(9));

        assert!(
            tokens
                .iter()
                .all(|t| !matches!(t, Lz77Token::Match { distance: 5000, .. }))
        );
        assert_eq!(reconstruct(&tokens), input);
    }

    #[test]
    fn test_match_at_window_edge() {
        let mut input = lcg_bytes(WINDOW_SIZE, 7);
        let head = input[..16].to_vec();
        input.extend_from_slice(&head);

        let tokens = Lz77Encoder::compress_all(&input, level(9));
        assert!(tokens.iter().any(|t| matches!(
            t,
            Lz77Token::Match {
                distance: 32768,
                length: 16
            }
        )));
        assert_eq!(reconstruct(&tokens), input);
    }

    #[test]
    fn test_fill_respects_token_limit() {
        let input = lcg_bytes(1000, 3);
        let mut encoder = Lz77Encoder::with_level(&input, level(6));
        let mut tokens = Vec::new();

        encoder.fill(&mut tokens, 100);
        assert_eq!(tokens.len(), 100);
        assert_eq!(
            encoder.position(),
            tokens.iter().map(Lz77Token::input_len).sum::<usize>()
        );

        encoder.fill(&mut tokens, usize::MAX);
        assert!(encoder.is_finished());
        assert_eq!(reconstruct(&tokens), input);
    }

    #[test]
    fn test_hash() {
        let h1 = Lz77Encoder::hash(b'a', b'b', b'c');
        let h2 = Lz77Encoder::hash(b'a', b'b', b'c');
        assert_eq!(h1, h2);
        assert!(h1 < HASH_SIZE);
    }
}
