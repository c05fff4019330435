//! Compression levels and their match-finder tunables.

/// Compression level (0-9), clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// No compression (store only).
    pub const NONE: Self = Self(0);
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a compression level; values above 9 are clamped to 9.
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }

    /// Match-finder tunables for this level.
    pub fn match_config(&self) -> MatchConfig {
        CONFIGURATION_TABLE[self.0 as usize]
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

/// Per-level match-finder tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Once the current match is at least this long, the lazy search walks
    /// only a quarter of the chain.
    pub good_length: u16,
    /// Matches at least this long are committed without a lazy search.
    pub max_lazy: u16,
    /// Stop searching the chain once a match this long is found.
    pub nice_length: u16,
    /// Maximum number of hash-chain hops per search.
    pub max_chain: u16,
}

impl MatchConfig {
    const fn new(good_length: u16, max_lazy: u16, nice_length: u16, max_chain: u16) -> Self {
        Self {
            good_length,
            max_lazy,
            nice_length,
            max_chain,
        }
    }

    /// Whether this configuration searches for matches at all.
    pub fn finds_matches(&self) -> bool {
        self.max_chain > 0
    }
}

const CONFIGURATION_TABLE: [MatchConfig; 10] = [
    MatchConfig::new(0, 0, 0, 0), // 0: store only
    MatchConfig::new(4, 4, 8, 4),
    MatchConfig::new(4, 5, 16, 8),
    MatchConfig::new(4, 6, 32, 32),
    MatchConfig::new(4, 4, 16, 16),
    MatchConfig::new(8, 16, 32, 32),
    MatchConfig::new(8, 16, 128, 128),
    MatchConfig::new(8, 32, 128, 256),
    MatchConfig::new(32, 128, 258, 1024),
    MatchConfig::new(32, 258, 258, 4096), // 9: maximum compression
];
