//! Configuration for the session cache.

use std::time::Duration;

/// Default lifetime of a cached resolution (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default entry count above which a miss triggers an expiry sweep.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 100;

/// Configuration for the session cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Fixed time-to-live for every entry, measured from insertion.
    pub ttl: Duration,

    /// High-water mark. When the cache holds more entries than this after
    /// a miss-driven write, expired entries are swept.
    pub sweep_threshold: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the sweep high-water mark.
    pub fn with_sweep_threshold(mut self, threshold: usize) -> Self {
        self.sweep_threshold = threshold;
        self
    }
}
