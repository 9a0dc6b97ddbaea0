//! Expiring session cache for the portal's session gate.
//!
//! This crate provides the caching layer the gate uses to avoid
//! re-resolving the same credential on every request:
//! - Fixed-TTL entries that are re-validated on every read
//! - An opportunistic sweep that reclaims expired entries
//! - A [`SessionCache`] trait so the in-memory store can be swapped
//!   for a shared one in multi-instance deployments
//!
//! # Example
//!
//! ```rust,ignore
//! use olympiad_session::{CacheConfig, CacheEntry, MemorySessionCache, SessionCache, SystemClock, Clock};
//!
//! let config = CacheConfig::default().with_ttl(Duration::from_secs(300));
//! let cache: MemorySessionCache<Option<String>> = MemorySessionCache::new();
//!
//! let now = SystemClock.now();
//! cache.put(&key, CacheEntry::new(Some("user-1".into()), now, config.ttl)).await?;
//! ```

mod cache;
mod clock;
mod config;
mod error;
mod key;

pub use cache::{CacheEntry, CacheStats, MemorySessionCache, SessionCache, SharedSessionCache};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{CacheConfig, DEFAULT_SWEEP_THRESHOLD, DEFAULT_TTL};
pub use error::{Error, Result};
pub use key::cache_key;
