//! # Asyncache Core
//!
//! Memoization for asynchronous functions, with the semantics of an
//! unbounded `cache` and a least-recently-used `lru_cache`.
//!
//! ## Features
//!
//! - **Call deduplication**: concurrent calls with the same arguments share a
//!   single in-flight computation
//! - **LRU eviction**: bounded caches keep the most recently used keys
//! - **Outcome caching**: whatever the wrapped future returns is cached,
//!   `Err` values included, and replayed until cleared or evicted
//! - **Explicit keys**: arguments are normalized through [`CacheArg`];
//!   unstable values (NaN) fail the call with [`UnhashableArgumentError`]
//! - **Statistics**: `cache_info()` reports hits, misses, capacity and size
//!
//! ## Module Organization
//!
//! - [`keys`] - argument normalization and cache key derivation
//! - `cache_entry` - pending and resolved entries
//! - `eviction_policy` - unbounded and LRU policies, recency order
//! - `memoizer` - the [`AsyncMemoizer`] wrapper and its entry points
//! - `stats` - hit/miss counters and [`CacheInfo`]
//! - `config` - decoration-time [`CacheParameters`]
//!
//! ## Example
//!
//! ```
//! use asyncache_core::{cache, Kw};
//!
//! let area = cache(|(w, Kw(_, h)): (u32, Kw<u32>)| async move { w * h });
//!
//! futures::executor::block_on(async {
//!     assert_eq!(area.call((3, Kw("height", 4))).await.unwrap(), 12);
//!     assert_eq!(area.call((3, Kw("height", 4))).await.unwrap(), 12);
//! });
//! assert_eq!(area.cache_info().hits, 1);
//! ```
mod cache_entry;
mod config;
mod error;
mod eviction_policy;
mod memoizer;
mod stats;

pub mod keys;

pub use cache_entry::{CacheEntry, Computation, Outcome, Panicked};
pub use config::{CacheParameters, DEFAULT_MAXSIZE};
pub use error::{ArgLocation, UnhashableArgumentError};
pub use eviction_policy::{EvictionPolicy, RecencyOrder};
pub use keys::{ArgValue, CacheArg, CacheKey, KeyBuilder, Kw};
pub use memoizer::{cache, lru_cache, AsyncMemoizer};
pub use stats::{CacheInfo, CacheStats};
