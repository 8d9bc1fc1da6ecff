use std::collections::VecDeque;
use std::fmt;

use crate::CacheKey;

/// Represents the policy used for evicting entries from a memoizer's cache.
///
/// The policy is derived from the `maxsize` given at decoration time and never
/// changes afterwards.
///
/// # Variants
///
/// * `Unbounded` - the cache grows without limit and keeps no recency order
/// * `LRU` - **Least Recently Used** eviction with a fixed capacity
///   - Every access (hit, join of a pending computation, or miss) moves the
///     key to the most recent position
///   - Inserting a new key at capacity evicts the least recently used key
///   - A capacity of zero stores nothing
///
/// # Examples
///
/// ```
/// use asyncache_core::EvictionPolicy;
///
/// assert_eq!(EvictionPolicy::from_maxsize(None), EvictionPolicy::Unbounded);
/// assert_eq!(
///     EvictionPolicy::from_maxsize(Some(2)),
///     EvictionPolicy::LRU { maxsize: 2 }
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionPolicy {
    Unbounded,
    LRU { maxsize: usize },
}

impl EvictionPolicy {
    pub const fn from_maxsize(maxsize: Option<usize>) -> Self {
        match maxsize {
            Some(maxsize) => EvictionPolicy::LRU { maxsize },
            None => EvictionPolicy::Unbounded,
        }
    }

    pub const fn maxsize(&self) -> Option<usize> {
        match self {
            EvictionPolicy::Unbounded => None,
            EvictionPolicy::LRU { maxsize } => Some(*maxsize),
        }
    }

    /// Whether anything can be stored at all.
    pub const fn stores_entries(&self) -> bool {
        !matches!(self, EvictionPolicy::LRU { maxsize: 0 })
    }

    /// Whether inserting one more key into a cache of `len` entries requires
    /// an eviction first.
    pub const fn needs_eviction(&self, len: usize) -> bool {
        match self {
            EvictionPolicy::Unbounded => false,
            EvictionPolicy::LRU { maxsize } => len >= *maxsize,
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Unbounded => f.write_str("unbounded"),
            EvictionPolicy::LRU { maxsize } => write!(f, "lru({})", maxsize),
        }
    }
}

/// Recency order of the keys in an LRU cache.
///
/// The front of the queue is the least recently used key, the back the most
/// recently used one.
///
/// # Performance
///
/// - `push`/`pop_least_recent`: O(1)
/// - `touch`/`remove`: O(n), the key has to be found first
#[derive(Debug, Default)]
pub struct RecencyOrder {
    keys: VecDeque<CacheKey>,
}

impl RecencyOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a key that is not yet tracked as the most recently used.
    pub fn push(&mut self, key: CacheKey) {
        self.keys.push_back(key);
    }

    /// Moves a tracked key to the most recent position.
    ///
    /// Returns `false` and leaves the order unchanged if the key is unknown.
    pub fn touch(&mut self, key: &CacheKey) -> bool {
        if let Some(pos) = self.keys.iter().position(|k| k == key) {
            if let Some(found) = self.keys.remove(pos) {
                self.keys.push_back(found);
            }
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, key: &CacheKey) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != before
    }

    pub fn pop_least_recent(&mut self) -> Option<CacheKey> {
        self.keys.pop_front()
    }

    pub fn least_recent(&self) -> Option<&CacheKey> {
        self.keys.front()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheKey> {
        self.keys.iter()
    }
}
