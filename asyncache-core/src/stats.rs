use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hit/miss counters of one memoizer.
///
/// Counters use atomic operations with `Relaxed` ordering; they are
/// independent of the cache map lock and only ever read as a snapshot.
///
/// # Examples
///
/// ```
/// use asyncache_core::CacheStats;
///
/// let stats = CacheStats::new();
///
/// stats.record_hit();
/// stats.record_hit();
/// stats.record_miss();
///
/// assert_eq!(stats.hits(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert_eq!(stats.total_accesses(), 3);
/// ```
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Records a call answered from a resolved entry.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a call that started or joined a computation.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}


/// Snapshot returned by `cache_info()`.
///
/// `maxsize` is `None` for an unbounded cache. `currsize` counts every entry
/// in the map, pending computations included.
///
/// ```
/// use asyncache_core::CacheInfo;
///
/// let info = CacheInfo { hits: 1, misses: 1, maxsize: None, currsize: 1 };
/// assert_eq!(info.to_string(), "CacheInfo(hits=1, misses=1, maxsize=None, currsize=1)");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub maxsize: Option<usize>,
    pub currsize: usize,
}

impl fmt::Display for CacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheInfo(hits={}, misses={}, maxsize=", self.hits, self.misses)?;
        match self.maxsize {
            Some(maxsize) => write!(f, "{}", maxsize)?,
            None => f.write_str("None")?,
        }
        write!(f, ", currsize={})", self.currsize)
    }
}
