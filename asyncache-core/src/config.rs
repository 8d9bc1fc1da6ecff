use std::future::Future;

use crate::{AsyncMemoizer, CacheArg, EvictionPolicy};

/// Default capacity of [`lru_cache`](crate::lru_cache) and `#[lru_cache]`.
pub const DEFAULT_MAXSIZE: usize = 128;

/// Decoration-time configuration of a memoizer.
///
/// Doubles as the decorator returned by [`lru_cache`](crate::lru_cache): the
/// parameters are set first and [`decorate`](CacheParameters::decorate) then
/// wraps the function.
///
/// # Fields
///
/// * `maxsize` - capacity of the LRU cache, `None` for unbounded
/// * `typed` - when true, arguments of different types are cached separately
///   (`3i32` and `3.0f64` become distinct keys)
///
/// # Examples
///
/// ```
/// use asyncache_core::CacheParameters;
///
/// let params = CacheParameters::default();
/// assert_eq!(params.maxsize, Some(128));
/// assert!(!params.typed);
///
/// let typed = CacheParameters::new(None).typed(true);
/// assert_eq!(typed.maxsize, None);
/// assert!(typed.typed);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheParameters {
    pub maxsize: Option<usize>,
    pub typed: bool,
}

impl CacheParameters {
    pub const fn new(maxsize: Option<usize>) -> Self {
        Self {
            maxsize,
            typed: false,
        }
    }

    pub const fn unbounded() -> Self {
        Self::new(None)
    }

    pub const fn typed(mut self, typed: bool) -> Self {
        self.typed = typed;
        self
    }

    pub const fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy::from_maxsize(self.maxsize)
    }

    /// Wraps `func` into a memoizer configured with these parameters.
    pub fn decorate<A, V, F, Fut>(self, func: F) -> AsyncMemoizer<A, V>
    where
        A: CacheArg + Send + 'static,
        V: Clone + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        AsyncMemoizer::new(self, func)
    }
}

impl Default for CacheParameters {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MAXSIZE))
    }
}
