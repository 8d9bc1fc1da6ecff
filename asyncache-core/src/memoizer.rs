use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::cache_entry::{CacheEntry, Computation, Panicked};
use crate::{
    CacheArg, CacheInfo, CacheKey, CacheParameters, CacheStats, EvictionPolicy, RecencyOrder,
    UnhashableArgumentError,
};

type WrappedFn<A, V> = dyn Fn(A) -> BoxFuture<'static, V> + Send + Sync;

/// Memoizing wrapper around an asynchronous function.
///
/// An `AsyncMemoizer` owns its wrapped function and a private cache keyed by
/// the call arguments. Two memoizers never share entries, even when they wrap
/// the same function.
///
/// # Type Parameters
///
/// * `A` - The argument list. A tuple is read as one positional argument per
///   element (use [`Kw`](crate::Kw) for keyword arguments); any other
///   [`CacheArg`] is a single positional argument.
/// * `V` - The output of the wrapped future. It is cloned out of the cache on
///   every hit. For a `Result`-returning function both `Ok` and `Err` are
///   cached; put the error behind an `Arc` to replay the very same error
///   value.
///
/// # Behavior
///
/// - **Resolved entry**: the cached output is returned without suspending
///   (a hit)
/// - **Pending entry**: the call attaches to the computation already in
///   flight and returns its output (a miss); the wrapped function runs at
///   most once per key while the entry lives
/// - **Absent key**: a pending entry is inserted, the wrapped function is
///   invoked, and its output is stored once it completes (a miss)
/// - **LRU**: every access marks the key most recently used at call start;
///   inserting a new key at capacity first evicts the least recently used
///   key, whether resolved or pending
/// - **`maxsize = Some(0)`**: nothing is stored, every call is a miss
///
/// # Cancellation
///
/// The computation belongs to the cache entry rather than to the caller that
/// started it. Dropping any caller, the originating one included, only
/// affects that caller: the remaining waiters keep driving the shared
/// computation. If every waiter goes away the entry stays pending and the
/// next call for that key picks the computation up where it stopped.
///
/// # Panics
///
/// A panic inside the wrapped future is not cached. The pending entry is
/// removed and the panic resumes in every caller awaiting that computation.
///
/// # Examples
///
/// ```
/// use asyncache_core::lru_cache;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
/// let double = lru_cache(2).decorate(move |x: u64| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     async move { x * 2 }
/// });
///
/// futures::executor::block_on(async {
///     assert_eq!(double.call(3).await.unwrap(), 6);
///     assert_eq!(double.call(3).await.unwrap(), 6);
/// });
///
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// let info = double.cache_info();
/// assert_eq!((info.hits, info.misses, info.currsize), (1, 1, 1));
/// ```
pub struct AsyncMemoizer<A, V> {
    func: Arc<WrappedFn<A, V>>,
    params: CacheParameters,
    policy: EvictionPolicy,
    state: Mutex<CacheState<V>>,
    stats: CacheStats,
}

struct CacheState<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    order: RecencyOrder,
    next_generation: u64,
}

enum Lookup<V> {
    Hit(V),
    Wait {
        generation: u64,
        computation: Computation<V>,
    },
}

/// Values released by a lookup. They are dropped only after the lock is
/// gone, since dropping them runs user code (argument and output
/// destructors).
struct Leftovers<A, V> {
    args: Option<A>,
    evicted: Vec<CacheEntry<V>>,
}

impl<A, V> Leftovers<A, V> {
    fn release(self) {
        let Leftovers { args, evicted } = self;
        drop(args);
        drop(evicted);
    }
}

impl<A, V> AsyncMemoizer<A, V>
where
    A: CacheArg + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Wraps `func` with the given parameters.
    ///
    /// See also [`cache`](crate::cache) and [`lru_cache`](crate::lru_cache).
    pub fn new<F, Fut>(params: CacheParameters, func: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        let func: Arc<WrappedFn<A, V>> = Arc::new(move |args: A| func(args).boxed());
        Self {
            func,
            params,
            policy: params.eviction_policy(),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: RecencyOrder::new(),
                next_generation: 0,
            }),
            stats: CacheStats::new(),
        }
    }

    /// Calls the memoized function.
    ///
    /// Fails with [`UnhashableArgumentError`] before anything else happens if
    /// `args` cannot be turned into a cache key; such calls are neither
    /// cached nor counted.
    pub async fn call(&self, args: A) -> Result<V, UnhashableArgumentError> {
        let key = CacheKey::from_args(&args, self.params.typed)?;
        Ok(self.call_with_key(key, args).await)
    }

    /// Calls the memoized function, falling back to an uncached call when the
    /// arguments cannot be turned into a key.
    ///
    /// Used where the caller's signature has no room for the key error, such
    /// as the functions generated by the attribute macros.
    pub async fn call_or_bypass(&self, args: A) -> V {
        match CacheKey::from_args(&args, self.params.typed) {
            Ok(key) => self.call_with_key(key, args).await,
            Err(err) => {
                warn!(error = %err, "arguments are not cacheable, calling without cache");
                (self.func)(args).await
            }
        }
    }

    /// Invokes the wrapped function directly, without touching the cache or
    /// the statistics.
    pub fn call_wrapped(&self, args: A) -> BoxFuture<'static, V> {
        (self.func)(args)
    }

    async fn call_with_key(&self, key: CacheKey, args: A) -> V {
        if !self.policy.stores_entries() {
            self.stats.record_miss();
            trace!(%key, "caching disabled, calling wrapped function");
            return (self.func)(args).await;
        }

        let (lookup, leftovers) = self.lookup(&key, args);
        leftovers.release();

        match lookup {
            Lookup::Hit(value) => value,
            Lookup::Wait {
                generation,
                computation,
            } => match computation.await {
                Ok(value) => {
                    self.complete(&key, generation, &value);
                    value
                }
                Err(panicked) => {
                    self.abandon(&key, generation);
                    panicked.resume()
                }
            },
        }
    }

    /// Builds the shared computation for `args` without starting it; the
    /// wrapped function is only invoked on first poll.
    fn computation(&self, args: A) -> Computation<V> {
        let func = Arc::clone(&self.func);
        async move {
            AssertUnwindSafe(async move { func(args).await })
                .catch_unwind()
                .await
                .map_err(Panicked::new)
        }
        .boxed()
        .shared()
    }

    /// Resolves `key` against the map. Only an absent key consumes `args`;
    /// otherwise they come back in the leftovers.
    fn lookup(&self, key: &CacheKey, args: A) -> (Lookup<V>, Leftovers<A, V>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let lru = matches!(self.policy, EvictionPolicy::LRU { .. });

        if let Some(entry) = state.entries.get(key) {
            let lookup = match entry {
                CacheEntry::Resolved(value) => {
                    self.stats.record_hit();
                    trace!(%key, "cache hit");
                    Lookup::Hit(value.clone())
                }
                CacheEntry::Pending {
                    generation,
                    computation,
                } => {
                    self.stats.record_miss();
                    trace!(%key, generation, "joining in-flight computation");
                    Lookup::Wait {
                        generation: *generation,
                        computation: computation.clone(),
                    }
                }
            };
            if lru {
                state.order.touch(key);
            }
            let leftovers = Leftovers {
                args: Some(args),
                evicted: Vec::new(),
            };
            return (lookup, leftovers);
        }

        self.stats.record_miss();

        let mut evicted = Vec::new();
        while self.policy.needs_eviction(state.entries.len()) {
            let Some(oldest) = state.order.pop_least_recent() else {
                break;
            };
            if let Some(entry) = state.entries.remove(&oldest) {
                debug!(key = %oldest, pending = entry.is_pending(), "evicting least recently used entry");
                evicted.push(entry);
            }
        }

        // Building the computation does not call into user code
        let fresh = self.computation(args);
        let generation = state.next_generation;
        state.next_generation = state.next_generation.wrapping_add(1);
        state.entries.insert(
            key.clone(),
            CacheEntry::Pending {
                generation,
                computation: fresh.clone(),
            },
        );
        if lru {
            state.order.push(key.clone());
        }
        debug!(%key, generation, currsize = state.entries.len(), "cache miss, starting computation");

        let lookup = Lookup::Wait {
            generation,
            computation: fresh,
        };
        (
            lookup,
            Leftovers {
                args: None,
                evicted,
            },
        )
    }

    /// Stores the output if the entry is still the pending one this call
    /// waited on. Later completions of the same computation find it resolved
    /// and leave it alone.
    fn complete(&self, key: &CacheKey, generation: u64, value: &V) {
        let replaced = {
            let mut state = self.state.lock();
            match state.entries.get_mut(key) {
                Some(entry) if entry.is_pending_generation(generation) => {
                    trace!(%key, generation, "computation resolved");
                    Some(std::mem::replace(entry, CacheEntry::Resolved(value.clone())))
                }
                _ => None,
            }
        };
        drop(replaced);
    }

    fn abandon(&self, key: &CacheKey, generation: u64) {
        let removed = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let current = state
                .entries
                .get(key)
                .map_or(false, |entry| entry.is_pending_generation(generation));
            if current {
                state.order.remove(key);
                state.entries.remove(key)
            } else {
                None
            }
        };
        if removed.is_some() {
            debug!(%key, generation, "computation panicked, entry discarded");
        }
    }
}

impl<A, V> AsyncMemoizer<A, V> {
    /// Snapshot of the hit/miss counters and the current size.
    pub fn cache_info(&self) -> CacheInfo {
        let currsize = self.state.lock().entries.len();
        CacheInfo {
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            maxsize: self.params.maxsize,
            currsize,
        }
    }

    /// Discards every entry and resets the statistics.
    ///
    /// Computations already in flight still deliver to the callers awaiting
    /// them, but their output is not stored.
    pub fn cache_clear(&self) {
        let cleared = {
            let mut state = self.state.lock();
            state.order.clear();
            std::mem::take(&mut state.entries)
        };
        self.stats.reset();
        debug!(cleared = cleared.len(), "cache cleared");
        drop(cleared);
    }

    /// The parameters this memoizer was decorated with.
    pub fn cache_parameters(&self) -> CacheParameters {
        self.params
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<A, V> fmt::Debug for AsyncMemoizer<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncMemoizer")
            .field("policy", &self.policy)
            .field("typed", &self.params.typed)
            .field("info", &self.cache_info())
            .finish()
    }
}

/// Unbounded memoizer, the equivalent of `lru_cache(None)`.
///
/// ```
/// use asyncache_core::cache;
///
/// let square = cache(|x: i64| async move { x * x });
/// let value = futures::executor::block_on(square.call(12)).unwrap();
/// assert_eq!(value, 144);
/// assert_eq!(square.cache_info().maxsize, None);
/// ```
pub fn cache<A, V, F, Fut>(func: F) -> AsyncMemoizer<A, V>
where
    A: CacheArg + Send + 'static,
    V: Clone + Send + Sync + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = V> + Send + 'static,
{
    AsyncMemoizer::new(CacheParameters::unbounded(), func)
}

/// Least-recently-used decorator with capacity `maxsize`.
///
/// `None` disables the bound. The returned parameters wrap a function through
/// [`CacheParameters::decorate`], optionally after [`CacheParameters::typed`].
///
/// ```
/// use asyncache_core::lru_cache;
///
/// let params = lru_cache(16).typed(true);
/// assert_eq!(params.maxsize, Some(16));
/// assert!(params.typed);
/// assert_eq!(lru_cache(None).maxsize, None);
/// ```
pub fn lru_cache(maxsize: impl Into<Option<usize>>) -> CacheParameters {
    CacheParameters::new(maxsize.into())
}
