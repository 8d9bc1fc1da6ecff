//! # Asyncache
//!
//! Memoization for `async` functions. A memoized function runs at most once
//! per distinct argument list while the result stays cached, and concurrent
//! callers with equal arguments share the single computation in flight.
//!
//! ## Features
//!
//! - **Two decorators**: [`macro@cache`] (unbounded) and [`macro@lru_cache`]
//!   (least recently used, bounded)
//! - **In-flight deduplication**: callers arriving while a computation runs
//!   attach to it instead of starting their own
//! - **Outcome caching**: `Err` values are cached like any other output
//! - **Introspection**: hits, misses, capacity and size through `cache_info`
//! - **No global registry**: every decorated function owns its cache
//!
//! ## Quick Start
//!
//! ```rust
//! use asyncache::lru_cache;
//!
//! #[lru_cache(maxsize = 2)]
//! async fn double(x: u64) -> u64 {
//!     x * 2
//! }
//!
//! futures::executor::block_on(async {
//!     assert_eq!(double(3).await, 6); // computed
//!     assert_eq!(double(3).await, 6); // cached
//! });
//!
//! let info = double_cache_info();
//! assert_eq!((info.hits, info.misses, info.currsize), (1, 1, 1));
//! ```
//!
//! ## Memoizing Closures
//!
//! Without the attributes, [`cache()`] and [`lru_cache()`] wrap any closure
//! returning a future. Tuples spread into positional arguments and [`Kw`]
//! marks a keyword argument; keywords are matched by name, not by position.
//!
//! ```rust
//! use asyncache::{lru_cache, Kw};
//!
//! let scale = lru_cache(16).decorate(|(x, Kw(_, factor)): (f64, Kw<f64>)| async move {
//!     x * factor
//! });
//!
//! futures::executor::block_on(async {
//!     assert_eq!(scale.call((2.0, Kw("factor", 1.5))).await.unwrap(), 3.0);
//!     assert!(scale.call((f64::NAN, Kw("factor", 1.0))).await.is_err());
//! });
//! ```
//!
//! ## Typed Keys
//!
//! By default `3` and `3.0` are the same argument. With `typed = true` they
//! are cached separately:
//!
//! ```rust
//! use asyncache::cache;
//!
//! #[cache(typed = true)]
//! async fn describe(x: f64) -> String {
//!     format!("{x}")
//! }
//!
//! assert!(describe_cache_parameters().typed);
//! ```
//!
//! ## Errors
//!
//! Functions returning `Result<T, E>` cache both `Ok` and `Err`. Clear the
//! cache to retry a failure:
//!
//! ```rust
//! use asyncache::cache;
//!
//! #[cache]
//! async fn divide(a: i32, b: i32) -> Result<i32, String> {
//!     if b == 0 {
//!         Err("Division by zero".to_string())
//!     } else {
//!         Ok(a / b)
//!     }
//! }
//!
//! futures::executor::block_on(async {
//!     assert!(divide(10, 0).await.is_err());
//!     assert!(divide(10, 0).await.is_err()); // replayed from the cache
//! });
//! assert_eq!(divide_cache_info().hits, 1);
//!
//! divide_cache_clear();
//! assert_eq!(divide_cache_info().currsize, 0);
//! ```

pub use asyncache_core::*;
pub use asyncache_macros::{cache, lru_cache};

#[doc(hidden)]
pub use once_cell;
