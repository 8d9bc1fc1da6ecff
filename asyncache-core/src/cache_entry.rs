use std::any::Any;
use std::fmt;
use std::panic;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

/// Output of a computation: the wrapped function's value, or the panic that
/// interrupted it.
pub type Outcome<V> = Result<V, Panicked>;

/// The single in-flight computation behind a pending entry.
///
/// Every caller that joins the entry holds a clone and polls it; whichever
/// clone is polled drives the wrapped future, and all of them observe the same
/// outcome.
pub type Computation<V> = Shared<BoxFuture<'static, Outcome<V>>>;

/// A panic caught inside a shared computation.
///
/// Panics are caught so that the shared future completes and wakes every
/// waiter instead of leaving them suspended. The first caller to resume the
/// panic receives the original payload; later callers receive a message
/// payload.
#[derive(Clone)]
pub struct Panicked(Arc<Mutex<Option<Box<dyn Any + Send>>>>);

impl Panicked {
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        Self(Arc::new(Mutex::new(Some(payload))))
    }

    /// Continues unwinding in the current caller.
    pub fn resume(self) -> ! {
        let payload = self.0.lock().take();
        match payload {
            Some(payload) => panic::resume_unwind(payload),
            None => panic::resume_unwind(Box::new("memoized computation panicked")),
        }
    }
}

impl fmt::Debug for Panicked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Panicked")
    }
}

/// A slot in the memoizer's map.
///
/// # Lifecycle
///
/// `Pending` is created on the first call for a key and replaced by
/// `Resolved` once the computation completes. Neither state ever goes back to
/// `Pending`: after an eviction, a clear or a panic the key is simply absent
/// and the next call starts over with a fresh generation.
pub enum CacheEntry<V> {
    /// Computation in progress.
    ///
    /// `generation` identifies this particular computation, so that a
    /// completion arriving after the key was cleared, evicted or restarted
    /// does not overwrite a newer entry.
    Pending {
        generation: u64,
        computation: Computation<V>,
    },
    /// Completed outcome, cached verbatim (an `Err` value included).
    Resolved(V),
}

impl<V> CacheEntry<V> {
    pub fn is_pending(&self) -> bool {
        matches!(self, CacheEntry::Pending { .. })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, CacheEntry::Resolved(_))
    }

    /// True if this is the pending entry started under `generation`.
    pub fn is_pending_generation(&self, generation: u64) -> bool {
        matches!(self, CacheEntry::Pending { generation: g, .. } if *g == generation)
    }
}
