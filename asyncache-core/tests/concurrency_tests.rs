use asyncache_core::{cache, lru_cache, AsyncMemoizer, CacheParameters};
use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Memoizer whose computation sleeps before answering `x * 10`.
fn slow_memo(params: CacheParameters) -> (AsyncMemoizer<u32, u32>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let memo = params.decorate(move |x: u32| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            x * 10
        }
    });
    (memo, calls)
}

#[tokio::test]
async fn test_concurrent_calls_share_one_computation() {
    let (memo, calls) = slow_memo(CacheParameters::unbounded());

    let results = join_all((0..5).map(|_| memo.call(4))).await;

    for result in results {
        assert_eq!(result.unwrap(), 40);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Joining a pending entry is a miss, not a hit
    let info = memo.cache_info();
    assert_eq!((info.hits, info.misses, info.currsize), (0, 5, 1));

    assert_eq!(memo.call(4).await.unwrap(), 40);
    assert_eq!(memo.cache_info().hits, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_distinct_keys_run_separately() {
    let (memo, calls) = slow_memo(CacheParameters::unbounded());

    let results = join_all((0..4).map(|x| memo.call(x))).await;

    let values: Vec<u32> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(values, vec![0, 10, 20, 30]);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(memo.cache_info().currsize, 4);
}

#[tokio::test]
async fn test_failure_is_cached_and_replayed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let memo = cache(move |x: i32| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if x < 0 {
                Err(Arc::new(format!("negative input: {}", x)))
            } else {
                Ok(x)
            }
        }
    });

    let first = memo.call(-1).await.unwrap().unwrap_err();
    let second = memo.call(-1).await.unwrap().unwrap_err();

    assert_eq!(*first, "negative input: -1");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(memo.cache_info().hits, 1);
}

#[tokio::test]
async fn test_failure_delivered_to_all_waiters() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let memo = cache(move |x: u32| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err::<u32, String>(format!("failed {}", x))
        }
    });

    let results = join_all((0..3).map(|_| memo.call(9))).await;

    for result in results {
        assert_eq!(result.unwrap(), Err("failed 9".to_string()));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_originator_does_not_cancel_waiters() {
    let (memo, calls) = slow_memo(CacheParameters::unbounded());

    let mut first = Box::pin(memo.call(1));
    assert!(futures::poll!(&mut first).is_pending());
    let mut second = Box::pin(memo.call(1));
    assert!(futures::poll!(&mut second).is_pending());

    drop(first);

    assert_eq!(second.await.unwrap(), 10);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The result was stored even though the originator went away
    assert_eq!(memo.call(1).await.unwrap(), 10);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(memo.cache_info().hits, 1);
}

#[tokio::test]
async fn test_cancelled_waiter_does_not_affect_originator() {
    let (memo, calls) = slow_memo(CacheParameters::unbounded());

    let mut first = Box::pin(memo.call(2));
    assert!(futures::poll!(&mut first).is_pending());
    let mut second = Box::pin(memo.call(2));
    assert!(futures::poll!(&mut second).is_pending());

    drop(second);

    assert_eq!(first.await.unwrap(), 20);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_abandoned_computation_resumes_on_next_call() {
    let (memo, calls) = slow_memo(CacheParameters::unbounded());

    let mut only = Box::pin(memo.call(3));
    assert!(futures::poll!(&mut only).is_pending());
    drop(only);

    // Entry is still pending; the next caller drives the same computation
    assert_eq!(memo.cache_info().currsize, 1);
    assert_eq!(memo.call(3).await.unwrap(), 30);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_clear_while_pending_delivers_but_does_not_store() {
    let (memo, calls) = slow_memo(CacheParameters::unbounded());

    let mut pending = Box::pin(memo.call(5));
    assert!(futures::poll!(&mut pending).is_pending());

    memo.cache_clear();
    assert_eq!(memo.cache_info().currsize, 0);

    assert_eq!(pending.await.unwrap(), 50);
    assert_eq!(memo.cache_info().currsize, 0);

    assert_eq!(memo.call(5).await.unwrap(), 50);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_restart_after_clear_keeps_newer_entry() {
    let (memo, calls) = slow_memo(CacheParameters::unbounded());

    let mut old = Box::pin(memo.call(6));
    assert!(futures::poll!(&mut old).is_pending());
    memo.cache_clear();

    // A second computation for the same key starts after the clear
    let mut new = Box::pin(memo.call(6));
    assert!(futures::poll!(&mut new).is_pending());

    assert_eq!(old.await.unwrap(), 60);
    assert_eq!(new.await.unwrap(), 60);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    assert_eq!(memo.call(6).await.unwrap(), 60);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(memo.cache_info().currsize, 1);
}

#[tokio::test]
async fn test_evicted_pending_entry_still_delivers() {
    let (memo, calls) = slow_memo(lru_cache(1));

    let mut pending = Box::pin(memo.call(1));
    assert!(futures::poll!(&mut pending).is_pending());

    // Inserting key 2 evicts the pending key 1
    assert_eq!(memo.call(2).await.unwrap(), 20);
    assert_eq!(pending.await.unwrap(), 10);

    let info = memo.cache_info();
    assert_eq!(info.currsize, 1);
    assert_eq!(info.maxsize, Some(1));

    assert_eq!(memo.call(2).await.unwrap(), 20);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    assert_eq!(memo.call(1).await.unwrap(), 10);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_panic_reaches_every_waiter_and_is_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let memo = cache(move |x: u32| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if x == 13 {
                panic!("unlucky number");
            }
            x
        }
    });

    let first = AssertUnwindSafe(memo.call(13)).catch_unwind();
    let second = AssertUnwindSafe(memo.call(13)).catch_unwind();
    let (first, second) = futures::join!(first, second);

    assert!(first.is_err());
    assert!(second.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(memo.cache_info().currsize, 0);

    // Not cached: the next call runs the function again
    assert!(AssertUnwindSafe(memo.call(13)).catch_unwind().await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Other keys are unaffected
    assert_eq!(memo.call(1).await.unwrap(), 1);
    assert_eq!(memo.cache_info().currsize, 1);
}

#[tokio::test]
async fn test_shared_across_spawned_tasks() {
    let (memo, calls) = slow_memo(lru_cache(8));
    let memo = Arc::new(memo);

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let memo = Arc::clone(&memo);
            tokio::spawn(async move { memo.call(7).await.unwrap() })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 70);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

fn fibonacci() -> &'static AsyncMemoizer<u64, u64> {
    static FIB: OnceLock<AsyncMemoizer<u64, u64>> = OnceLock::new();
    FIB.get_or_init(|| {
        cache(|n: u64| async move {
            if n < 2 {
                n
            } else {
                fibonacci().call(n - 1).await.unwrap() + fibonacci().call(n - 2).await.unwrap()
            }
        })
    })
}

#[tokio::test]
async fn test_recursive_memoized_function() {
    assert_eq!(fibonacci().call(80).await.unwrap(), 23_416_728_348_467_685);
    assert_eq!(fibonacci().cache_info().currsize, 81);
}
