use asyncache_core::{lru_cache, AsyncMemoizer, DEFAULT_MAXSIZE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

fn counting(maxsize: Option<usize>) -> (AsyncMemoizer<usize, &'static str>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let memo = lru_cache(maxsize).decorate(move |_arg: usize| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { "called" }
    });
    (memo, calls)
}

/// Fill every slot, then check which entries survive new insertions.
#[tokio::test]
async fn test_invalidate_cache() {
    let (memo, calls) = counting(Some(DEFAULT_MAXSIZE));
    let maxsize = memo.cache_info().maxsize.unwrap();

    for i in 0..maxsize {
        assert_eq!(memo.call(i).await.unwrap(), "called");
        assert_eq!(calls.load(Ordering::SeqCst), i + 1);
    }

    // The first filled slot is cached
    assert_eq!(memo.call(0).await.unwrap(), "called");
    assert_eq!(calls.load(Ordering::SeqCst), maxsize);

    // A new key is not
    assert_eq!(memo.call(maxsize).await.unwrap(), "called");
    assert_eq!(calls.load(Ordering::SeqCst), maxsize + 1);

    // The least recently used key (1, since 0 was touched) was evicted
    assert_eq!(memo.call(1).await.unwrap(), "called");
    assert_eq!(calls.load(Ordering::SeqCst), maxsize + 2);

    // A recently used key is still cached
    assert_eq!(memo.call(0).await.unwrap(), "called");
    assert_eq!(calls.load(Ordering::SeqCst), maxsize + 2);
}

#[tokio::test]
async fn test_insertion_beyond_capacity_evicts_first() {
    let (memo, calls) = counting(Some(2));

    memo.call(1).await.unwrap();
    memo.call(2).await.unwrap();
    memo.call(3).await.unwrap();

    let info = memo.cache_info();
    assert_eq!((info.hits, info.misses, info.currsize), (0, 3, 2));

    // 1 is gone, 2 and 3 are not
    memo.call(3).await.unwrap();
    memo.call(2).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    memo.call(1).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_access_before_insertion_changes_victim() {
    let (memo, calls) = counting(Some(2));

    memo.call(1).await.unwrap();
    memo.call(2).await.unwrap();
    memo.call(1).await.unwrap(); // hit, 2 becomes least recent
    memo.call(3).await.unwrap(); // evicts 2

    memo.call(1).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    memo.call(2).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_size_never_exceeds_capacity() {
    let (memo, _calls) = counting(Some(3));

    for i in 0..50 {
        memo.call(i % 7).await.unwrap();
        assert!(memo.cache_info().currsize <= 3);
    }
}

#[tokio::test]
async fn test_unbounded_lru_cache() {
    let (memo, calls) = counting(None);

    for i in 0..500 {
        memo.call(i).await.unwrap();
    }
    for i in 0..500 {
        memo.call(i).await.unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 500);
    let info = memo.cache_info();
    assert_eq!((info.hits, info.misses, info.currsize), (500, 500, 500));
}

#[tokio::test]
async fn test_joining_pending_entry_counts_as_access() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    // Key 1 stays in flight until the gate opens
    let gate = Arc::new(Notify::new());
    let release = Arc::clone(&gate);
    let memo = lru_cache(2).decorate(move |x: u32| {
        let counter = Arc::clone(&counter);
        let gate = Arc::clone(&gate);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            if x == 1 {
                gate.notified().await;
            }
            x
        }
    });

    let mut first = Box::pin(memo.call(1));
    assert!(futures::poll!(&mut first).is_pending());
    memo.call(2).await.unwrap();

    // Joining the pending key 1 makes 2 the least recently used one
    let mut joined = Box::pin(memo.call(1));
    assert!(futures::poll!(&mut joined).is_pending());
    memo.call(3).await.unwrap();
    assert!(futures::poll!(&mut first).is_pending());

    release.notify_one();
    assert_eq!(first.await.unwrap(), 1);
    assert_eq!(joined.await.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    memo.call(1).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    memo.call(2).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_independent_memoizers_do_not_share_entries() {
    let shared_calls = Arc::new(AtomicUsize::new(0));
    let make = || {
        let counter = Arc::clone(&shared_calls);
        lru_cache(4).decorate(move |x: u8| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { x }
        })
    };
    let a = make();
    let b = make();

    a.call(1).await.unwrap();
    b.call(1).await.unwrap();

    assert_eq!(shared_calls.load(Ordering::SeqCst), 2);
    assert_eq!(a.cache_info().currsize, 1);
    assert_eq!(b.cache_info().currsize, 1);
}
