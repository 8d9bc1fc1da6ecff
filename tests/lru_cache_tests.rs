use asyncache::{lru_cache, CacheParameters, DEFAULT_MAXSIZE};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Test basic LRU memoization with the default capacity
#[tokio::test]
async fn test_caching() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[lru_cache]
    async fn call(arg: usize) -> &'static str {
        let _ = arg;
        CALLS.fetch_add(1, Ordering::SeqCst);
        "called"
    }

    assert_eq!(call(3).await, "called");
    assert_eq!(call(3).await, "called");
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(
        call_cache_parameters(),
        CacheParameters {
            maxsize: Some(DEFAULT_MAXSIZE),
            typed: false
        }
    );
}

/// Fill every slot, then check which entries survive new insertions
#[tokio::test]
async fn test_invalidate_cache() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[lru_cache]
    async fn call(arg: usize) -> &'static str {
        let _ = arg;
        CALLS.fetch_add(1, Ordering::SeqCst);
        "called"
    }

    let maxsize = call_cache_info().maxsize.unwrap();

    for i in 0..maxsize {
        assert_eq!(call(i).await, "called");
        assert_eq!(CALLS.load(Ordering::SeqCst), i + 1);
    }

    // The first filled slot is cached
    assert_eq!(call(0).await, "called");
    assert_eq!(CALLS.load(Ordering::SeqCst), maxsize);

    // A new key is not
    assert_eq!(call(maxsize).await, "called");
    assert_eq!(CALLS.load(Ordering::SeqCst), maxsize + 1);

    // The least recently used key is gone
    assert_eq!(call(1).await, "called");
    assert_eq!(CALLS.load(Ordering::SeqCst), maxsize + 2);

    // A recently used key is still cached
    assert_eq!(call(0).await, "called");
    assert_eq!(CALLS.load(Ordering::SeqCst), maxsize + 2);
}

/// Test eviction order with a capacity of two
#[tokio::test]
async fn test_lru_eviction() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[lru_cache(maxsize = 2)]
    async fn square(x: u32) -> u32 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        x * x
    }

    assert_eq!(square(1).await, 1);
    assert_eq!(square(2).await, 4);
    assert_eq!(square(3).await, 9); // evicts 1

    let info = square_cache_info();
    assert_eq!((info.hits, info.misses, info.currsize), (0, 3, 2));
    assert_eq!(info.maxsize, Some(2));

    assert_eq!(square(1).await, 1); // miss, evicts 2
    assert_eq!(CALLS.load(Ordering::SeqCst), 4);
    assert_eq!(square(3).await, 9); // hit
    assert_eq!(CALLS.load(Ordering::SeqCst), 4);
    assert_eq!(square(2).await, 4); // miss
    assert_eq!(CALLS.load(Ordering::SeqCst), 5);
}

/// Test that a hit protects a key from the next eviction
#[tokio::test]
async fn test_access_refreshes_recency() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[lru_cache(maxsize = 2)]
    async fn square(x: u32) -> u32 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        x * x
    }

    square(1).await;
    square(2).await;
    square(1).await; // hit, 2 is now least recent
    square(3).await; // evicts 2

    square(1).await;
    assert_eq!(CALLS.load(Ordering::SeqCst), 3);
    square(2).await;
    assert_eq!(CALLS.load(Ordering::SeqCst), 4);
}

/// Test that maxsize = 0 disables caching entirely
#[tokio::test]
async fn test_zero_maxsize() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[lru_cache(maxsize = 0)]
    async fn echo(x: u8) -> u8 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        x
    }

    echo(1).await;
    echo(1).await;

    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    let info = echo_cache_info();
    assert_eq!((info.hits, info.misses, info.currsize), (0, 2, 0));
}

/// Test that maxsize = None gives an unbounded cache
#[tokio::test]
async fn test_unbounded_lru_cache() {
    #[lru_cache(maxsize = None)]
    async fn echo(x: u32) -> u32 {
        x
    }

    for i in 0..300 {
        echo(i).await;
    }
    let info = echo_cache_info();
    assert_eq!(info.maxsize, None);
    assert_eq!(info.currsize, 300);
}

/// Test typed LRU keys
#[tokio::test]
async fn test_typed_lru_cache() {
    #[lru_cache(maxsize = 4, typed = true)]
    async fn describe(x: i64) -> String {
        format!("{}", x)
    }

    assert_eq!(describe(5).await, "5");
    assert_eq!(
        describe_cache_parameters(),
        CacheParameters {
            maxsize: Some(4),
            typed: true
        }
    );
}

/// Test that clearing resets both entries and statistics
#[tokio::test]
async fn test_clear_resets_statistics() {
    #[lru_cache(maxsize = 8)]
    async fn echo(x: u32) -> u32 {
        x
    }

    echo(1).await;
    echo(1).await;
    echo_cache_clear();

    let info = echo_cache_info();
    assert_eq!((info.hits, info.misses, info.currsize), (0, 0, 0));
    assert_eq!(info.to_string(), "CacheInfo(hits=0, misses=0, maxsize=8, currsize=0)");
}
