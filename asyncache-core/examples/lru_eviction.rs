//! # LRU Eviction Example
//!
//! A two-entry LRU cache: a hit refreshes a key, and inserting past capacity
//! evicts whichever key was used least recently.

use asyncache_core::lru_cache;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

static EXEC_COUNT: AtomicUsize = AtomicUsize::new(0);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== LRU Eviction Example ===\n");

    let square = lru_cache(2).decorate(|x: u32| async move {
        EXEC_COUNT.fetch_add(1, Ordering::SeqCst);
        println!("Executing square({})", x);
        x * x
    });

    // miss -> [1]
    assert_eq!(square.call(1).await.unwrap(), 1);
    // miss -> [1, 2]
    assert_eq!(square.call(2).await.unwrap(), 4);
    // hit -> [2, 1]
    assert_eq!(square.call(1).await.unwrap(), 1);
    // miss, evicts 2 -> [1, 3]
    assert_eq!(square.call(3).await.unwrap(), 9);
    // hit -> [3, 1]
    assert_eq!(square.call(1).await.unwrap(), 1);
    // miss, 2 was evicted -> [1, 2]
    assert_eq!(square.call(2).await.unwrap(), 4);

    println!("\n{}", square.cache_info());
    assert_eq!(EXEC_COUNT.load(Ordering::SeqCst), 4);

    square.cache_clear();
    println!("After clear: {}", square.cache_info());

    println!("\n✅ LRU eviction works as expected");
}
