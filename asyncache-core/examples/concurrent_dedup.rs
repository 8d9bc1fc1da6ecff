//! # Concurrent Deduplication Example
//!
//! Ten tasks ask for the same two values at once. Each value is computed a
//! single time; every other task attaches to the computation in flight.
//!
//! Run with `RUST_LOG=asyncache_core=debug` to see the misses and joins.

use asyncache_core::lru_cache;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

static EXEC_COUNT: AtomicUsize = AtomicUsize::new(0);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Concurrent Deduplication Example ===\n");

    let fibonacci = Arc::new(lru_cache(100).decorate(|n: u32| async move {
        EXEC_COUNT.fetch_add(1, Ordering::SeqCst);
        println!("Computing fibonacci({})", n);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let (mut a, mut b) = (0u64, 1u64);
        for _ in 0..n {
            let next = a + b;
            a = b;
            b = next;
        }
        a
    }));

    let mut tasks = JoinSet::new();
    for i in 0..10 {
        let fibonacci = Arc::clone(&fibonacci);
        tasks.spawn(async move {
            let first = fibonacci.call(20).await.unwrap();
            let second = fibonacci.call(25).await.unwrap();
            println!("Task {} finished: fib(20)={}, fib(25)={}", i, first, second);
            (first, second)
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert_eq!(result.unwrap(), (6765, 75025));
    }

    let executions = EXEC_COUNT.load(Ordering::SeqCst);
    println!("\nFunction executions: {}", executions);
    println!("{}", fibonacci.cache_info());
    assert_eq!(executions, 2);

    println!("\n✅ Each value was computed exactly once");
}
