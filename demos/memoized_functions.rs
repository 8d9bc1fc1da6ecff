//! # Memoized Functions Example
//!
//! `#[cache]` and `#[lru_cache]` on plain `async fn`s, with the generated
//! `*_cache_info` and `*_cache_clear` companions.
//!
//! Run with `RUST_LOG=asyncache_core=trace` to follow every hit and miss.

use asyncache::{cache, lru_cache};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct User {
    id: u64,
    name: String,
}

/// Simulates a slow lookup
#[cache]
async fn fetch_user(id: u64) -> User {
    tokio::time::sleep(Duration::from_millis(200)).await;
    User {
        id,
        name: format!("User {}", id),
    }
}

#[lru_cache(maxsize = 3)]
async fn fibonacci(n: u64) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a + b;
        a = b;
        b = next;
    }
    a
}

#[cache]
async fn parse_port(raw: String) -> Result<u16, String> {
    raw.parse::<u16>()
        .map_err(|err| format!("invalid port {:?}: {}", raw, err))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Memoized Functions Example ===\n");

    let start = Instant::now();
    let user = fetch_user(1).await;
    println!("First fetch:  {:?} in {:?}", user, start.elapsed());

    let start = Instant::now();
    let user = fetch_user(1).await;
    println!("Second fetch: {:?} in {:?}", user, start.elapsed());
    assert_eq!(user.id, 1);
    assert_eq!(user.name, "User 1");
    println!("{}\n", fetch_user_cache_info());

    for n in [10, 20, 30, 10, 40, 20] {
        println!("fibonacci({}) = {}", n, fibonacci(n).await);
    }
    // 10 hits once; 40 evicts 20, so 20 misses again
    let info = fibonacci_cache_info();
    println!("{}\n", info);
    assert_eq!((info.hits, info.misses, info.currsize), (1, 5, 3));

    println!("{:?}", parse_port("8080".to_string()).await);
    println!("{:?}", parse_port("http".to_string()).await);
    println!("{:?}", parse_port("http".to_string()).await);
    assert_eq!(parse_port_cache_info().hits, 1);

    parse_port_cache_clear();
    println!("After clear: {}", parse_port_cache_info());

    println!("\n✅ Done");
}
