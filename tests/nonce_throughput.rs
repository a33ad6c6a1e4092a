//! Throughput of the nonce registry over the in-memory store.
//!
//! Run with: cargo test --test nonce_throughput -- --nocapture

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use wallet_auth::{Identity, ManualClock, MemoryNonceStore, NonceError, NonceRegistry};

const DATASET_SIZE: usize = 2_000;

/// Performance benchmark result
#[derive(Debug)]
struct BenchmarkResult {
    operation: String,
    duration: Duration,
    operations: usize,
    ops_per_sec: f64,
}

impl BenchmarkResult {
    fn new(operation: &str, duration: Duration, operations: usize) -> Self {
        let ops_per_sec = operations as f64 / duration.as_secs_f64();
        Self {
            operation: operation.to_string(),
            duration,
            operations,
            ops_per_sec,
        }
    }

    fn print(&self) {
        println!(
            "  {}: {:?} ({:.0} ops/sec, {} ops)",
            self.operation, self.duration, self.ops_per_sec, self.operations
        );
    }

    fn assert_min_ops_per_sec(&self, min_ops: f64) {
        assert!(
            self.ops_per_sec >= min_ops,
            "{} should achieve at least {:.0} ops/sec, got {:.0}",
            self.operation,
            min_ops,
            self.ops_per_sec
        );
    }
}

fn registry(clock: Arc<ManualClock>) -> Arc<NonceRegistry<MemoryNonceStore>> {
    Arc::new(NonceRegistry::new(
        Arc::new(MemoryNonceStore::with_capacity(DATASET_SIZE)),
        clock,
        Duration::from_secs(120),
    ))
}

fn identity(i: usize) -> Identity {
    Identity::new(&format!("0x{i:040x}"))
}

#[tokio::test]
async fn test_sequential_issue_and_consume() {
    let registry = registry(Arc::new(ManualClock::new(1_700_000_000)));

    let start = Instant::now();
    for i in 0..DATASET_SIZE {
        registry.issue(&identity(i)).await.unwrap();
    }
    let issue = BenchmarkResult::new("Sequential issue", start.elapsed(), DATASET_SIZE);

    let start = Instant::now();
    for i in 0..DATASET_SIZE {
        registry.consume(&identity(i)).await.unwrap();
    }
    let consume = BenchmarkResult::new("Sequential consume", start.elapsed(), DATASET_SIZE);

    issue.print();
    consume.print();
    issue.assert_min_ops_per_sec(1_000.0);
    consume.assert_min_ops_per_sec(1_000.0);

    assert_eq!(registry.stats().await.unwrap().total_records, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_identities() {
    let registry = registry(Arc::new(ManualClock::new(1_700_000_000)));

    let start = Instant::now();
    let mut tasks = JoinSet::new();
    for i in 0..DATASET_SIZE {
        let registry = Arc::clone(&registry);
        tasks.spawn(async move {
            let identity = identity(i);
            let issued = registry.issue(&identity).await?;
            let consumed = registry.consume(&identity).await?;
            Ok::<bool, NonceError>(issued == consumed)
        });
    }

    let mut matched = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap().unwrap() {
            matched += 1;
        }
    }
    let result = BenchmarkResult::new("Concurrent issue+consume", start.elapsed(), DATASET_SIZE);
    result.print();

    assert_eq!(matched, DATASET_SIZE);
}

#[tokio::test]
async fn test_cleanup_of_large_expired_set() {
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let registry = registry(Arc::clone(&clock));

    for i in 0..DATASET_SIZE {
        registry.issue(&identity(i)).await.unwrap();
    }
    clock.advance(121);
    for i in DATASET_SIZE..DATASET_SIZE + 10 {
        registry.issue(&identity(i)).await.unwrap();
    }

    let start = Instant::now();
    let removed = registry.cleanup_expired().await.unwrap();
    BenchmarkResult::new("Cleanup", start.elapsed(), removed).print();

    assert!(removed <= DATASET_SIZE);
    assert_eq!(registry.stats().await.unwrap().total_records, 10);
}
