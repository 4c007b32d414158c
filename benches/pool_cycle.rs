//! Benchmarks for the borrow/release hot path
//!
//! Measures the cost of a full get/release cycle against an in-memory
//! dialer, for the reuse path (idle store hit) and the overflow path
//! (dial on every borrow).
//!
//! Run with: cargo bench --bench pool_cycle

use divan::{Bencher, black_box};
use stream_pool::{ChannelPool, MockDialer, PoolConfig};

fn main() {
    divan::main();
}

#[divan::bench(sample_count = 100, sample_size = 100)]
fn get_release_reuse(bencher: Bencher) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("build runtime");
    let pool = rt
        .block_on(ChannelPool::connect(PoolConfig::new(1, 4), MockDialer::new()))
        .expect("construct pool");

    bencher.bench(|| {
        rt.block_on(async {
            let conn = black_box(&pool).get().await.expect("borrow");
            conn.release().await.expect("release");
        });
    });
}

#[divan::bench(sample_count = 100, sample_size = 100)]
fn get_release_overflow(bencher: Bencher) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("build runtime");
    let pool = rt
        .block_on(ChannelPool::connect(PoolConfig::new(0, 4), MockDialer::new()))
        .expect("construct pool");

    bencher.bench(|| {
        rt.block_on(async {
            let conn = black_box(&pool).get().await.expect("borrow");
            // Detach instead of releasing so the idle store stays empty and
            // every borrow takes the dial path
            drop(conn.detach());
        });
    });
}

#[divan::bench(sample_count = 100, sample_size = 100)]
fn len_snapshot(bencher: Bencher) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("build runtime");
    let pool = rt
        .block_on(ChannelPool::connect(PoolConfig::new(4, 4), MockDialer::new()))
        .expect("construct pool");

    bencher.bench(|| black_box(&pool).len());
}
