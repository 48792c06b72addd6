//! Book matching throughput

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use matching_engine::{InMemoryRestingStore, MarketRemainderPolicy, OrderBook};
use types::order::{OrderRecord, OrderType, Side};

fn limit(id: u64, side: Side, price: u64, quantity: u64) -> OrderRecord {
    OrderRecord::new(id, "BTC-USD", side, OrderType::Limit, price, quantity, 100 + id)
}

fn populated_book(levels: u64, orders_per_level: u64) -> OrderBook {
    let store = Arc::new(InMemoryRestingStore::new());
    let mut book = OrderBook::new("BTC-USD", 0, store, MarketRemainderPolicy::Drop);
    let mut id = 1;
    for i in 0..levels {
        for _ in 0..orders_per_level {
            book.process_order(&limit(id, Side::SELL, 50_000 + i * 10, 10));
            id += 1;
        }
    }
    book
}

fn bench_resting_insert(c: &mut Criterion) {
    c.bench_function("insert_resting_order", |b| {
        b.iter_batched(
            || populated_book(100, 4),
            |mut book| {
                // A bid far below the asks always rests.
                book.process_order(black_box(&limit(1_000_000, Side::BUY, 40_000, 10)));
                book
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_single_level_fill(c: &mut Criterion) {
    c.bench_function("fill_at_best_ask", |b| {
        b.iter_batched(
            || populated_book(100, 4),
            |mut book| {
                book.process_order(black_box(&limit(1_000_000, Side::BUY, 50_000, 10)));
                book
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_multi_level_sweep(c: &mut Criterion) {
    c.bench_function("sweep_ten_levels", |b| {
        b.iter_batched(
            || populated_book(100, 4),
            |mut book| {
                book.process_order(black_box(&limit(1_000_000, Side::BUY, 50_090, 400)));
                book
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_resting_insert,
    bench_single_level_fill,
    bench_multi_level_sweep
);
criterion_main!(benches);
