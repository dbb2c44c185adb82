//! Benchmarks for order book operations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use depthscope::indicator::Rsi;
use depthscope::orderbook::{DeltaEvent, OrderBook, Side};
use rust_decimal::Decimal;
use std::str::FromStr;

fn populated_book(levels: u32) -> OrderBook {
    let volume = Decimal::from_str("1.5").unwrap();
    let deltas: Vec<DeltaEvent> = (0..levels)
        .flat_map(|i| {
            [
                DeltaEvent::bid(Decimal::from(50000 - i), volume),
                DeltaEvent::ask(Decimal::from(50001 + i), volume),
            ]
        })
        .collect();

    let mut book = OrderBook::new("BTCUSDT");
    book.apply_batch(&deltas, 0);
    book
}

fn create_batch() -> Vec<DeltaEvent> {
    vec![
        DeltaEvent::bid(Decimal::from(49999), Decimal::from_str("2.0").unwrap()),
        DeltaEvent::bid(Decimal::from(49990), Decimal::ZERO),
        DeltaEvent::ask(Decimal::from(50001), Decimal::from_str("2.5").unwrap()),
        DeltaEvent::ask(Decimal::from(50010), Decimal::ZERO),
    ]
}

fn benchmark_apply_batch(c: &mut Criterion) {
    let mut book = populated_book(1000);
    let batch = create_batch();

    c.bench_function("apply_batch_1000_levels", |b| {
        b.iter(|| {
            book.apply_batch(black_box(&batch), 0);
        })
    });
}

fn benchmark_snapshot(c: &mut Criterion) {
    let book = populated_book(1000);

    c.bench_function("snapshot_ask_depth_10", |b| {
        b.iter(|| black_box(book.snapshot(Side::Ask, 10)))
    });

    c.bench_function("snapshot_bid_depth_10", |b| {
        b.iter(|| black_box(book.snapshot(Side::Bid, 10)))
    });

    c.bench_function("metrics", |b| b.iter(|| black_box(book.metrics(10))));
}

fn benchmark_rsi_update(c: &mut Criterion) {
    let mut rsi = Rsi::new(14).unwrap();
    let window: Vec<Decimal> = (0..15).map(|i| Decimal::from(100 + i % 3)).collect();
    rsi.seed(&window).unwrap();
    let sample = Decimal::from_str("101.25").unwrap();

    c.bench_function("rsi_update", |b| {
        b.iter(|| black_box(rsi.update(black_box(sample))))
    });
}

criterion_group!(
    benches,
    benchmark_apply_batch,
    benchmark_snapshot,
    benchmark_rsi_update
);
criterion_main!(benches);
