//! Payout Computation Benchmarks — Settlement Hot Path
//!
//! Benchmarks the pari-mutuel payout sheet over realistic bet volumes.
//! Settlement runs once per race, but the sheet is rebuilt on every
//! resumed invocation, so it should stay cheap at large pot sizes.
//!
//! Run with: cargo bench --bench payout_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use uuid::Uuid;

use parimutuel_engine::domain::payout::PayoutSheet;
use parimutuel_engine::domain::race::Bet;

fn bets_across_field(count: usize) -> Vec<Bet> {
    let race_id = Uuid::new_v4();
    (0..count)
        .map(|i| {
            Bet::pending(
                Uuid::new_v4(),
                race_id,
                format!("h{}", i % 5),
                Decimal::from((i % 200 + 1) as u64),
            )
        })
        .collect()
}

/// Benchmark sheet construction for a small race (typical cycle).
fn bench_payout_sheet_small(c: &mut Criterion) {
    let bets = bets_across_field(50);
    let winner = "h1".to_string();

    c.bench_function("payout_sheet_50_bets", |b| {
        b.iter(|| {
            let _sheet = PayoutSheet::build(black_box(&bets), black_box(&winner));
        });
    });
}

/// Benchmark sheet construction for a heavily bet race.
fn bench_payout_sheet_large(c: &mut Criterion) {
    let bets = bets_across_field(10_000);
    let winner = "h3".to_string();

    c.bench_function("payout_sheet_10k_bets", |b| {
        b.iter(|| {
            let _sheet = PayoutSheet::build(black_box(&bets), black_box(&winner));
        });
    });
}

/// Benchmark the per-bet payout lookup used inside the settle loop.
fn bench_payout_lookup(c: &mut Criterion) {
    let bets = bets_across_field(1_000);
    let winner = "h0".to_string();
    let sheet = PayoutSheet::build(&bets, &winner);
    let probe = bets[500].id;

    c.bench_function("payout_lookup_1k_bets", |b| {
        b.iter(|| {
            let _payout = sheet.payout_for(black_box(probe));
        });
    });
}

criterion_group!(
    benches,
    bench_payout_sheet_small,
    bench_payout_sheet_large,
    bench_payout_lookup
);
criterion_main!(benches);
