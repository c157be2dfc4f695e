use alloy::primitives::{I256, U256};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use oracle_arb::arb::detector::PriceComparison;
use oracle_arb::arb::types::{OracleQuote, ReserveSnapshot};
use oracle_arb::scenario::Scenario;

const DEMO: &str = include_str!("../scenarios/demo.json");

/// Quote of `price` hundred-millionths, expressed with `decimals` decimals
fn quote(price: i64, decimals: u8) -> OracleQuote {
    let answer = if decimals >= 8 {
        I256::try_from(price).unwrap_or(I256::ZERO)
            * I256::try_from(10i64.pow(u32::from(decimals - 8))).unwrap_or(I256::ONE)
    } else {
        I256::try_from(price / 10i64.pow(u32::from(8 - decimals))).unwrap_or(I256::ZERO)
    };
    OracleQuote {
        price: answer,
        decimals,
        round_id: 1,
        updated_at: 1_700_000_000,
    }
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_comparison");

    let snapshot = ReserveSnapshot::new(
        U256::from(1_000_000_000_000u64),
        U256::from(2_000_000_000_000u64),
        1_700_000_000,
    )
    .unwrap_or_else(|| unreachable!("reserves are non-zero"));
    let threshold = U256::from(500_000u64);

    for decimals in [6u8, 8, 18] {
        let a_to_b = quote(190_000_000, decimals);
        let b_to_a = quote(52_000_000, decimals);

        group.bench_with_input(BenchmarkId::from_parameter(decimals), &decimals, |b, _| {
            b.iter(|| {
                PriceComparison::compute(
                    black_box(&snapshot),
                    black_box(&a_to_b),
                    black_box(&b_to_a),
                    threshold,
                )
            });
        });
    }

    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let scenario = Scenario::parse(DEMO).unwrap_or_else(|e| unreachable!("demo scenario: {e}"));
    let controller = scenario.config.controller;

    c.bench_function("execute_demo", |b| {
        b.iter_batched(
            || {
                scenario
                    .build()
                    .unwrap_or_else(|e| unreachable!("demo world: {e}"))
            },
            |mut world| world.engine.execute(&mut world.ledger, controller),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_detect, bench_execute);
criterion_main!(benches);
