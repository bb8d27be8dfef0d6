//! Criterion benchmarks for jqquant hot paths.
//!
//! Benchmarks:
//! 1. Full backtest over synthetic daily data (fetch, group, date loop)
//! 2. Order manager submit + fill throughput
//! 3. Metrics over a long value curve

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chrono::NaiveDate;
use std::sync::Arc;

use jqquant_core::data::{DataProvider, SyntheticProvider};
use jqquant_core::domain::{midnight, Frequency};
use jqquant_core::engine::{BacktestEngine, CostModel, OrderManager};
use jqquant_core::metrics::{max_drawdown, pct_change, sharpe_ratio};
use jqquant_core::strategy::{strategy_from_name, StrategyParams};

fn securities(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{:06}.XSHE", i + 1)).collect()
}

fn bench_backtest(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest");
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2019, 12, 31).unwrap();

    for n in [1usize, 10, 50] {
        let secs = securities(n);
        group.bench_with_input(BenchmarkId::new("ma_cross_5y", n), &secs, |b, secs| {
            b.iter(|| {
                let provider: Arc<dyn DataProvider> = Arc::new(SyntheticProvider::new(7));
                let mut engine = BacktestEngine::new(provider, 1_000_000.0, 0.0003, 0.001);
                engine.set_strategy(
                    strategy_from_name("ma_cross", &StrategyParams::new()).unwrap(),
                );
                black_box(engine.run(start, end, secs, Frequency::Daily).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_order_manager(c: &mut Criterion) {
    let at = midnight(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    c.bench_function("order_manager/submit_fill_1000", |b| {
        b.iter(|| {
            let mut om = OrderManager::new(CostModel::default());
            for i in 0..1_000 {
                let amount = if i % 2 == 0 { 100.0 } else { -100.0 };
                let id = om.submit("000001.XSHE", amount, at).unwrap();
                om.process_order(id, 10.0 + (i % 7) as f64, at).unwrap();
            }
            black_box(om.get_filled_orders().len())
        })
    });
}

fn bench_metrics(c: &mut Criterion) {
    let values: Vec<f64> = (0..2_520)
        .map(|i| 1_000_000.0 * (1.0 + (i as f64 * 0.05).sin() * 0.1))
        .collect();
    c.bench_function("metrics/10y_daily", |b| {
        b.iter(|| {
            let returns = pct_change(black_box(&values));
            black_box((sharpe_ratio(&returns), max_drawdown(&returns)))
        })
    });
}

criterion_group!(benches, bench_backtest, bench_order_manager, bench_metrics);
criterion_main!(benches);
