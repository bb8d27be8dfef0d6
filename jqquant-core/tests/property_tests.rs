//! Property tests for ledger and order invariants.
//!
//! Uses proptest to verify:
//! 1. Accounting identity: total value == cash + Σ amount × last price
//! 2. No double fills: a resolved order never transitions again
//! 3. Cash never goes negative through the engine, whatever is ordered
//! 4. `get_summary` is idempotent

use chrono::{Duration, NaiveDate, NaiveDateTime};
use jqquant_core::data::{DailyData, DataProvider, InMemoryProvider};
use jqquant_core::domain::{midnight, Bar, Frequency, Portfolio};
use jqquant_core::engine::{BacktestEngine, CostModel, OrderManager};
use jqquant_core::strategy::{Strategy as TradingStrategy, StrategyContext, StrategyError};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_amount() -> impl Strategy<Value = f64> {
    (1u32..2_000).prop_map(|a| a as f64)
}

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

#[derive(Debug, Clone)]
enum LedgerOp {
    Buy { security: usize, amount: f64, price: f64 },
    Sell { security: usize, amount: f64, price: f64 },
    Mark { security: usize, price: f64 },
}

fn arb_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (0usize..3, arb_amount(), arb_price())
            .prop_map(|(security, amount, price)| LedgerOp::Buy { security, amount, price }),
        (0usize..3, arb_amount(), arb_price())
            .prop_map(|(security, amount, price)| LedgerOp::Sell { security, amount, price }),
        (0usize..3, arb_price()).prop_map(|(security, price)| LedgerOp::Mark { security, price }),
    ]
}

const SECURITIES: [&str; 3] = ["A", "B", "C"];

fn ts(i: usize) -> NaiveDateTime {
    midnight(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + Duration::days(i as i64))
}

// ── 1. Accounting identity ───────────────────────────────────────────

proptest! {
    #[test]
    fn total_value_is_cash_plus_marked_positions(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut pf = Portfolio::new(1_000_000.0);
        for (i, op) in ops.iter().enumerate() {
            match *op {
                LedgerOp::Buy { security, amount, price } => {
                    let cost = amount * price;
                    if pf.withdraw(cost).is_ok() {
                        pf.add_position(SECURITIES[security], amount, price).unwrap();
                    }
                }
                LedgerOp::Sell { security, amount, price } => {
                    if pf.remove_position(SECURITIES[security], amount, price).is_ok() {
                        pf.deposit(amount * price).unwrap();
                    }
                }
                LedgerOp::Mark { security, price } => {
                    let mut prices = BTreeMap::new();
                    prices.insert(SECURITIES[security].to_string(), price);
                    pf.update_prices(&prices);
                }
            }

            let snap = pf.record(ts(i));
            let marked: f64 = pf.positions().map(|p| p.amount * p.last_price).sum();
            prop_assert!((snap.total_value - (snap.cash + marked)).abs() < 1e-6);
            prop_assert!(snap.cash >= 0.0);
            prop_assert!(pf.positions().all(|p| p.amount >= 0.0));
        }
    }
}

// ── 2. No double fills ───────────────────────────────────────────────

proptest! {
    #[test]
    fn resolved_orders_never_transition_again(
        amount in arb_amount(),
        price in arb_price(),
        second_price in arb_price(),
        reject_first in any::<bool>(),
    ) {
        let mut om = OrderManager::new(CostModel::new(0.0003, 0.001));
        let id = om.submit("A", amount, ts(0)).unwrap();
        if reject_first {
            om.reject(id, "insufficient cash").unwrap();
        } else {
            prop_assert!(om.process_order(id, price, ts(0)).unwrap());
        }
        let before = om.get_order(id).unwrap().clone();

        prop_assert!(om.process_order(id, second_price, ts(1)).is_err());
        prop_assert!(om.reject(id, "again").is_err());

        let after = om.get_order(id).unwrap();
        prop_assert_eq!(&before.status, &after.status);
        prop_assert_eq!(before.fill_price, after.fill_price);
        prop_assert_eq!(before.filled_at, after.filled_at);
    }

    #[test]
    fn commission_is_rate_times_fill_value(amount in arb_amount(), price in arb_price(), sell in any::<bool>()) {
        let mut om = OrderManager::new(CostModel::new(0.0003, 0.001));
        let signed = if sell { -amount } else { amount };
        let id = om.submit("A", signed, ts(0)).unwrap();
        om.process_order(id, price, ts(0)).unwrap();
        let order = om.get_order(id).unwrap();
        let expected = (order.fill_amount.unwrap() * order.fill_price.unwrap()).abs() * 0.0003;
        prop_assert!((om.get_commission(order) - expected).abs() < 1e-9);
    }
}

// ── 3. Cash never negative through the engine ───────────────────────

/// Orders a fixed list of amounts, one per date, in `handle_data`.
struct RandomOrders {
    amounts: Vec<f64>,
}

impl TradingStrategy for RandomOrders {
    fn name(&self) -> &str {
        "random_orders"
    }

    fn handle_data(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        data: &DailyData,
    ) -> Result<(), StrategyError> {
        let i = (data.timestamp() - ts(0)).num_days() as usize;
        if let Some(&amount) = self.amounts.get(i) {
            ctx.order("A", amount)?;
        }
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn engine_cash_never_negative(
        closes in prop::collection::vec(arb_price(), 2..30),
        amounts in prop::collection::vec((-3_000i32..3_000).prop_filter("non-zero", |a| *a != 0), 1..30),
    ) {
        let rows: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                security: "A".into(),
                timestamp: ts(i),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1_000.0,
            })
            .collect();
        let provider: Arc<dyn DataProvider> = Arc::new(InMemoryProvider::new(rows));
        let mut engine = BacktestEngine::new(provider, 50_000.0, 0.0003, 0.001);
        engine.set_strategy(Box::new(RandomOrders {
            amounts: amounts.iter().map(|&a| a as f64).collect(),
        }));
        let end = ts(closes.len() - 1).date();
        let result = engine
            .run(ts(0).date(), end, &["A".to_string()], Frequency::Daily)
            .unwrap();

        prop_assert!(result.portfolio_history.iter().all(|s| s.cash >= 0.0));
        prop_assert_eq!(
            result.trade_history.len() + result.rejected_orders,
            engine.order_manager().orders().len()
        );
        let pf = engine.portfolio();
        let marked: f64 = pf.positions().map(|p| p.amount * p.last_price).sum();
        prop_assert!((pf.total_value() - (pf.cash() + marked)).abs() < 1e-6);
    }
}

// ── 4. Summary idempotence ───────────────────────────────────────────

proptest! {
    #[test]
    fn summary_is_idempotent(amount in arb_amount(), price in arb_price(), mark in arb_price()) {
        let mut pf = Portfolio::new(1_000_000.0);
        if pf.withdraw(amount * price).is_ok() {
            pf.add_position("A", amount, price).unwrap();
        }
        let mut prices = BTreeMap::new();
        prices.insert("A".to_string(), mark);
        pf.update_prices(&prices);
        pf.record(ts(0));

        let first = pf.get_summary();
        let second = pf.get_summary();
        prop_assert_eq!(first, second);
    }
}
