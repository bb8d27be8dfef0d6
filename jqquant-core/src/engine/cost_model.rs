//! Cost model: slippage and commission calculation.
//!
//! Slippage is directional: buyers pay more (higher price), sellers receive less (lower price).
//! Commission is a symmetric fraction of traded value.

use crate::domain::OrderSide;
use serde::{Deserialize, Serialize};

/// Execution friction applied at fill time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Commission as a fraction of gross traded value, e.g. 0.0003.
    pub commission_rate: f64,
    /// Fractional price adjustment, e.g. 0.001 = 10 bps.
    pub slippage: f64,
}

impl CostModel {
    pub fn new(commission_rate: f64, slippage: f64) -> Self {
        Self {
            commission_rate,
            slippage,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Apply slippage to a raw price.
    ///
    /// `buy = price * (1 + slippage)`, `sell = price * (1 - slippage)`.
    pub fn fill_price(&self, raw_price: f64, side: OrderSide) -> f64 {
        match side {
            OrderSide::Buy => raw_price * (1.0 + self.slippage),
            OrderSide::Sell => raw_price * (1.0 - self.slippage),
        }
    }

    /// `commission = |fill_amount * fill_price| * commission_rate`
    pub fn commission(&self, fill_amount: f64, fill_price: f64) -> f64 {
        (fill_amount * fill_price).abs() * self.commission_rate
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new(0.0003, 0.001)
    }
}
