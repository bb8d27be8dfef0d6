//! Order: a single trading intent and its settlement outcome.

use super::ids::OrderId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction, derived from the sign of the requested amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("buy"),
            OrderSide::Sell => f.write_str("sell"),
        }
    }
}

/// Order lifecycle states. Transitions only leave `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Waiting for a price on its security.
    Pending,
    /// Executed in full.
    Filled,
    /// Refused at settlement (insufficient cash or shares).
    Rejected { reason: String },
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Filled => "filled",
            OrderStatus::Rejected { .. } => "rejected",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Rejected { reason } => write!(f, "rejected ({reason})"),
            other => f.write_str(other.label()),
        }
    }
}

/// One order in the backlog.
///
/// `amount` is signed: positive buys, negative sells. `fill_price`,
/// `fill_amount` and `filled_at` stay `None` until the order is filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub security: String,
    pub amount: f64,
    pub status: OrderStatus,
    pub fill_price: Option<f64>,
    pub fill_amount: Option<f64>,
    pub filled_at: Option<NaiveDateTime>,
    pub submitted_at: NaiveDateTime,
}

impl Order {
    pub fn new(
        id: OrderId,
        security: impl Into<String>,
        amount: f64,
        submitted_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            security: security.into(),
            amount,
            status: OrderStatus::Pending,
            fill_price: None,
            fill_amount: None,
            filled_at: None,
            submitted_at,
        }
    }

    pub fn side(&self) -> OrderSide {
        if self.amount >= 0.0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }

    /// Unsigned requested amount.
    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.status, OrderStatus::Rejected { .. })
    }

    /// Gross traded value `|fill_amount × fill_price|`, zero until filled.
    pub fn fill_value(&self) -> f64 {
        match (self.fill_amount, self.fill_price) {
            (Some(amount), Some(price)) => (amount * price).abs(),
            _ => 0.0,
        }
    }
}
