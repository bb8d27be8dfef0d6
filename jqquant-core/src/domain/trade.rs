//! TradeRecord: one executed fill in the trade ledger.

use super::ids::OrderId;
use super::order::{Order, OrderSide};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Ledger entry for a filled order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub order_id: OrderId,
    pub date: NaiveDateTime,
    pub security: String,
    pub side: OrderSide,
    /// Unsigned filled amount.
    pub amount: f64,
    pub price: f64,
    /// Gross traded value, `amount * price`.
    pub value: f64,
    pub commission: f64,
    /// Signed cash flow: `-(value + commission)` for buys, `value - commission` for sells.
    pub net_value: f64,
}

impl TradeRecord {
    /// Build the ledger entry for a filled order. `None` unless the order is
    /// filled and carries its fill fields.
    pub fn from_filled_order(order: &Order, commission: f64) -> Option<Self> {
        if !order.is_filled() {
            return None;
        }
        let date = order.filled_at?;
        let price = order.fill_price?;
        let amount = order.fill_amount?.abs();
        let value = amount * price;
        let side = order.side();
        let net_value = match side {
            OrderSide::Buy => -(value + commission),
            OrderSide::Sell => value - commission,
        };
        Some(Self {
            order_id: order.id,
            date,
            security: order.security.clone(),
            side,
            amount,
            price,
            value,
            commission,
            net_value,
        })
    }
}
