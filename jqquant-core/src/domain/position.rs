use serde::{Deserialize, Serialize};

/// Holding in a single security.
///
/// The record outlives the holding: once `amount` reaches zero the position
/// stays in the portfolio as closed, keeping its cost basis and realized PnL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub security: String,
    pub amount: f64,
    /// Amount-weighted average entry price of the units currently held.
    pub cost_basis: f64,
    /// Last marked price.
    pub last_price: f64,
    pub realized_pnl: f64,
}

impl Position {
    pub fn new(security: impl Into<String>, amount: f64, price: f64) -> Self {
        Self {
            security: security.into(),
            amount,
            cost_basis: price,
            last_price: price,
            realized_pnl: 0.0,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.amount <= 0.0
    }

    pub fn market_value(&self) -> f64 {
        self.amount * self.last_price
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.amount * (self.last_price - self.cost_basis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_position_marks_at_entry() {
        let pos = Position::new("A", 100.0, 10.0);
        assert_eq!(pos.cost_basis, 10.0);
        assert_eq!(pos.last_price, 10.0);
        assert_eq!(pos.market_value(), 1_000.0);
        assert_eq!(pos.unrealized_pnl(), 0.0);
    }

    #[test]
    fn unrealized_pnl_follows_mark() {
        let mut pos = Position::new("A", 100.0, 10.0);
        pos.last_price = 12.0;
        assert!((pos.unrealized_pnl() - 200.0).abs() < 1e-10);
    }

    #[test]
    fn zero_amount_is_closed() {
        let mut pos = Position::new("A", 100.0, 10.0);
        assert!(!pos.is_closed());
        pos.amount = 0.0;
        assert!(pos.is_closed());
        assert_eq!(pos.market_value(), 0.0);
    }
}
