//! Settlement: applies filled orders to the portfolio.
//!
//! Handles cash accounting, position creation/averaging and realized PnL
//! on sells. `check_fill` runs before the order manager commits a fill so
//! an order the ledger cannot cover is rejected instead of half-applied.

use super::order_manager::FillQuote;
use crate::domain::{Order, OrderSide, Portfolio, PortfolioError};

/// Verify the portfolio can absorb `quote` for `order`.
///
/// Buys need `|amount| * fill_price + commission` in cash; sells need the
/// shares on hand.
pub fn check_fill(
    order: &Order,
    quote: &FillQuote,
    portfolio: &Portfolio,
) -> Result<(), PortfolioError> {
    match order.side() {
        OrderSide::Buy => {
            let required = quote.buy_cost();
            let available = portfolio.cash();
            if required > available {
                return Err(PortfolioError::InsufficientCash {
                    required,
                    available,
                });
            }
        }
        OrderSide::Sell => {
            let required = quote.amount.abs();
            let held = portfolio.held_amount(&order.security);
            if required > held {
                return Err(PortfolioError::InsufficientPosition {
                    security: order.security.clone(),
                    required,
                    held,
                });
            }
        }
    }
    Ok(())
}

/// Apply a filled order to the portfolio.
///
/// - Buy: cash -= gross + commission, position averaged in at fill price
/// - Sell: position reduced, cash += gross - commission
///
/// On error the portfolio is left as it was.
pub fn apply_fill(
    order: &Order,
    commission: f64,
    portfolio: &mut Portfolio,
) -> Result<(), PortfolioError> {
    let (Some(price), Some(amount)) = (order.fill_price, order.fill_amount) else {
        return Err(PortfolioError::InvalidFill {
            security: order.security.clone(),
            amount: order.amount,
            price: f64::NAN,
        });
    };
    let qty = amount.abs();
    let gross = qty * price;

    match order.side() {
        OrderSide::Buy => {
            portfolio.withdraw(gross + commission)?;
            if let Err(e) = portfolio.add_position(&order.security, qty, price) {
                portfolio.deposit(gross + commission)?;
                return Err(e);
            }
        }
        OrderSide::Sell => {
            portfolio.remove_position(&order.security, qty, price)?;
            portfolio.deposit(gross - commission)?;
        }
    }
    Ok(())
}
