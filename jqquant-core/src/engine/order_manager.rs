//! Order manager: the append-only order backlog and the fill model.
//!
//! The manager never looks prices up itself: the caller passes the price
//! the order should settle against. Status only ever leaves `Pending`
//! (to `Filled` or `Rejected`); every transition is checked.

use super::cost_model::CostModel;
use crate::domain::{IdGen, Order, OrderId, OrderStatus};
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

/// Errors from order manager operations.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("order {id} is not pending (status: {status})")]
    NotPending { id: OrderId, status: String },

    #[error("invalid order amount {amount} for {security}")]
    InvalidAmount { security: String, amount: f64 },

    #[error("invalid price {price} for order {id}")]
    InvalidPrice { id: OrderId, price: f64 },
}

/// What a fill would look like at a given price, before committing to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillQuote {
    pub price: f64,
    /// Signed amount (full requested amount; no partial fills).
    pub amount: f64,
    pub commission: f64,
}

impl FillQuote {
    pub fn gross_value(&self) -> f64 {
        (self.amount * self.price).abs()
    }

    /// Cash a buy consumes: gross value plus commission.
    pub fn buy_cost(&self) -> f64 {
        self.gross_value() + self.commission
    }

    /// Cash a sell releases: gross value minus commission.
    pub fn sell_proceeds(&self) -> f64 {
        self.gross_value() - self.commission
    }
}

/// Owns every order ever submitted, in submission order.
#[derive(Debug, Clone)]
pub struct OrderManager {
    cost_model: CostModel,
    orders: Vec<Order>,
    id_gen: IdGen,
}

impl OrderManager {
    pub fn new(cost_model: CostModel) -> Self {
        Self {
            cost_model,
            orders: Vec::new(),
            id_gen: IdGen::default(),
        }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Append a new pending order to the backlog.
    ///
    /// `amount` is signed (positive buys, negative sells) and must be a
    /// finite non-zero number.
    pub fn submit(
        &mut self,
        security: &str,
        amount: f64,
        submitted_at: NaiveDateTime,
    ) -> Result<OrderId, OrderError> {
        if !amount.is_finite() || amount == 0.0 {
            return Err(OrderError::InvalidAmount {
                security: security.to_string(),
                amount,
            });
        }
        let id = self.id_gen.next_order_id();
        debug!(order_id = %id, security, amount, "order submitted");
        self.orders
            .push(Order::new(id, security, amount, submitted_at));
        Ok(id)
    }

    /// Look up an order by ID.
    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        self.index_of(id).map(|i| &self.orders[i])
    }

    /// The full backlog in submission order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn pending_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_pending())
    }

    /// IDs of pending orders, in submission order.
    pub fn pending_ids(&self) -> Vec<OrderId> {
        self.pending_orders().map(|o| o.id).collect()
    }

    /// Price the fill of a pending order at `current_price` without
    /// changing anything.
    pub fn quote(&self, id: OrderId, current_price: f64) -> Result<FillQuote, OrderError> {
        let order = self.pending(id)?;
        if !(current_price.is_finite() && current_price > 0.0) {
            return Err(OrderError::InvalidPrice {
                id,
                price: current_price,
            });
        }
        let price = self.cost_model.fill_price(current_price, order.side());
        Ok(FillQuote {
            price,
            amount: order.amount,
            commission: self.cost_model.commission(order.amount, price),
        })
    }

    /// Fill a pending order at `current_price` adjusted for slippage.
    ///
    /// Returns `Ok(true)` when the order was filled, `Ok(false)` when the
    /// price is unusable (NaN or non-positive) and the order stays pending.
    /// Fails for unknown or already-resolved orders, so an order can never
    /// settle twice.
    pub fn process_order(
        &mut self,
        id: OrderId,
        current_price: f64,
        at: NaiveDateTime,
    ) -> Result<bool, OrderError> {
        let quote = match self.quote(id, current_price) {
            Ok(q) => q,
            Err(OrderError::InvalidPrice { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        let order = self.pending_mut(id)?;
        order.status = OrderStatus::Filled;
        order.fill_price = Some(quote.price);
        order.fill_amount = Some(quote.amount);
        order.filled_at = Some(at);
        Ok(true)
    }

    /// Resolve a pending order as rejected.
    pub fn reject(&mut self, id: OrderId, reason: impl Into<String>) -> Result<(), OrderError> {
        let order = self.pending_mut(id)?;
        order.status = OrderStatus::Rejected {
            reason: reason.into(),
        };
        Ok(())
    }

    /// `|fill_amount * fill_price| * commission_rate`; zero for unfilled orders.
    pub fn get_commission(&self, order: &Order) -> f64 {
        match (order.fill_amount, order.fill_price) {
            (Some(amount), Some(price)) => self.cost_model.commission(amount, price),
            _ => 0.0,
        }
    }

    /// Filled orders in submission order.
    pub fn get_filled_orders(&self) -> Vec<&Order> {
        self.orders.iter().filter(|o| o.is_filled()).collect()
    }

    pub fn rejected_count(&self) -> usize {
        self.orders.iter().filter(|o| o.is_rejected()).count()
    }

    fn index_of(&self, id: OrderId) -> Option<usize> {
        // IDs start at 1 and the backlog is append-only.
        let i = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.orders.get(i).filter(|o| o.id == id).map(|_| i)
    }

    fn pending(&self, id: OrderId) -> Result<&Order, OrderError> {
        let order = self.get_order(id).ok_or(OrderError::NotFound(id))?;
        if !order.is_pending() {
            return Err(OrderError::NotPending {
                id,
                status: order.status.to_string(),
            });
        }
        Ok(order)
    }

    fn pending_mut(&mut self, id: OrderId) -> Result<&mut Order, OrderError> {
        let i = self.index_of(id).ok_or(OrderError::NotFound(id))?;
        let order = &mut self.orders[i];
        if !order.is_pending() {
            return Err(OrderError::NotPending {
                id,
                status: order.status.to_string(),
            });
        }
        Ok(order)
    }
}

impl Default for OrderManager {
    fn default() -> Self {
        Self::new(CostModel::default())
    }
}
