//! Domain types for the jqquant backtester

pub mod bar;
pub mod frequency;
pub mod ids;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod trade;

pub use bar::{midnight, Bar};
pub use frequency::{Frequency, FrequencyParseError};
pub use ids::{IdGen, OrderId};
pub use order::{Order, OrderSide, OrderStatus};
pub use portfolio::{Portfolio, PortfolioError, PortfolioSnapshot, PortfolioSummary};
pub use position::Position;
pub use trade::TradeRecord;

/// Security code alias, e.g. `"000001.XSHE"`.
pub type Security = String;
