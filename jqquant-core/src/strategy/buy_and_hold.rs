//! Buy and hold: split the starting cash equally, buy once, never sell.

use super::{Strategy, StrategyContext, StrategyError};
use crate::data::DailyData;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct BuyAndHold {
    budget_per_security: f64,
    bought: BTreeSet<String>,
}

impl BuyAndHold {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn initialize(&mut self, ctx: &mut StrategyContext<'_>) -> Result<(), StrategyError> {
        let n = ctx.securities().len().max(1);
        self.budget_per_security = ctx.portfolio().cash() / n as f64;
        self.bought.clear();
        Ok(())
    }

    fn handle_data(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        data: &DailyData,
    ) -> Result<(), StrategyError> {
        let securities = ctx.securities().to_vec();
        for security in securities {
            if self.bought.contains(&security) {
                continue;
            }
            // A security with no price today is bought on its first priced date.
            let Some(price) = data.close(&security) else {
                continue;
            };
            let amount = ctx.affordable_lots(self.budget_per_security, price);
            if amount > 0.0 {
                ctx.order(&security, amount)?;
            } else {
                debug!(security = %security, price, "budget below one lot");
            }
            self.bought.insert(security);
        }
        Ok(())
    }
}
