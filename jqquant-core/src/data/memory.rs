use super::provider::{check_range, DataError, DataProvider, PriceFrame};
use crate::domain::{Bar, Frequency};
use chrono::NaiveDate;

/// Serves a fixed set of rows. Frequency is not checked: the rows are
/// whatever the caller loaded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    rows: Vec<Bar>,
}

impl InMemoryProvider {
    pub fn new(rows: Vec<Bar>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, bar: Bar) {
        self.rows.push(bar);
    }
}

impl DataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_price_data(
        &self,
        securities: &[String],
        start: NaiveDate,
        end: NaiveDate,
        _frequency: Frequency,
    ) -> Result<PriceFrame, DataError> {
        check_range(start, end)?;
        let rows = self
            .rows
            .iter()
            .filter(|b| securities.iter().any(|s| s == &b.security))
            .filter(|b| (start..=end).contains(&b.date()))
            .cloned()
            .collect();
        Ok(PriceFrame::new(rows))
    }
}
