//! CSV-backed provider: one file per security under a data directory.
//!
//! Daily files are `<dir>/<security>.csv`; intraday files carry the
//! frequency suffix, e.g. `<dir>/<security>_5m.csv`. Header:
//! `date,open,high,low,close,volume`. The date column accepts
//! `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.

use super::provider::{check_range, DataError, DataProvider, PriceFrame};
use crate::domain::{midnight, Bar, Frequency};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Reads price rows from CSV files on disk.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `security` at `frequency`.
    pub fn file_path(&self, security: &str, frequency: Frequency) -> PathBuf {
        match frequency {
            Frequency::Daily => self.dir.join(format!("{security}.csv")),
            other => self.dir.join(format!("{security}_{other}.csv")),
        }
    }

    fn read_file(
        &self,
        path: &Path,
        security: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| DataError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        let mut bars = Vec::new();
        for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
            // Header is line 1.
            let line = i as u64 + 2;
            let row = record.map_err(|source| DataError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let timestamp =
                parse_timestamp(&row.date).ok_or_else(|| DataError::MalformedRow {
                    path: path.to_path_buf(),
                    line,
                    message: format!("unparseable date '{}'", row.date),
                })?;
            let date = timestamp.date();
            if date < start || date > end {
                continue;
            }
            bars.push(Bar {
                security: security.to_string(),
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        Ok(bars)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn get_price_data(
        &self,
        securities: &[String],
        start: NaiveDate,
        end: NaiveDate,
        frequency: Frequency,
    ) -> Result<PriceFrame, DataError> {
        check_range(start, end)?;

        let mut rows = Vec::new();
        for security in securities {
            let path = self.file_path(security, frequency);
            if !path.exists() {
                debug!(security = %security, path = %path.display(), "no CSV file for security");
                continue;
            }
            let bars = self.read_file(&path, security, start, end)?;
            debug!(security = %security, rows = bars.len(), "loaded CSV rows");
            rows.extend(bars);
        }
        Ok(PriceFrame::new(rows))
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`.
pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(midnight))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn parses_date_and_datetime() {
        assert_eq!(parse_timestamp("2024-01-02"), Some(midnight(d(2024, 1, 2))));
        let ts = parse_timestamp("2024-01-02 09:35:00").unwrap();
        assert_eq!(ts.date(), d(2024, 1, 2));
        assert!(parse_timestamp("02/01/2024").is_none());
    }

    #[test]
    fn reads_and_filters_range() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "A.csv",
            "date,open,high,low,close,volume\n\
             2024-01-02,10,11,9,10.5,1000\n\
             2024-01-03,10.5,11,10,10.8,1200\n\
             2024-01-04,10.8,11.2,10.6,11,900\n",
        );
        let provider = CsvProvider::new(tmp.path());
        let frame = provider
            .get_price_data(&["A".into()], d(2024, 1, 3), d(2024, 1, 4), Frequency::Daily)
            .unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.rows()[0].close, 10.8);
        assert_eq!(frame.rows()[1].security, "A");
    }

    #[test]
    fn missing_file_contributes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = CsvProvider::new(tmp.path());
        let frame = provider
            .get_price_data(&["NOPE".into()], d(2024, 1, 1), d(2024, 12, 31), Frequency::Daily)
            .unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn malformed_date_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "A.csv",
            "date,open,high,low,close,volume\nyesterday,1,1,1,1,1\n",
        );
        let provider = CsvProvider::new(tmp.path());
        let err = provider
            .get_price_data(&["A".into()], d(2024, 1, 1), d(2024, 12, 31), Frequency::Daily)
            .unwrap_err();
        assert!(matches!(err, DataError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn intraday_file_name_has_frequency_suffix() {
        let provider = CsvProvider::new("data");
        assert_eq!(
            provider.file_path("A", Frequency::Minute5),
            PathBuf::from("data").join("A_5m.csv")
        );
        assert_eq!(
            provider.file_path("A", Frequency::Daily),
            PathBuf::from("data").join("A.csv")
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let provider = CsvProvider::new("data");
        let err = provider
            .get_price_data(&["A".into()], d(2024, 2, 1), d(2024, 1, 1), Frequency::Daily)
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidRange { .. }));
    }
}
