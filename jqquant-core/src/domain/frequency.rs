//! Bar frequency as understood by the data vendor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sampling frequency of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Frequency {
    #[default]
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "60m")]
    Minute60,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown frequency '{0}' (valid: daily, 1m, 5m, 15m, 30m, 60m)")]
pub struct FrequencyParseError(pub String);

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Minute1 => "1m",
            Frequency::Minute5 => "5m",
            Frequency::Minute15 => "15m",
            Frequency::Minute30 => "30m",
            Frequency::Minute60 => "60m",
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Frequency::Daily)
    }

    /// Bar length in minutes; `None` for daily bars.
    pub fn minutes(&self) -> Option<i64> {
        match self {
            Frequency::Daily => None,
            Frequency::Minute1 => Some(1),
            Frequency::Minute5 => Some(5),
            Frequency::Minute15 => Some(15),
            Frequency::Minute30 => Some(30),
            Frequency::Minute60 => Some(60),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = FrequencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "1d" => Ok(Frequency::Daily),
            "1m" | "minute" => Ok(Frequency::Minute1),
            "5m" => Ok(Frequency::Minute5),
            "15m" => Ok(Frequency::Minute15),
            "30m" => Ok(Frequency::Minute30),
            "60m" => Ok(Frequency::Minute60),
            other => Err(FrequencyParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vendor_strings() {
        assert_eq!("daily".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!("1d".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!("15m".parse::<Frequency>().unwrap(), Frequency::Minute15);
        assert!("weekly".parse::<Frequency>().is_err());
    }

    #[test]
    fn display_matches_vendor_strings() {
        assert_eq!(Frequency::Minute60.to_string(), "60m");
        assert_eq!(Frequency::Daily.to_string(), "daily");
    }

    #[test]
    fn intraday_flags() {
        assert!(!Frequency::Daily.is_intraday());
        assert_eq!(Frequency::Daily.minutes(), None);
        assert_eq!(Frequency::Minute5.minutes(), Some(5));
    }

    #[test]
    fn serde_uses_vendor_strings() {
        let json = serde_json::to_string(&Frequency::Minute30).unwrap();
        assert_eq!(json, "\"30m\"");
        let back: Frequency = serde_json::from_str("\"daily\"").unwrap();
        assert_eq!(back, Frequency::Daily);
    }
}
