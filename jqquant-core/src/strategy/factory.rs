//! Strategy factory: converts a strategy name and numeric parameters
//! into a boxed [`Strategy`].

use super::{BuyAndHold, MaCross, Strategy, StrategyError};
use std::collections::BTreeMap;
use tracing::warn;

/// Numeric strategy parameters, keyed by name.
pub type StrategyParams = BTreeMap<String, f64>;

/// Names accepted by [`strategy_from_name`].
pub const STRATEGY_NAMES: &[&str] = &["buy_and_hold", "ma_cross"];

/// Largest accepted window length, in bars.
pub const MAX_WINDOW: usize = u32::MAX as usize;

/// Extract a named f64 parameter, falling back to `default`.
fn param(params: &StrategyParams, name: &str, default: f64) -> f64 {
    params.get(name).copied().unwrap_or(default)
}

/// Extract a named window length, falling back to `default`.
fn param_usize(params: &StrategyParams, name: &str, default: usize) -> Result<usize, StrategyError> {
    match params.get(name) {
        None => Ok(default),
        Some(&v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= MAX_WINDOW as f64 => {
            Ok(v as usize)
        }
        Some(&v) => Err(StrategyError::InvalidParam {
            name: name.to_string(),
            message: format!("expected an integer in [0, {MAX_WINDOW}], got {v}"),
        }),
    }
}

/// Log parameters the named strategy does not read.
fn warn_unknown(strategy: &str, params: &StrategyParams, known: &[&str]) {
    for key in params.keys().filter(|k| !known.contains(&k.as_str())) {
        warn!(strategy = %strategy, param = %key, "unrecognised strategy parameter ignored");
    }
}

/// Parameter names each bundled strategy reads.
pub fn known_params(name: &str) -> &'static [&'static str] {
    match name {
        "ma_cross" => &["short_window", "long_window", "cash_fraction"],
        _ => &[],
    }
}

/// Build a bundled strategy by name.
pub fn strategy_from_name(
    name: &str,
    params: &StrategyParams,
) -> Result<Box<dyn Strategy>, StrategyError> {
    if STRATEGY_NAMES.contains(&name) {
        warn_unknown(name, params, known_params(name));
    }
    match name {
        "buy_and_hold" => Ok(Box::new(BuyAndHold::new())),
        "ma_cross" => {
            let short_window = param_usize(params, "short_window", 5)?;
            let long_window = param_usize(params, "long_window", 20)?;
            let cash_fraction = param(params, "cash_fraction", 0.5);
            Ok(Box::new(MaCross::new(short_window, long_window, cash_fraction)?))
        }
        other => Err(StrategyError::Unknown(other.to_string())),
    }
}
