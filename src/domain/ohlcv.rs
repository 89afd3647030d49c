//! Daily OHLCV bar representation.

use crate::domain::error::ScreenerError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Checks that a series is strictly ascending by date (which also rules out
/// duplicate dates), that every price is finite and non-negative, and that
/// volumes are non-negative.
pub fn validate_series(code: &str, bars: &[OhlcvBar]) -> Result<(), ScreenerError> {
    for (i, bar) in bars.iter().enumerate() {
        if !(bar.open.is_finite()
            && bar.high.is_finite()
            && bar.low.is_finite()
            && bar.close.is_finite())
        {
            return Err(ScreenerError::MalformedSeries {
                code: code.to_string(),
                reason: format!("non-finite price on {}", bar.date),
            });
        }
        if bar.open < 0.0 || bar.high < 0.0 || bar.low < 0.0 || bar.close < 0.0 {
            return Err(ScreenerError::MalformedSeries {
                code: code.to_string(),
                reason: format!("negative price on {}", bar.date),
            });
        }
        if bar.volume < 0 {
            return Err(ScreenerError::MalformedSeries {
                code: code.to_string(),
                reason: format!("negative volume {} on {}", bar.volume, bar.date),
            });
        }
        if i > 0 && bars[i - 1].date >= bar.date {
            return Err(ScreenerError::MalformedSeries {
                code: code.to_string(),
                reason: format!(
                    "dates out of order or duplicated at {} (previous {})",
                    bar.date,
                    bars[i - 1].date
                ),
            });
        }
    }
    Ok(())
}

pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
