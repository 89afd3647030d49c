//! RSI (Relative Strength Index).
//!
//! Uses simple rolling means of the bar-to-bar differences:
//! - gain = mean of max(d, 0) over the last n differences
//! - loss = mean of max(-d, 0) over the last n differences
//!
//! Formula: RSI = 100 - (100 / (1 + gain / loss))
//! If loss == 0: RSI = 100 (a window with no down moves, flat windows included).
//!
//! Warmup: first n positions are undefined (n differences need n + 1 closes).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub const DEFAULT_RSI_PERIOD: usize = 14;

pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    let mut values = vec![None; closes.len()];

    if period == 0 {
        return IndicatorSeries::new(IndicatorType::Rsi(period), values);
    }

    for (i, slot) in values.iter_mut().enumerate().skip(period) {
        let mut gain = 0.0;
        let mut loss = 0.0;
        for j in (i + 1 - period)..=i {
            let change = closes[j] - closes[j - 1];
            if change > 0.0 {
                gain += change;
            } else {
                loss -= change;
            }
        }
        gain /= period as f64;
        loss /= period as f64;

        *slot = Some(rsi_from_averages(gain, loss));
    }

    IndicatorSeries::new(IndicatorType::Rsi(period), values)
}

fn rsi_from_averages(gain: f64, loss: f64) -> f64 {
    if loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + gain / loss))
    }
}
