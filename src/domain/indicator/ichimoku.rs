//! Ichimoku cloud.
//!
//! - conversion line = (max(high, 9) + min(low, 9)) / 2
//! - base line       = (max(high, 26) + min(low, 26)) / 2
//! - leading span 1  = (conversion + base) / 2, displaced forward 26 bars
//! - leading span 2  = (max(high, 52) + min(low, 52)) / 2, displaced forward 26 bars
//!
//! The displaced spans are stored forward-shifted: the value at index `i` is
//! the cloud in effect at `i`, computed from the raw spans at `i - 26`. The raw
//! spans are kept as well so the same cloud can be read by looking 26 bars
//! into the past; both readings agree at every index.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub const CONVERSION_PERIOD: usize = 9;
pub const BASE_PERIOD: usize = 26;
pub const SPAN2_PERIOD: usize = 52;
pub const DISPLACEMENT: usize = 26;

/// Bars needed before the displaced span 2 is defined at the last bar.
pub const CLOUD_HISTORY: usize = SPAN2_PERIOD + DISPLACEMENT;

#[derive(Debug, Clone)]
pub struct IchimokuCloud {
    pub conversion_line: IndicatorSeries,
    pub base_line: IndicatorSeries,
    pub raw_leading_span1: IndicatorSeries,
    pub raw_leading_span2: IndicatorSeries,
    pub leading_span1: IndicatorSeries,
    pub leading_span2: IndicatorSeries,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudBounds {
    pub span1: f64,
    pub span2: f64,
}

impl CloudBounds {
    pub fn top(&self) -> f64 {
        self.span1.max(self.span2)
    }

    pub fn bottom(&self) -> f64 {
        self.span1.min(self.span2)
    }

    /// Negative (bearish) cloud: span 1 below span 2.
    pub fn is_bearish(&self) -> bool {
        self.span1 < self.span2
    }
}

impl IchimokuCloud {
    /// Cloud in effect at `index`, read from the forward-shifted spans.
    pub fn in_effect_at(&self, index: usize) -> Option<CloudBounds> {
        Some(CloudBounds {
            span1: self.leading_span1.get(index)?,
            span2: self.leading_span2.get(index)?,
        })
    }

    /// Cloud in effect at `index`, read from the raw spans `DISPLACEMENT` bars back.
    pub fn in_effect_by_lookback(&self, index: usize) -> Option<CloudBounds> {
        Some(CloudBounds {
            span1: lookback_value(&self.raw_leading_span1, index, DISPLACEMENT)?,
            span2: lookback_value(&self.raw_leading_span2, index, DISPLACEMENT)?,
        })
    }
}

/// (highest high + lowest low) / 2 over the trailing `period` bars.
pub fn rolling_midpoint(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let values = (0..bars.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            let window = &bars[i + 1 - period..=i];
            let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            Some((high + low) / 2.0)
        })
        .collect();

    IndicatorSeries::new(IndicatorType::Midpoint(period), values)
}

/// Shifts a series forward by `n`: output[i] = input[i - n], undefined for i < n.
/// The output has the same length as the input.
pub fn shift_forward(values: &[Option<f64>], n: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(n).and_then(|j| values[j]))
        .collect()
}

/// Reads an undisplaced series `n` bars before `index`.
pub fn lookback_value(series: &IndicatorSeries, index: usize, n: usize) -> Option<f64> {
    index.checked_sub(n).and_then(|j| series.get(j))
}

pub fn calculate_ichimoku(bars: &[OhlcvBar]) -> IchimokuCloud {
    let conversion_line = rolling_midpoint(bars, CONVERSION_PERIOD);
    let base_line = rolling_midpoint(bars, BASE_PERIOD);

    let span1_type = IndicatorType::LeadingSpan1 {
        conversion: CONVERSION_PERIOD,
        base: BASE_PERIOD,
        displacement: DISPLACEMENT,
    };
    let raw_span1: Vec<Option<f64>> = conversion_line
        .values
        .iter()
        .zip(&base_line.values)
        .map(|(c, b)| match (c, b) {
            (Some(c), Some(b)) => Some((c + b) / 2.0),
            _ => None,
        })
        .collect();

    let span2_type = IndicatorType::LeadingSpan2 {
        period: SPAN2_PERIOD,
        displacement: DISPLACEMENT,
    };
    let raw_span2 = rolling_midpoint(bars, SPAN2_PERIOD).values;

    let leading_span1 =
        IndicatorSeries::new(span1_type.clone(), shift_forward(&raw_span1, DISPLACEMENT));
    let leading_span2 =
        IndicatorSeries::new(span2_type.clone(), shift_forward(&raw_span2, DISPLACEMENT));

    IchimokuCloud {
        conversion_line,
        base_line,
        raw_leading_span1: IndicatorSeries::new(span1_type, raw_span1),
        raw_leading_span2: IndicatorSeries::new(span2_type, raw_span2),
        leading_span1,
        leading_span2,
    }
}
