//! Technical indicator implementations.
//!
//! This module provides types for representing indicator series:
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: values aligned index-for-index with the OHLCV series
//!
//! Positions before a window is fully populated hold `None`. Callers must
//! treat `None` as "not available", never as zero.

pub mod ichimoku;
pub mod rsi;
pub mod sma;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Midpoint(usize),
    LeadingSpan1 {
        conversion: usize,
        base: usize,
        displacement: usize,
    },
    LeadingSpan2 {
        period: usize,
        displacement: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(indicator_type: IndicatorType, values: Vec<Option<f64>>) -> Self {
        Self {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`; `None` for warm-up positions and out-of-range indices.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    /// Index of the first defined value, if any.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Midpoint(period) => write!(f, "MIDPOINT({})", period),
            IndicatorType::LeadingSpan1 {
                conversion,
                base,
                displacement,
            } => write!(f, "SPAN1({},{})+{}", conversion, base, displacement),
            IndicatorType::LeadingSpan2 {
                period,
                displacement,
            } => write!(f, "SPAN2({})+{}", period, displacement),
        }
    }
}
