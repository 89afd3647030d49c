//! Screening condition evaluator.
//!
//! A short-circuiting conjunction of independent predicates, evaluated
//! cheapest first:
//!
//! 1. minimum history length for the active recipe
//! 2. volume regime: trailing mean below the threshold, trailing max at or above it
//! 3. golden cross of the short/long SMA within the trailing transition window
//! 4. recipe predicate (cloud position or RSI)
//!
//! Every predicate fails closed on undefined indicator values.

use crate::domain::indicator::ichimoku::{self, calculate_ichimoku, CloudBounds, IchimokuCloud};
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::{closes, OhlcvBar};
use std::fmt;
use std::str::FromStr;

/// History required by the recipes that do not read the displaced cloud.
pub const BASE_HISTORY: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipe {
    /// Close below a bearish cloud.
    StrictBelowCloud,
    /// RSI at or below the oversold threshold.
    RsiOversold,
    /// Close inside the cloud or just under it, conversion line above base line.
    CloudPenetration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown recipe '{0}' (expected one of: strict_below_cloud, rsi_oversold, cloud_penetration)")]
pub struct UnknownRecipe(pub String);

impl Recipe {
    pub const ALL: [Recipe; 3] = [
        Recipe::StrictBelowCloud,
        Recipe::RsiOversold,
        Recipe::CloudPenetration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Recipe::StrictBelowCloud => "strict_below_cloud",
            Recipe::RsiOversold => "rsi_oversold",
            Recipe::CloudPenetration => "cloud_penetration",
        }
    }

    /// Bars the recipe needs before any predicate runs.
    pub fn min_history(&self) -> usize {
        match self {
            Recipe::StrictBelowCloud => ichimoku::CLOUD_HISTORY,
            Recipe::RsiOversold | Recipe::CloudPenetration => BASE_HISTORY,
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Recipe::StrictBelowCloud => "close below a bearish (negative) Ichimoku cloud",
            Recipe::RsiOversold => "RSI at or below the oversold threshold",
            Recipe::CloudPenetration => {
                "close inside the cloud or within tolerance below it, conversion line above base line"
            }
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Recipe {
    type Err = UnknownRecipe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Recipe::ALL
            .into_iter()
            .find(|r| r.name() == normalized)
            .ok_or_else(|| UnknownRecipe(s.to_string()))
    }
}

/// Tunable thresholds shared by every recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenCriteria {
    pub volume_lookback: usize,
    pub volume_threshold: f64,
    pub ma_short: usize,
    pub ma_long: usize,
    /// Bars scanned for a golden cross; `n` bars hold `n - 1` transitions.
    pub cross_window: usize,
    pub rsi_period: usize,
    pub rsi_threshold: f64,
    /// Fraction of the cloud bottom still counted as "near" the cloud.
    pub cloud_tolerance: f64,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            volume_lookback: 90,
            volume_threshold: 1_000_000.0,
            ma_short: 5,
            ma_long: 20,
            cross_window: 7,
            rsi_period: 14,
            rsi_threshold: 40.0,
            cloud_tolerance: 0.95,
        }
    }
}

impl ScreenCriteria {
    /// Bars required for `recipe` under these criteria.
    pub fn required_history(&self, recipe: Recipe) -> usize {
        let cross = self.ma_long + self.cross_window.saturating_sub(1);
        let mut required = recipe.min_history().max(cross);
        if recipe == Recipe::RsiOversold {
            required = required.max(self.rsi_period + 1);
        }
        required
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("insufficient history: have {bars} bars, need {minimum}")]
    InsufficientHistory { bars: usize, minimum: usize },

    #[error("volume regime not met (mean {mean:.0}, max {max:.0})")]
    VolumeRegime { mean: f64, max: f64 },

    #[error("no golden cross in the last {window} bars")]
    NoRecentCross { window: usize },

    #[error("{0} undefined at the last bar")]
    UndefinedIndicator(IndicatorType),

    #[error("cloud is not bearish")]
    CloudNotBearish,

    #[error("close {close} not below cloud bottom {bottom}")]
    NotBelowCloud { close: f64, bottom: f64 },

    #[error("close {close} outside the cloud band [{lower}, {upper}]")]
    OutsideCloudBand { close: f64, lower: f64, upper: f64 },

    #[error("conversion line not above base line")]
    ConversionNotAboveBase,

    #[error("RSI {rsi:.1} above threshold")]
    RsiNotOversold { rsi: f64 },
}

/// Runs the full chain and reports the first failing predicate.
pub fn assess(
    bars: &[OhlcvBar],
    recipe: Recipe,
    criteria: &ScreenCriteria,
) -> Result<(), Rejection> {
    check_history(bars, criteria.required_history(recipe))?;
    check_volume_regime(bars, criteria)?;

    let close_series = closes(bars);
    check_golden_cross(&close_series, criteria)?;

    match recipe {
        Recipe::StrictBelowCloud => check_strict_below_cloud(bars),
        Recipe::RsiOversold => check_rsi_oversold(&close_series, criteria),
        Recipe::CloudPenetration => check_cloud_penetration(bars, criteria),
    }
}

pub fn evaluate(bars: &[OhlcvBar], recipe: Recipe, criteria: &ScreenCriteria) -> bool {
    assess(bars, recipe, criteria).is_ok()
}

pub fn check_history(bars: &[OhlcvBar], minimum: usize) -> Result<(), Rejection> {
    if bars.len() < minimum {
        return Err(Rejection::InsufficientHistory {
            bars: bars.len(),
            minimum,
        });
    }
    Ok(())
}

/// Mean and max volume over the trailing `lookback` bars (all bars if fewer).
pub fn trailing_volume_stats(bars: &[OhlcvBar], lookback: usize) -> Option<(f64, f64)> {
    let start = bars.len().saturating_sub(lookback);
    let window = &bars[start..];
    if window.is_empty() {
        return None;
    }
    let sum: f64 = window.iter().map(|b| b.volume as f64).sum();
    let max = window.iter().map(|b| b.volume).max()? as f64;
    Some((sum / window.len() as f64, max))
}

pub fn check_volume_regime(
    bars: &[OhlcvBar],
    criteria: &ScreenCriteria,
) -> Result<(), Rejection> {
    let (mean, max) = trailing_volume_stats(bars, criteria.volume_lookback)
        .ok_or(Rejection::VolumeRegime { mean: 0.0, max: 0.0 })?;
    if mean < criteria.volume_threshold && max >= criteria.volume_threshold {
        Ok(())
    } else {
        Err(Rejection::VolumeRegime { mean, max })
    }
}

/// Most recent transition index `i` in the trailing `window` bars where
/// `short[i] <= long[i]` and `short[i + 1] > long[i + 1]`.
pub fn find_golden_cross(
    short: &IndicatorSeries,
    long: &IndicatorSeries,
    window: usize,
) -> Option<usize> {
    let len = short.len().min(long.len());
    if len < 2 {
        return None;
    }
    let start = len.saturating_sub(window);
    (start..len - 1).rev().find(|&i| {
        match (short.get(i), long.get(i), short.get(i + 1), long.get(i + 1)) {
            (Some(s0), Some(l0), Some(s1), Some(l1)) => s0 <= l0 && s1 > l1,
            _ => false,
        }
    })
}

pub fn check_golden_cross(
    close_series: &[f64],
    criteria: &ScreenCriteria,
) -> Result<(), Rejection> {
    let short = calculate_sma(close_series, criteria.ma_short);
    let long = calculate_sma(close_series, criteria.ma_long);
    match find_golden_cross(&short, &long, criteria.cross_window) {
        Some(_) => Ok(()),
        None => Err(Rejection::NoRecentCross {
            window: criteria.cross_window,
        }),
    }
}

fn defined_at(series: &IndicatorSeries, index: usize) -> Result<f64, Rejection> {
    series
        .get(index)
        .ok_or_else(|| Rejection::UndefinedIndicator(series.indicator_type.clone()))
}

fn cloud_at(cloud: &IchimokuCloud, index: usize) -> Result<CloudBounds, Rejection> {
    Ok(CloudBounds {
        span1: defined_at(&cloud.leading_span1, index)?,
        span2: defined_at(&cloud.leading_span2, index)?,
    })
}

pub fn check_strict_below_cloud(bars: &[OhlcvBar]) -> Result<(), Rejection> {
    let Some(last_bar) = bars.last() else {
        return Err(Rejection::InsufficientHistory { bars: 0, minimum: 1 });
    };
    let last = bars.len() - 1;
    let bounds = cloud_at(&calculate_ichimoku(bars), last)?;

    if !bounds.is_bearish() {
        return Err(Rejection::CloudNotBearish);
    }
    if last_bar.close < bounds.span1 && last_bar.close < bounds.span2 {
        Ok(())
    } else {
        Err(Rejection::NotBelowCloud {
            close: last_bar.close,
            bottom: bounds.bottom(),
        })
    }
}

pub fn check_rsi_oversold(
    close_series: &[f64],
    criteria: &ScreenCriteria,
) -> Result<(), Rejection> {
    let rsi = calculate_rsi(close_series, criteria.rsi_period);
    let Some(last) = close_series.len().checked_sub(1) else {
        return Err(Rejection::UndefinedIndicator(rsi.indicator_type));
    };
    let value = defined_at(&rsi, last)?;
    if value <= criteria.rsi_threshold {
        Ok(())
    } else {
        Err(Rejection::RsiNotOversold { rsi: value })
    }
}

pub fn check_cloud_penetration(
    bars: &[OhlcvBar],
    criteria: &ScreenCriteria,
) -> Result<(), Rejection> {
    let Some(last_bar) = bars.last() else {
        return Err(Rejection::InsufficientHistory { bars: 0, minimum: 1 });
    };
    let last = bars.len() - 1;
    let cloud = calculate_ichimoku(bars);
    let bounds = cloud_at(&cloud, last)?;

    let lower = bounds.bottom() * criteria.cloud_tolerance;
    let upper = bounds.top();
    if last_bar.close < lower || last_bar.close > upper {
        return Err(Rejection::OutsideCloudBand {
            close: last_bar.close,
            lower,
            upper,
        });
    }

    let conversion = defined_at(&cloud.conversion_line, last)?;
    let base = defined_at(&cloud.base_line, last)?;
    if conversion > base {
        Ok(())
    } else {
        Err(Rejection::ConversionNotAboveBase)
    }
}
