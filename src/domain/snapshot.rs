//! Latest indicator values for one instrument, used by `inspect`.

use crate::domain::condition::{trailing_volume_stats, ScreenCriteria};
use crate::domain::indicator::ichimoku::calculate_ichimoku;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::ohlcv::{closes, OhlcvBar};
use std::fmt;

/// Last-bar values; `None` where the indicator is still warming up.
/// Leading spans are the cloud in effect at the last bar.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorSnapshot {
    pub close: Option<f64>,
    pub conversion_line: Option<f64>,
    pub base_line: Option<f64>,
    pub leading_span1: Option<f64>,
    pub leading_span2: Option<f64>,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub volume_mean: Option<f64>,
    pub volume_max: Option<f64>,
}

pub fn compute_snapshot(bars: &[OhlcvBar], criteria: &ScreenCriteria) -> IndicatorSnapshot {
    if bars.is_empty() {
        return IndicatorSnapshot::default();
    }

    let close_series = closes(bars);
    let cloud = calculate_ichimoku(bars);
    let volume = trailing_volume_stats(bars, criteria.volume_lookback);

    IndicatorSnapshot {
        close: close_series.last().copied(),
        conversion_line: cloud.conversion_line.last(),
        base_line: cloud.base_line.last(),
        leading_span1: cloud.leading_span1.last(),
        leading_span2: cloud.leading_span2.last(),
        ma_short: calculate_sma(&close_series, criteria.ma_short).last(),
        ma_long: calculate_sma(&close_series, criteria.ma_long).last(),
        rsi: calculate_rsi(&close_series, criteria.rsi_period).last(),
        volume_mean: volume.map(|(mean, _)| mean),
        volume_max: volume.map(|(_, max)| max),
    }
}

fn write_field(f: &mut fmt::Formatter<'_>, label: &str, value: Option<f64>) -> fmt::Result {
    match value {
        Some(v) => writeln!(f, "  {:<16} {:.2}", label, v),
        None => writeln!(f, "  {:<16} n/a", label),
    }
}

impl fmt::Display for IndicatorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_field(f, "close", self.close)?;
        write_field(f, "conversion", self.conversion_line)?;
        write_field(f, "base", self.base_line)?;
        write_field(f, "leading span 1", self.leading_span1)?;
        write_field(f, "leading span 2", self.leading_span2)?;
        write_field(f, "ma short", self.ma_short)?;
        write_field(f, "ma long", self.ma_long)?;
        write_field(f, "rsi", self.rsi)?;
        write_field(f, "volume mean", self.volume_mean)?;
        write_field(f, "volume max", self.volume_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn bars(closes: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000 * (i as i64 + 1),
            })
            .collect()
    }

    #[test]
    fn empty_series_is_all_undefined() {
        let snap = compute_snapshot(&[], &ScreenCriteria::default());
        assert_eq!(snap, IndicatorSnapshot::default());
    }

    #[test]
    fn short_series_leaves_cloud_undefined() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let snap = compute_snapshot(&bars(&closes), &ScreenCriteria::default());

        assert_eq!(snap.close, Some(129.0));
        assert!(snap.conversion_line.is_some());
        assert!(snap.base_line.is_some());
        assert_eq!(snap.leading_span1, None);
        assert_eq!(snap.leading_span2, None);
        assert_relative_eq!(snap.ma_short.unwrap(), 127.0);
        assert_eq!(snap.rsi, Some(100.0));
    }

    #[test]
    fn full_history_defines_everything() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + (i % 7) as f64).collect();
        let snap = compute_snapshot(&bars(&closes), &ScreenCriteria::default());

        assert!(snap.leading_span1.is_some());
        assert!(snap.leading_span2.is_some());
        assert!(snap.ma_long.is_some());
        assert_eq!(snap.volume_max, Some(80_000.0));
    }

    #[test]
    fn display_marks_undefined_values() {
        let rendered = compute_snapshot(&bars(&[100.0]), &ScreenCriteria::default()).to_string();
        assert!(rendered.contains("close            100.00"));
        assert!(rendered.contains("rsi              n/a"));
    }
}
