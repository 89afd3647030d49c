//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(V[i-j] for j in 0..n) / n
//! Warmup: first (n-1) positions are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_sma(values: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::new(IndicatorType::Sma(period), vec![None; values.len()]);
    }

    let out = (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            Some(window.iter().sum::<f64>() / period as f64)
        })
        .collect();

    IndicatorSeries::new(IndicatorType::Sma(period), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn sma_warmup() {
        let series = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(series.len(), 5);
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), None);
        assert!(series.get(2).is_some());
    }

    #[test]
    fn sma_basic_calculation() {
        let series = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_relative_eq!(series.get(2).unwrap(), 2.0);
        assert_relative_eq!(series.get(3).unwrap(), 3.0);
        assert_relative_eq!(series.get(4).unwrap(), 4.0);
    }

    #[test]
    fn sma_period_longer_than_input() {
        let series = calculate_sma(&[1.0, 2.0], 5);
        assert!(series.values.iter().all(Option::is_none));
    }

    #[test]
    fn sma_zero_period() {
        let series = calculate_sma(&[1.0, 2.0], 0);
        assert_eq!(series.len(), 2);
        assert!(series.values.iter().all(Option::is_none));
    }

    #[test]
    fn sma_zero_values_are_defined() {
        let series = calculate_sma(&[0.0, 0.0, 0.0], 2);
        assert_eq!(series.get(1), Some(0.0));
    }

    #[test]
    fn sma_indicator_type() {
        assert_eq!(calculate_sma(&[], 20).indicator_type, IndicatorType::Sma(20));
    }

    proptest! {
        #[test]
        fn sma_of_constant_is_constant(value in 1.0..10_000.0_f64, len in 1usize..60, period in 1usize..30) {
            let series = calculate_sma(&vec![value; len], period);
            for (i, v) in series.values.iter().enumerate() {
                if i + 1 >= period {
                    prop_assert!((v.unwrap() - value).abs() < 1e-9 * value);
                } else {
                    prop_assert!(v.is_none());
                }
            }
        }
    }
}
