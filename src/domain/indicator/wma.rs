//! Weighted Moving Average indicator.
//!
//! O(n) sliding window: the weighted sum is updated by adding n*P[i] and
//! removing the previous window's plain sum.
//! WMA(n) = (1*P[i-n+1] + 2*P[i-n+2] + ... + n*P[i]) / (n*(n+1)/2)
//! For n = 3 this is (3*C[t] + 2*C[t-1] + C[t-2]) / 6.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 3;

pub fn calculate_wma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Wma(period),
            values: Vec::new(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let divisor = (period * (period + 1)) as f64 / 2.0;
    let mut weighted_sum: f64 = 0.0;
    let mut window_sum: f64 = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i < period {
            let weight = (i + 1) as f64;
            weighted_sum += weight * bar.close;
            window_sum += bar.close;
        } else {
            weighted_sum += period as f64 * bar.close - window_sum;
            window_sum += bar.close - bars[i - period].close;
        }

        let valid = i >= period - 1;
        let wma = if valid { weighted_sum / divisor } else { 0.0 };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(wma),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Wma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn wma_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_wma(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn wma_period_1_is_the_close() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_wma(&bars, 1);

        assert_relative_eq!(series.simple_at(0).unwrap(), 10.0);
        assert_relative_eq!(series.simple_at(2).unwrap(), 30.0);
    }

    #[test]
    fn wma_three_day_formula() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_wma(&bars, DEFAULT_PERIOD);

        assert_relative_eq!(
            series.simple_at(2).unwrap(),
            (3.0 * 30.0 + 2.0 * 20.0 + 10.0) / 6.0
        );
        assert_relative_eq!(
            series.simple_at(3).unwrap(),
            (3.0 * 40.0 + 2.0 * 30.0 + 20.0) / 6.0
        );
        assert_relative_eq!(
            series.simple_at(4).unwrap(),
            (3.0 * 50.0 + 2.0 * 40.0 + 30.0) / 6.0
        );
    }

    #[test]
    fn wma_equal_prices() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let series = calculate_wma(&bars, 3);
        assert_relative_eq!(series.simple_at(3).unwrap(), 100.0);
    }

    #[test]
    fn wma_indicator_type() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        assert_eq!(calculate_wma(&bars, 5).indicator_type, IndicatorType::Wma(5));
    }

    #[test]
    fn wma_empty_bars() {
        assert!(calculate_wma(&[], 3).values.is_empty());
    }

    #[test]
    fn wma_period_0() {
        let bars = make_bars(&[10.0, 20.0]);
        assert!(calculate_wma(&bars, 0).values.is_empty());
    }

    proptest! {
        #[test]
        fn wma_stays_within_window_range(
            prices in prop::collection::vec(1.0f64..500.0, 3..80),
            period in 1usize..8,
        ) {
            let bars = make_bars(&prices);
            let series = calculate_wma(&bars, period);
            for i in 0..prices.len() {
                if let Some(v) = series.simple_at(i) {
                    let window = &prices[i + 1 - period..=i];
                    let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
                    let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    prop_assert!(v >= lo - 1e-6 && v <= hi + 1e-6);
                }
            }
        }
    }
}
