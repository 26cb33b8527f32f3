//! Average True Range indicator.
//!
//! TR[0] = high - low (no previous close); TR[i] = true range against close[i-1].
//! ATR(n)[i] = mean(TR[i-n+1..=i]), a plain rolling mean rather than Wilder smoothing.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;

pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let tr = true_ranges(bars);
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = period > 0 && i + 1 >= period;
        let atr = if valid {
            tr[i + 1 - period..=i].iter().sum::<f64>() / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(atr),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
