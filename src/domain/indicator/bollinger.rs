//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) of the close over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1), the same
//! rolling deviation `stddev` produces.
//!
//! Default parameters: period=20, multiplier=3.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::stddev::mean_and_sample_stddev;
use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, multiplier_x100,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 3.0;

pub fn calculate_bollinger(bars: &[OhlcvBar], period: usize, multiplier: f64) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = period >= 2 && i + 1 >= period;

        let (upper, middle, lower) = if valid {
            let (middle, stddev) = mean_and_sample_stddev(&closes[i + 1 - period..=i]);
            (
                middle + multiplier * stddev,
                middle,
                middle - multiplier * stddev,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100: multiplier_x100(multiplier),
        },
        values,
    }
}
