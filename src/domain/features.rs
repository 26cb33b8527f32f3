//! Model features and target for the enhanced strategy.
//!
//! Inputs per day: open, high, low, close, volume and the last `lags` values
//! of the WMA (lag 0 is today's). Target: next day's WMA minus today's.
//! A row is kept only when all inputs, the target, the Bollinger bands and
//! the ATR are defined, so the last bar never yields a row.

use chrono::NaiveDate;

use super::indicator::atr::calculate_atr;
use super::indicator::bollinger::calculate_bollinger;
use super::indicator::wma::calculate_wma;
use super::ohlcv::OhlcvBar;
use super::run_config::{BollingerParams, EnhancedParams};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub inputs: Vec<f64>,
    pub target: f64,
    pub close: f64,
    pub wma: f64,
    pub upper: f64,
    pub lower: f64,
    pub atr: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub feature_names: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows before `split_date` (training) and rows on or after it (testing).
    pub fn split(&self, split_date: NaiveDate) -> (&[FeatureRow], &[FeatureRow]) {
        let at = self.rows.partition_point(|r| r.date < split_date);
        self.rows.split_at(at)
    }
}

pub fn feature_names(lags: usize) -> Vec<String> {
    let mut names: Vec<String> = ["open", "high", "low", "close", "volume"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    names.extend((0..lags).map(|lag| format!("wma_lag_{}", lag)));
    names
}

/// Inputs and targets in the shape a regressor takes.
pub fn to_matrix(rows: &[FeatureRow]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let x = rows.iter().map(|r| r.inputs.clone()).collect();
    let y = rows.iter().map(|r| r.target).collect();
    (x, y)
}

pub fn build_features(
    bars: &[OhlcvBar],
    bollinger: &BollingerParams,
    enhanced: &EnhancedParams,
) -> FeatureSet {
    let wma = calculate_wma(bars, enhanced.wma_period);
    let bands = calculate_bollinger(bars, bollinger.period, bollinger.multiplier);
    let atr = calculate_atr(bars, enhanced.atr_period);

    let mut rows = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        let Some(current_wma) = wma.simple_at(i) else {
            continue;
        };
        let Some(next_wma) = wma.simple_at(i + 1) else {
            continue;
        };
        let Some(b) = bands.bands_at(i) else {
            continue;
        };
        let Some(atr_value) = atr.simple_at(i) else {
            continue;
        };

        let lagged: Option<Vec<f64>> = (0..enhanced.lags)
            .map(|lag| i.checked_sub(lag).and_then(|j| wma.simple_at(j)))
            .collect();
        let Some(lagged) = lagged else {
            continue;
        };

        let mut inputs = vec![bar.open, bar.high, bar.low, bar.close, bar.volume as f64];
        inputs.extend(lagged);

        rows.push(FeatureRow {
            date: bar.date,
            inputs,
            target: next_wma - current_wma,
            close: bar.close,
            wma: current_wma,
            upper: b.upper,
            lower: b.lower,
            atr: atr_value,
        });
    }

    FeatureSet {
        feature_names: feature_names(enhanced.lags),
        rows,
    }
}
