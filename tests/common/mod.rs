#![allow(dead_code)]

use bandforest::domain::comparison::{TickerReport, TickerSummary};
use bandforest::domain::error::ForestError;
pub use bandforest::domain::ohlcv::OhlcvBar;
use bandforest::domain::run_config::{ForestParams, RunConfig};
use bandforest::ports::data_port::DataPort;
use bandforest::ports::model_port::TrendModel;
use bandforest::ports::report_port::ReportPort;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub calls: RefCell<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ForestError> {
        self.calls.borrow_mut().push(ticker.to_string());
        if let Some(reason) = self.errors.get(ticker) {
            return Err(ForestError::Fetch {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        let bars: Vec<OhlcvBar> = self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if bars.is_empty() {
            return Err(ForestError::NoData {
                ticker: ticker.to_string(),
            });
        }
        Ok(bars)
    }
}

/// Predicts the mean training target for every row.
#[derive(Default)]
pub struct MeanModel {
    mean: Option<f64>,
}

impl TrendModel for MeanModel {
    fn fit(&mut self, _features: &[Vec<f64>], targets: &[f64]) -> Result<(), ForestError> {
        self.mean = Some(targets.iter().sum::<f64>() / targets.len() as f64);
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ForestError> {
        let mean = self.mean.ok_or_else(|| ForestError::Model {
            reason: "not fitted".into(),
        })?;
        Ok(vec![mean; features.len()])
    }
}

pub struct FailingModel;

impl TrendModel for FailingModel {
    fn fit(&mut self, _features: &[Vec<f64>], _targets: &[f64]) -> Result<(), ForestError> {
        Err(ForestError::Model {
            reason: "training diverged".into(),
        })
    }

    fn predict(&self, _features: &[Vec<f64>]) -> Result<Vec<f64>, ForestError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct RecordingReport {
    pub tickers: RefCell<Vec<String>>,
    pub summaries: RefCell<Vec<TickerSummary>>,
    pub fail_writes: bool,
}

impl RecordingReport {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }
}

impl ReportPort for RecordingReport {
    fn write_ticker(&self, report: &TickerReport) -> Result<(), ForestError> {
        if self.fail_writes {
            return Err(ForestError::Io(std::io::Error::other("read-only output")));
        }
        self.tickers.borrow_mut().push(report.ticker.clone());
        Ok(())
    }

    fn write_summary(&self, summaries: &[TickerSummary]) -> Result<(), ForestError> {
        self.summaries.borrow_mut().extend_from_slice(summaries);
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily bars oscillating around `start_price` with a slow upward drift,
/// wide enough to touch 3-sigma bands now and then.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = start_price + 8.0 * (t * 0.3).sin() + 3.0 * (t * 1.7).cos() + t * 0.02;
            OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000 + (i as i64 % 50) * 10,
            }
        })
        .collect()
}

/// Defaults with a small forest, split at 2019-01-01.
pub fn test_config(tickers: &[&str]) -> RunConfig {
    RunConfig {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        start_date: date(2018, 1, 1),
        end_date: date(2019, 12, 31),
        split_date: date(2019, 1, 1),
        forest: ForestParams {
            n_trees: 5,
            ..ForestParams::default()
        },
        ..RunConfig::default()
    }
}
