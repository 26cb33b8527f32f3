//! Run configuration: everything one invocation needs, after CLI flags and
//! the optional INI file have been merged.

use chrono::NaiveDate;
use std::path::PathBuf;

use super::backtest::BacktestConfig;
use super::indicator::{atr, bollinger, wma};

pub const DEFAULT_TICKERS: [&str; 2] = ["2888.HK", "0005.HK"];
pub const DEFAULT_START: &str = "2011-01-01";
pub const DEFAULT_END: &str = "2021-12-31";
pub const DEFAULT_SPLIT: &str = "2019-01-01";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "evaluation";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: bollinger::DEFAULT_PERIOD,
            multiplier: bollinger::DEFAULT_MULTIPLIER,
        }
    }
}

/// Parameters of the model-driven strategy and its feature set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancedParams {
    pub atr_period: usize,
    /// Stop distance from the entry price, in ATRs.
    pub stop_atr_multiple: f64,
    pub wma_period: usize,
    /// Number of WMA lags fed to the model, lag 0 being the current WMA.
    pub lags: usize,
}

impl Default for EnhancedParams {
    fn default() -> Self {
        Self {
            atr_period: atr::DEFAULT_PERIOD,
            stop_atr_multiple: 3.0,
            wma_period: wma::DEFAULT_PERIOD,
            lags: 6,
        }
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows trees until leaves are pure or hit `min_samples_leaf`.
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub split_date: NaiveDate,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub offline: bool,
    pub backtest: BacktestConfig,
    pub bollinger: BollingerParams,
    pub enhanced: EnhancedParams,
    pub forest: ForestParams,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            start_date: default_date(DEFAULT_START),
            end_date: default_date(DEFAULT_END),
            split_date: default_date(DEFAULT_SPLIT),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            offline: false,
            backtest: BacktestConfig::default(),
            bollinger: BollingerParams::default(),
            enhanced: EnhancedParams::default(),
            forest: ForestParams::default(),
        }
    }
}

fn default_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}
