//! Core domain types and logic.

pub mod ohlcv;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod indicator;
pub mod features;
pub mod backtest;
pub mod classical;
pub mod enhanced;
pub mod comparison;
pub mod evaluation;
pub mod metrics;
pub mod strategy;
pub mod ticker;
pub mod run_config;
pub mod config_validation;
pub mod error;
