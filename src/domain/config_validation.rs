//! Run configuration validation.
//!
//! Checks the merged configuration before any data is fetched. The first
//! violation is reported, naming the INI section and key it came from.

use crate::domain::error::ForestError;
use crate::domain::run_config::RunConfig;

pub fn validate_run_config(config: &RunConfig) -> Result<(), ForestError> {
    validate_tickers(config)?;
    validate_dates(config)?;
    validate_backtest(config)?;
    validate_bollinger(config)?;
    validate_enhanced(config)?;
    validate_forest(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> ForestError {
    ForestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_tickers(config: &RunConfig) -> Result<(), ForestError> {
    if config.tickers.iter().all(|t| t.trim().is_empty()) {
        return Err(ForestError::ConfigMissing {
            section: "backtest".to_string(),
            key: "tickers".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &RunConfig) -> Result<(), ForestError> {
    if config.start_date >= config.split_date {
        return Err(invalid(
            "backtest",
            "split_date",
            "split_date must be after start_date",
        ));
    }
    if config.split_date > config.end_date {
        return Err(invalid(
            "backtest",
            "split_date",
            "split_date must not be after end_date",
        ));
    }
    Ok(())
}

fn validate_backtest(config: &RunConfig) -> Result<(), ForestError> {
    let bt = &config.backtest;
    if !(bt.initial_capital > 0.0) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    if bt.execution.commission_pct < 0.0 {
        return Err(invalid(
            "backtest",
            "commission_pct",
            "commission_pct must be non-negative",
        ));
    }
    if bt.execution.slippage_pct < 0.0 {
        return Err(invalid(
            "backtest",
            "slippage_pct",
            "slippage_pct must be non-negative",
        ));
    }
    if !(0.0..1.0).contains(&bt.risk_free_rate) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_bollinger(config: &RunConfig) -> Result<(), ForestError> {
    if config.bollinger.period < 2 {
        return Err(invalid("bollinger", "period", "period must be at least 2"));
    }
    if !(config.bollinger.multiplier > 0.0) {
        return Err(invalid(
            "bollinger",
            "multiplier",
            "multiplier must be positive",
        ));
    }
    Ok(())
}

fn validate_enhanced(config: &RunConfig) -> Result<(), ForestError> {
    let e = &config.enhanced;
    if e.atr_period < 1 {
        return Err(invalid("enhanced", "atr_period", "atr_period must be at least 1"));
    }
    if !(e.stop_atr_multiple > 0.0) {
        return Err(invalid(
            "enhanced",
            "stop_atr_multiple",
            "stop_atr_multiple must be positive",
        ));
    }
    if e.wma_period < 1 {
        return Err(invalid("enhanced", "wma_period", "wma_period must be at least 1"));
    }
    if e.lags < 1 {
        return Err(invalid("enhanced", "lags", "lags must be at least 1"));
    }
    Ok(())
}

fn validate_forest(config: &RunConfig) -> Result<(), ForestError> {
    let f = &config.forest;
    if f.n_trees < 1 {
        return Err(invalid("forest", "n_trees", "n_trees must be at least 1"));
    }
    if f.max_depth == Some(0) {
        return Err(invalid("forest", "max_depth", "max_depth must be at least 1"));
    }
    if f.min_samples_split < 2 {
        return Err(invalid(
            "forest",
            "min_samples_split",
            "min_samples_split must be at least 2",
        ));
    }
    if f.min_samples_leaf < 1 {
        return Err(invalid(
            "forest",
            "min_samples_leaf",
            "min_samples_leaf must be at least 1",
        ));
    }
    Ok(())
}
