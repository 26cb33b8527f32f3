//! Backtest parameters and results shared by all strategies.

use super::execution::ExecutionConfig;
use super::portfolio::Portfolio;
use super::strategy::StrategyKind;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Annual rate, subtracted from daily returns in risk-adjusted metrics.
    pub risk_free_rate: f64,
    pub execution: ExecutionConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            risk_free_rate: 0.0,
            execution: ExecutionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: StrategyKind,
    pub portfolio: Portfolio,
}

impl BacktestResult {
    pub fn new(strategy: StrategyKind, portfolio: Portfolio) -> Self {
        Self {
            strategy,
            portfolio,
        }
    }

    pub fn total_return(&self) -> f64 {
        let initial = self.portfolio.initial_capital;
        if initial > 0.0 {
            (self.portfolio.final_equity() - initial) / initial
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn config_defaults() {
        let c = BacktestConfig::default();
        assert!((c.initial_capital - 100_000.0).abs() < f64::EPSILON);
        assert!(c.risk_free_rate.abs() < f64::EPSILON);
        assert_eq!(c.execution, ExecutionConfig::default());
    }

    #[test]
    fn total_return_from_final_equity() {
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.record_equity(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 1_000.0);
        portfolio.record_equity(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 1_250.0);
        let result = BacktestResult::new(StrategyKind::Classical, portfolio);
        assert!((result.total_return() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn total_return_empty_curve_is_zero() {
        let result = BacktestResult::new(StrategyKind::Enhanced, Portfolio::new(1_000.0));
        assert!(result.total_return().abs() < f64::EPSILON);
    }
}
