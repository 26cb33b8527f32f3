//! Enhanced Bollinger strategy.
//!
//! A trend model predicts tomorrow's WMA from today's features. The
//! predicted WMA is compared against today's bands: at or below the lower
//! band opens a long, at or above the upper band opens a short. Longs stop
//! out when the prediction falls more than `stop_atr_multiple` ATRs below
//! the entry and take profit above the upper band; shorts mirror that.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::backtest::{BacktestConfig, BacktestResult};
use super::error::ForestError;
use super::execution::{enter_long, enter_short, exit_position};
use super::features::{FeatureRow, FeatureSet, to_matrix};
use super::metrics::ModelMetrics;
use super::portfolio::Portfolio;
use super::position::{ExitReason, Position, Side};
use super::run_config::EnhancedParams;
use super::strategy::StrategyKind;
use crate::ports::model_port::TrendModel;

/// Fewest training rows the model is fit on.
pub const MIN_TRAINING_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Hold,
    EnterLong,
    EnterShort,
    Exit(ExitReason),
}

/// The decision for one day given the current position (if any), the
/// predicted next WMA and today's row. Stops are measured from the close
/// the position was entered on, not its slipped fill.
pub fn decide(
    position: Option<&Position>,
    predicted_wma: f64,
    row: &FeatureRow,
    params: &EnhancedParams,
) -> Decision {
    let stop_distance = params.stop_atr_multiple * row.atr;

    match position {
        None if predicted_wma <= row.lower => Decision::EnterLong,
        None if predicted_wma >= row.upper => Decision::EnterShort,
        None => Decision::Hold,
        Some(p) => match p.side {
            Side::Long if predicted_wma < p.entry_close - stop_distance => {
                Decision::Exit(ExitReason::StopLoss)
            }
            Side::Long if predicted_wma > row.upper => Decision::Exit(ExitReason::TakeProfit),
            Side::Short if predicted_wma > p.entry_close + stop_distance => {
                Decision::Exit(ExitReason::StopLoss)
            }
            Side::Short if predicted_wma < row.lower => Decision::Exit(ExitReason::TakeProfit),
            _ => Decision::Hold,
        },
    }
}

/// Walk `rows` with one predicted WMA change per row, trading on the close.
pub fn simulate_enhanced(
    rows: &[FeatureRow],
    predicted_diffs: &[f64],
    params: &EnhancedParams,
    config: &BacktestConfig,
) -> Portfolio {
    let mut portfolio = Portfolio::new(config.initial_capital);

    for (row, diff) in rows.iter().zip(predicted_diffs) {
        let predicted_wma = row.wma + diff;
        match decide(portfolio.position.as_ref(), predicted_wma, row, params) {
            Decision::Hold => {}
            Decision::EnterLong => {
                enter_long(&mut portfolio, row.close, row.date, &config.execution);
            }
            Decision::EnterShort => {
                enter_short(&mut portfolio, row.close, row.date, &config.execution);
            }
            Decision::Exit(reason) => {
                exit_position(&mut portfolio, row.close, row.date, reason, &config.execution);
            }
        }
        portfolio.mark(row.date, row.close);
    }

    portfolio
}

/// The next-day WMA forecast made on `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub date: NaiveDate,
    pub predicted_wma_next: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedOutcome {
    pub result: BacktestResult,
    pub predictions: Vec<Prediction>,
    pub model_metrics: ModelMetrics,
    pub train_rows: usize,
}

/// Fit `model` on the rows before `split_date`, predict the rest and
/// simulate the strategy over them.
pub fn run_enhanced(
    ticker: &str,
    features: &FeatureSet,
    split_date: NaiveDate,
    model: &mut dyn TrendModel,
    params: &EnhancedParams,
    config: &BacktestConfig,
) -> Result<EnhancedOutcome, ForestError> {
    let (train, test) = features.split(split_date);

    if test.is_empty() {
        return Err(ForestError::NoTestData {
            ticker: ticker.to_string(),
            split: split_date.to_string(),
        });
    }
    if train.len() < MIN_TRAINING_ROWS {
        return Err(ForestError::InsufficientData {
            ticker: ticker.to_string(),
            rows: train.len(),
            minimum: MIN_TRAINING_ROWS,
        });
    }

    let (x_train, y_train) = to_matrix(train);
    let (x_test, y_test) = to_matrix(test);

    info!(ticker, train = train.len(), test = test.len(), "training trend model");
    model.fit(&x_train, &y_train)?;
    let predicted = model.predict(&x_test)?;

    if predicted.len() != test.len() {
        return Err(ForestError::Model {
            reason: format!(
                "expected {} predictions, model returned {}",
                test.len(),
                predicted.len()
            ),
        });
    }

    let model_metrics = ModelMetrics::regression(&y_test, &predicted);
    debug!(
        ticker,
        rmse = model_metrics.rmse,
        r2 = model_metrics.r2,
        "model evaluated on test split"
    );

    let predictions = test
        .iter()
        .zip(&predicted)
        .map(|(row, &diff)| Prediction {
            date: row.date,
            predicted_wma_next: row.wma + diff,
        })
        .collect();

    let portfolio = simulate_enhanced(test, &predicted, params, config);

    Ok(EnhancedOutcome {
        result: BacktestResult::new(StrategyKind::Enhanced, portfolio),
        predictions,
        model_metrics,
        train_rows: train.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::ExecutionConfig;
    use approx::assert_relative_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn row(d: u32, close: f64) -> FeatureRow {
        FeatureRow {
            date: date(d),
            inputs: vec![close],
            target: 0.0,
            close,
            wma: close,
            upper: 110.0,
            lower: 90.0,
            atr: 2.0,
        }
    }

    fn position(side: Side, entry_close: f64) -> Position {
        Position {
            side,
            shares: 1.0,
            entry_price: entry_close,
            entry_close,
            entry_date: date(1),
            entry_commission: 0.0,
        }
    }

    fn params() -> EnhancedParams {
        EnhancedParams::default()
    }

    #[test]
    fn flat_entries() {
        let r = row(1, 100.0);
        assert_eq!(decide(None, 90.0, &r, &params()), Decision::EnterLong);
        assert_eq!(decide(None, 110.0, &r, &params()), Decision::EnterShort);
        assert_eq!(decide(None, 100.0, &r, &params()), Decision::Hold);
    }

    #[test]
    fn long_exits() {
        let r = row(1, 100.0);
        let long = position(Side::Long, 100.0);
        // stop at 100 - 3 * 2 = 94
        assert_eq!(
            decide(Some(&long), 93.9, &r, &params()),
            Decision::Exit(ExitReason::StopLoss)
        );
        assert_eq!(decide(Some(&long), 94.0, &r, &params()), Decision::Hold);
        assert_eq!(
            decide(Some(&long), 110.1, &r, &params()),
            Decision::Exit(ExitReason::TakeProfit)
        );
        assert_eq!(decide(Some(&long), 110.0, &r, &params()), Decision::Hold);
    }

    #[test]
    fn short_exits() {
        let r = row(1, 100.0);
        let short = position(Side::Short, 100.0);
        assert_eq!(
            decide(Some(&short), 106.1, &r, &params()),
            Decision::Exit(ExitReason::StopLoss)
        );
        assert_eq!(decide(Some(&short), 106.0, &r, &params()), Decision::Hold);
        assert_eq!(
            decide(Some(&short), 89.9, &r, &params()),
            Decision::Exit(ExitReason::TakeProfit)
        );
    }

    #[test]
    fn stop_ignores_entry_slippage() {
        let r = row(1, 100.0);
        let long = Position {
            entry_price: 101.0,
            ..position(Side::Long, 100.0)
        };
        // stop at 100 - 6, not 101 - 6
        assert_eq!(decide(Some(&long), 94.5, &r, &params()), Decision::Hold);
        assert_eq!(
            decide(Some(&long), 93.9, &r, &params()),
            Decision::Exit(ExitReason::StopLoss)
        );

        let short = Position {
            entry_price: 99.0,
            ..position(Side::Short, 100.0)
        };
        assert_eq!(decide(Some(&short), 105.5, &r, &params()), Decision::Hold);
        assert_eq!(
            decide(Some(&short), 106.1, &r, &params()),
            Decision::Exit(ExitReason::StopLoss)
        );
    }

    #[test]
    fn slipped_long_holds_inside_stop() {
        let rows = vec![row(1, 100.0), row(2, 96.0)];
        // predicted WMA: 89 (enter long, filled at 101), 94.5 (inside the stop at 94)
        let diffs = [-11.0, -1.5];
        let config = BacktestConfig {
            initial_capital: 1_000.0,
            execution: ExecutionConfig {
                slippage_pct: 1.0,
                ..ExecutionConfig::default()
            },
            ..BacktestConfig::default()
        };
        let p = simulate_enhanced(&rows, &diffs, &params(), &config);

        assert!(p.closed_trades.is_empty());
        let open = p.position.as_ref().unwrap();
        assert_relative_eq!(open.entry_price, 101.0, epsilon = 1e-9);
        assert_relative_eq!(open.entry_close, 100.0);
    }

    #[test]
    fn long_then_take_profit() {
        let rows = vec![row(1, 100.0), row(2, 105.0), row(3, 108.0)];
        // predicted WMA: 89 (enter long), 104 (hold), 111 (take profit)
        let diffs = [-11.0, -1.0, 3.0];
        let config = BacktestConfig {
            initial_capital: 1_000.0,
            ..BacktestConfig::default()
        };
        let p = simulate_enhanced(&rows, &diffs, &params(), &config);

        assert!(p.is_flat());
        assert_eq!(p.closed_trades.len(), 1);
        assert_eq!(p.closed_trades[0].exit_reason, ExitReason::TakeProfit);
        assert_eq!(p.equity_curve.len(), 3);
        assert_relative_eq!(p.equity_curve[1].equity, 1_050.0, epsilon = 1e-9);
        assert_relative_eq!(p.final_equity(), 1_080.0, epsilon = 1e-9);
    }

    #[test]
    fn short_equity_tracks_price_drop() {
        let rows = vec![row(1, 100.0), row(2, 95.0)];
        let diffs = [15.0, 0.0];
        let config = BacktestConfig {
            initial_capital: 1_000.0,
            ..BacktestConfig::default()
        };
        let p = simulate_enhanced(&rows, &diffs, &params(), &config);
        assert!(p.position.as_ref().is_some_and(Position::is_short));
        assert_relative_eq!(p.final_equity(), 1_050.0, epsilon = 1e-9);
    }

    #[test]
    fn take_profit_then_short_stopped_out() {
        let rows = vec![
            row(1, 100.0),
            row(2, 108.0),
            row(3, 105.0),
            row(4, 107.0),
            row(5, 112.0),
        ];
        // predicted WMA: 89 enter long, 111 take profit, 110 enter short,
        // 107 hold (stop at 105 + 6), 112 stop loss
        let diffs = [-11.0, 3.0, 5.0, 0.0, 0.0];
        let config = BacktestConfig {
            initial_capital: 1_000.0,
            ..BacktestConfig::default()
        };
        let p = simulate_enhanced(&rows, &diffs, &params(), &config);

        assert!(p.is_flat());
        assert_eq!(p.closed_trades.len(), 2);
        let (long, short) = (&p.closed_trades[0], &p.closed_trades[1]);
        assert_eq!(long.exit_reason, ExitReason::TakeProfit);
        assert_relative_eq!(long.pnl, 80.0, epsilon = 1e-9);

        // the short is sized at the equity after the long: 1080 / 105 shares
        assert_eq!(short.side, Side::Short);
        assert_eq!(short.exit_reason, ExitReason::StopLoss);
        assert_eq!(short.entry_date, date(3));
        assert_relative_eq!(short.shares, 1_080.0 / 105.0, epsilon = 1e-9);
        assert_relative_eq!(short.pnl, -72.0, epsilon = 1e-9);

        let equity: Vec<f64> = p.equity_curve.iter().map(|e| e.equity).collect();
        assert_relative_eq!(equity[1], 1_080.0, epsilon = 1e-9);
        assert_relative_eq!(equity[2], 1_080.0, epsilon = 1e-9);
        assert_relative_eq!(equity[3], 1_080.0 - 1_080.0 / 105.0 * 2.0, epsilon = 1e-9);
        assert_relative_eq!(p.final_equity(), 1_008.0, epsilon = 1e-9);
        assert_relative_eq!(p.cash, 1_008.0, epsilon = 1e-9);
    }

    struct EchoModel {
        fitted: bool,
    }

    impl TrendModel for EchoModel {
        fn fit(&mut self, _features: &[Vec<f64>], _targets: &[f64]) -> Result<(), ForestError> {
            self.fitted = true;
            Ok(())
        }

        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ForestError> {
            if !self.fitted {
                return Err(ForestError::Model {
                    reason: "not fitted".into(),
                });
            }
            Ok(features.iter().map(|_| 0.0).collect())
        }
    }

    fn feature_set(days: u32) -> FeatureSet {
        FeatureSet {
            feature_names: vec!["close".into()],
            rows: (1..=days).map(|d| row(d, 100.0)).collect(),
        }
    }

    #[test]
    fn run_reports_predictions_and_train_size() {
        let set = feature_set(20);
        let mut model = EchoModel { fitted: false };
        let outcome = run_enhanced(
            "TEST",
            &set,
            date(15),
            &mut model,
            &params(),
            &BacktestConfig::default(),
        )
        .unwrap();

        assert_eq!(outcome.train_rows, 14);
        assert_eq!(outcome.predictions.len(), 6);
        assert_eq!(outcome.predictions[0].date, date(15));
        assert_eq!(outcome.result.strategy, StrategyKind::Enhanced);
        assert_eq!(outcome.result.portfolio.equity_curve.len(), 6);
    }

    #[test]
    fn run_without_test_rows_fails() {
        let set = feature_set(20);
        let err = run_enhanced(
            "TEST",
            &set,
            date(25),
            &mut EchoModel { fitted: false },
            &params(),
            &BacktestConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ForestError::NoTestData { .. }));
    }

    #[test]
    fn run_with_short_history_fails() {
        let set = feature_set(20);
        let err = run_enhanced(
            "TEST",
            &set,
            date(5),
            &mut EchoModel { fitted: false },
            &params(),
            &BacktestConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ForestError::InsufficientData {
                rows: 4,
                minimum: MIN_TRAINING_ROWS,
                ..
            }
        ));
    }
}
