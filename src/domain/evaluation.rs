//! Per-ticker evaluation: features, model, both strategies, baseline and
//! summary, from an already fetched price history.

use tracing::info;

use super::backtest::BacktestResult;
use super::classical::run_classical;
use super::comparison::{
    ModelFit, TickerReport, TickerSummary, align_curves, buy_and_hold_curve,
};
use super::enhanced::run_enhanced;
use super::error::ForestError;
use super::features::build_features;
use super::metrics::Metrics;
use super::ohlcv::OhlcvBar;
use super::portfolio::Portfolio;
use super::run_config::RunConfig;
use super::strategy::StrategyKind;
use crate::ports::model_port::TrendModel;

pub fn evaluate_ticker(
    ticker: &str,
    bars: &[OhlcvBar],
    config: &RunConfig,
    model: &mut dyn TrendModel,
) -> Result<TickerReport, ForestError> {
    if bars.is_empty() {
        return Err(ForestError::NoData {
            ticker: ticker.to_string(),
        });
    }

    let features = build_features(bars, &config.bollinger, &config.enhanced);
    info!(ticker, bars = bars.len(), rows = features.len(), "built feature set");

    let outcome = run_enhanced(
        ticker,
        &features,
        config.split_date,
        model,
        &config.enhanced,
        &config.backtest,
    )?;

    let classical = run_classical(bars, &config.bollinger, config.split_date, &config.backtest);

    let capital = config.backtest.initial_capital;
    let mut baseline = Portfolio::new(capital);
    baseline.equity_curve = buy_and_hold_curve(bars, config.split_date, capital);
    let buy_and_hold = BacktestResult::new(StrategyKind::BuyAndHold, baseline);

    let rf = config.backtest.risk_free_rate;
    let enhanced_m = Metrics::compute(&outcome.result.portfolio, rf);
    let classical_m = Metrics::compute(&classical.portfolio, rf);
    let buy_and_hold_m = Metrics::compute(&buy_and_hold.portfolio, rf);
    let summary = TickerSummary::new(
        ticker,
        &classical_m,
        &enhanced_m,
        &buy_and_hold_m,
        &outcome.model_metrics,
    );

    let comparison = align_curves(
        bars,
        &outcome.result.portfolio.equity_curve,
        &outcome.predictions,
        &classical.portfolio.equity_curve,
        &buy_and_hold.portfolio.equity_curve,
        capital,
    );

    Ok(TickerReport {
        ticker: ticker.to_string(),
        comparison,
        classical,
        enhanced: outcome.result,
        metrics: vec![
            (StrategyKind::Enhanced, enhanced_m),
            (StrategyKind::Classical, classical_m),
            (StrategyKind::BuyAndHold, buy_and_hold_m),
        ],
        model: ModelFit {
            train_rows: outcome.train_rows,
            metrics: outcome.model_metrics,
        },
        summary,
    })
}
