//! Classical Bollinger strategy: long only, buy at the lower band, sell at
//! the upper band.

use chrono::NaiveDate;

use super::backtest::{BacktestConfig, BacktestResult};
use super::execution::{enter_long, exit_position};
use super::indicator::IndicatorSeries;
use super::indicator::bollinger::calculate_bollinger;
use super::ohlcv::OhlcvBar;
use super::portfolio::Portfolio;
use super::position::ExitReason;
use super::run_config::BollingerParams;
use super::strategy::StrategyKind;

/// Run the classical strategy over the bars dated on or after `test_start`.
///
/// Bands are computed on the test bars alone, so the first `period - 1`
/// test days are band warm-up and never trade.
pub fn run_classical(
    bars: &[OhlcvBar],
    params: &BollingerParams,
    test_start: NaiveDate,
    config: &BacktestConfig,
) -> BacktestResult {
    let test = &bars[bars.partition_point(|b| b.date < test_start)..];
    let bands = calculate_bollinger(test, params.period, params.multiplier);
    let portfolio = simulate_classical(test, &bands, config);
    BacktestResult::new(StrategyKind::Classical, portfolio)
}

/// Walk `bars` with `bands` computed over the same bars.
pub fn simulate_classical(
    bars: &[OhlcvBar],
    bands: &IndicatorSeries,
    config: &BacktestConfig,
) -> Portfolio {
    let mut portfolio = Portfolio::new(config.initial_capital);

    for (i, bar) in bars.iter().enumerate() {
        if let Some(b) = bands.bands_at(i) {
            if portfolio.is_flat() {
                if bar.close <= b.lower {
                    enter_long(&mut portfolio, bar.close, bar.date, &config.execution);
                }
            } else if bar.close >= b.upper {
                exit_position(
                    &mut portfolio,
                    bar.close,
                    bar.date,
                    ExitReason::Signal,
                    &config.execution,
                );
            }
        }
        portfolio.mark(bar.date, bar.close);
    }

    portfolio
}
