//! Side-by-side comparison of the strategies for one ticker.

use chrono::NaiveDate;

use super::backtest::BacktestResult;
use super::enhanced::Prediction;
use super::metrics::{Metrics, ModelMetrics};
use super::ohlcv::OhlcvBar;
use super::portfolio::EquityPoint;
use super::strategy::StrategyKind;

/// One day of the comparison chart and equity CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub enhanced: f64,
    pub classical: f64,
    pub buy_and_hold: f64,
    /// Model's next-day WMA forecast made on this date.
    pub predicted_wma_next: Option<f64>,
}

/// Equity of buying `initial_capital` worth of the first bar on or after
/// `test_start` and holding it: close / first close * capital.
pub fn buy_and_hold_curve(
    bars: &[OhlcvBar],
    test_start: NaiveDate,
    initial_capital: f64,
) -> Vec<EquityPoint> {
    let first = bars.partition_point(|b| b.date < test_start);
    let test = &bars[first..];
    let Some(base) = test.first().map(|b| b.close).filter(|c| *c > 0.0) else {
        return Vec::new();
    };

    test.iter()
        .map(|b| EquityPoint {
            date: b.date,
            equity: b.close / base * initial_capital,
        })
        .collect()
}

/// Comparison points on the enhanced strategy's dates. Closes, classical
/// and buy & hold equity are forward-filled onto those dates; before their
/// first point they take `initial_capital`. Predictions are matched by
/// exact date.
pub fn align_curves(
    bars: &[OhlcvBar],
    enhanced: &[EquityPoint],
    predictions: &[Prediction],
    classical: &[EquityPoint],
    buy_and_hold: &[EquityPoint],
    initial_capital: f64,
) -> Vec<ComparisonPoint> {
    let mut closes = ForwardFill::new(bars.iter().map(|b| (b.date, b.close)), f64::NAN);
    let mut classical = ForwardFill::new(
        classical.iter().map(|p| (p.date, p.equity)),
        initial_capital,
    );
    let mut buy_and_hold = ForwardFill::new(
        buy_and_hold.iter().map(|p| (p.date, p.equity)),
        initial_capital,
    );
    let mut predictions = predictions.iter().peekable();

    enhanced
        .iter()
        .map(|p| {
            while predictions.next_if(|pr| pr.date < p.date).is_some() {}
            let predicted_wma_next = predictions
                .next_if(|pr| pr.date == p.date)
                .map(|pr| pr.predicted_wma_next);
            ComparisonPoint {
                date: p.date,
                close: closes.value_at(p.date),
                enhanced: p.equity,
                classical: classical.value_at(p.date),
                buy_and_hold: buy_and_hold.value_at(p.date),
                predicted_wma_next,
            }
        })
        .collect()
}

/// Walks an ascending (date, value) series, answering "latest value on or
/// before `date`" for ascending queries.
struct ForwardFill<I: Iterator<Item = (NaiveDate, f64)>> {
    source: std::iter::Peekable<I>,
    current: f64,
}

impl<I: Iterator<Item = (NaiveDate, f64)>> ForwardFill<I> {
    fn new(source: I, initial: f64) -> Self {
        Self {
            source: source.peekable(),
            current: initial,
        }
    }

    fn value_at(&mut self, date: NaiveDate) -> f64 {
        while let Some((_, value)) = self.source.next_if(|(d, _)| *d <= date) {
            self.current = value;
        }
        self.current
    }
}

/// One row of `results_summary.csv`; percentages and ratios rounded to two
/// decimals. Drawdowns are negative.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSummary {
    pub ticker: String,
    pub classical_return_pct: f64,
    pub enhanced_return_pct: f64,
    pub buy_and_hold_return_pct: f64,
    pub classical_drawdown_pct: f64,
    pub enhanced_drawdown_pct: f64,
    pub classical_sharpe: f64,
    pub enhanced_sharpe: f64,
    pub directional_accuracy_pct: f64,
}

impl TickerSummary {
    pub fn new(
        ticker: &str,
        classical: &Metrics,
        enhanced: &Metrics,
        buy_and_hold: &Metrics,
        model: &ModelMetrics,
    ) -> Self {
        TickerSummary {
            ticker: ticker.to_string(),
            classical_return_pct: round2(classical.total_return * 100.0),
            enhanced_return_pct: round2(enhanced.total_return * 100.0),
            buy_and_hold_return_pct: round2(buy_and_hold.total_return * 100.0),
            classical_drawdown_pct: round2(-classical.max_drawdown * 100.0),
            enhanced_drawdown_pct: round2(-enhanced.max_drawdown * 100.0),
            classical_sharpe: round2(classical.sharpe_ratio),
            enhanced_sharpe: round2(enhanced.sharpe_ratio),
            directional_accuracy_pct: round2(model.directional_accuracy * 100.0),
        }
    }
}

pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // avoid printing "-0.00"
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// How the trend model was fit and how it did out of sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelFit {
    pub train_rows: usize,
    pub metrics: ModelMetrics,
}

/// Everything the report writer needs for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerReport {
    pub ticker: String,
    pub comparison: Vec<ComparisonPoint>,
    pub classical: BacktestResult,
    pub enhanced: BacktestResult,
    /// Full metrics per strategy: enhanced, classical, then buy & hold.
    pub metrics: Vec<(StrategyKind, Metrics)>,
    pub model: ModelFit,
    pub summary: TickerSummary,
}
