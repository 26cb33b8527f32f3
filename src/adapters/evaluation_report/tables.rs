//! CSV tables and the console summary.

use std::io;

use crate::domain::backtest::BacktestResult;
use crate::domain::comparison::{ComparisonPoint, ModelFit, TickerSummary};
use crate::domain::error::ForestError;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::StrategyKind;

pub const SUMMARY_HEADER: [&str; 9] = [
    "Ticker",
    "Classical Return %",
    "Enhanced Return %",
    "Buy & Hold Return %",
    "Classical DD %",
    "Enhanced DD %",
    "Classical Sharpe",
    "Enhanced Sharpe",
    "Model Directional Accuracy %",
];

fn csv_err(e: csv::Error) -> ForestError {
    ForestError::Io(io::Error::other(e))
}

fn num(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn write_equity_csv<W: io::Write>(
    out: W,
    points: &[ComparisonPoint],
) -> Result<(), ForestError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "date",
        "close",
        "enhanced",
        "classical",
        "buy_and_hold",
        "predicted_wma_next",
    ])
    .map_err(csv_err)?;
    for p in points {
        wtr.write_record([
            p.date.to_string(),
            num(p.close),
            num(p.enhanced),
            num(p.classical),
            num(p.buy_and_hold),
            p.predicted_wma_next.map(num).unwrap_or_default(),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Closed trades of every strategy, then any position still open at the end
/// (exit reason `open`, PnL unrealized at `last_close`).
pub fn write_trades_csv<W: io::Write>(
    out: W,
    results: &[&BacktestResult],
    last_close: Option<f64>,
) -> Result<(), ForestError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "strategy",
        "side",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "shares",
        "pnl",
        "exit_reason",
    ])
    .map_err(csv_err)?;

    for result in results {
        let strategy = result.strategy.label();
        for t in &result.portfolio.closed_trades {
            wtr.write_record([
                strategy.to_string(),
                t.side.to_string(),
                t.entry_date.to_string(),
                num(t.entry_price),
                t.exit_date.to_string(),
                num(t.exit_price),
                format!("{:.4}", t.shares),
                num(t.pnl),
                t.exit_reason.to_string(),
            ])
            .map_err(csv_err)?;
        }
        if let Some(p) = &result.portfolio.position {
            let pnl = last_close
                .map(|c| num(p.unrealized_pnl(c) - p.entry_commission))
                .unwrap_or_default();
            wtr.write_record([
                strategy.to_string(),
                p.side.to_string(),
                p.entry_date.to_string(),
                num(p.entry_price),
                String::new(),
                String::new(),
                format!("{:.4}", p.shares),
                pnl,
                "open".to_string(),
            ])
            .map_err(csv_err)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// One row per strategy with every backtest metric; returns, drawdown and
/// win rate as percentages.
pub fn write_metrics_csv<W: io::Write>(
    out: W,
    metrics: &[(StrategyKind, Metrics)],
) -> Result<(), ForestError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "strategy",
        "total_return_pct",
        "annualized_return_pct",
        "sharpe",
        "sortino",
        "max_drawdown_pct",
        "max_drawdown_days",
        "total_trades",
        "won",
        "lost",
        "breakeven",
        "win_rate_pct",
        "profit_factor",
        "avg_win",
        "avg_loss",
        "largest_win",
        "largest_loss",
        "avg_trade_days",
    ])
    .map_err(csv_err)?;
    for (strategy, m) in metrics {
        wtr.write_record([
            strategy.label().to_string(),
            num(m.total_return * 100.0),
            num(m.annualized_return * 100.0),
            num(m.sharpe_ratio),
            num(m.sortino_ratio),
            num(m.max_drawdown * 100.0),
            m.max_drawdown_duration.to_string(),
            m.total_trades.to_string(),
            m.trades_won.to_string(),
            m.trades_lost.to_string(),
            m.trades_breakeven.to_string(),
            num(m.win_rate * 100.0),
            num(m.profit_factor),
            num(m.avg_win),
            num(m.avg_loss),
            num(m.largest_win),
            num(m.largest_loss),
            num(m.avg_trade_duration),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Training size and out-of-sample error of the trend model, one
/// `metric,value` pair per line.
pub fn write_model_csv<W: io::Write>(out: W, model: &ModelFit) -> Result<(), ForestError> {
    let m = &model.metrics;
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["metric", "value"]).map_err(csv_err)?;
    let rows = [
        ("train_rows", model.train_rows.to_string()),
        ("test_rows", m.samples.to_string()),
        ("mse", format!("{:.6}", m.mse)),
        ("rmse", format!("{:.6}", m.rmse)),
        ("mae", format!("{:.6}", m.mae)),
        ("r2", format!("{:.4}", m.r2)),
        ("directional_accuracy_pct", num(m.directional_accuracy * 100.0)),
    ];
    for (name, value) in rows {
        wtr.write_record([name, value.as_str()]).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

fn summary_fields(s: &TickerSummary) -> [String; 9] {
    [
        s.ticker.clone(),
        num(s.classical_return_pct),
        num(s.enhanced_return_pct),
        num(s.buy_and_hold_return_pct),
        num(s.classical_drawdown_pct),
        num(s.enhanced_drawdown_pct),
        num(s.classical_sharpe),
        num(s.enhanced_sharpe),
        num(s.directional_accuracy_pct),
    ]
}

pub fn write_summary_csv<W: io::Write>(
    out: W,
    summaries: &[TickerSummary],
) -> Result<(), ForestError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(SUMMARY_HEADER).map_err(csv_err)?;
    for s in summaries {
        wtr.write_record(summary_fields(s)).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Fixed-width text table of the summary rows, one line per ticker.
pub fn format_summary_table(summaries: &[TickerSummary]) -> String {
    let rows: Vec<[String; 9]> = summaries.iter().map(summary_fields).collect();
    let widths: Vec<usize> = SUMMARY_HEADER
        .iter()
        .enumerate()
        .map(|(i, h)| rows.iter().map(|r| r[i].len()).fold(h.len(), usize::max))
        .collect();

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{:<w$}", cell)
                } else {
                    format!("{:>w$}", cell)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut output = line(SUMMARY_HEADER.to_vec());
    output.push('\n');
    for row in &rows {
        output.push_str(&line(row.iter().map(String::as_str).collect()));
        output.push('\n');
    }
    output
}
