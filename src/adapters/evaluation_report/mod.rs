//! Evaluation artifacts on disk.
//!
//! Per ticker: `<stem>_comparison.svg`, `<stem>_equity.csv`,
//! `<stem>_trades.csv`, `<stem>_metrics.csv` and `<stem>_model.csv`.
//! Across tickers: `results_summary.csv`.

pub mod chart_svg;
pub mod tables;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::comparison::{TickerReport, TickerSummary};
use crate::domain::error::ForestError;
use crate::domain::ticker::file_stem;
use crate::ports::report_port::ReportPort;

pub const SUMMARY_FILE: &str = "results_summary.csv";

pub struct EvaluationReport {
    output_dir: PathBuf,
}

impl EvaluationReport {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn create(&self, file_name: &str) -> Result<(PathBuf, BufWriter<File>), ForestError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        let file = File::create(&path)?;
        Ok((path, BufWriter::new(file)))
    }
}

impl ReportPort for EvaluationReport {
    fn write_ticker(&self, report: &TickerReport) -> Result<(), ForestError> {
        let stem = file_stem(&report.ticker);

        fs::create_dir_all(&self.output_dir)?;
        let chart_path = self.output_dir.join(format!("{stem}_comparison.svg"));
        fs::write(
            &chart_path,
            chart_svg::comparison_chart(&report.ticker, &report.comparison),
        )?;

        let (equity_path, out) = self.create(&format!("{stem}_equity.csv"))?;
        tables::write_equity_csv(out, &report.comparison)?;

        let last_close = report.comparison.last().map(|p| p.close);
        let (trades_path, out) = self.create(&format!("{stem}_trades.csv"))?;
        tables::write_trades_csv(out, &[&report.enhanced, &report.classical], last_close)?;

        let (metrics_path, out) = self.create(&format!("{stem}_metrics.csv"))?;
        tables::write_metrics_csv(out, &report.metrics)?;

        let (_, out) = self.create(&format!("{stem}_model.csv"))?;
        tables::write_model_csv(out, &report.model)?;

        info!(
            ticker = %report.ticker,
            chart = %chart_path.display(),
            equity = %equity_path.display(),
            trades = %trades_path.display(),
            metrics = %metrics_path.display(),
            "wrote ticker report"
        );
        Ok(())
    }

    fn write_summary(&self, summaries: &[TickerSummary]) -> Result<(), ForestError> {
        let (path, out) = self.create(SUMMARY_FILE)?;
        tables::write_summary_csv(out, summaries)?;
        info!(path = %path.display(), tickers = summaries.len(), "wrote summary");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::BacktestResult;
    use crate::domain::comparison::{ComparisonPoint, ModelFit};
    use crate::domain::metrics::Metrics;
    use crate::domain::portfolio::Portfolio;
    use crate::domain::strategy::StrategyKind;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn summary() -> TickerSummary {
        TickerSummary {
            ticker: "^HSI".to_string(),
            classical_return_pct: 1.0,
            enhanced_return_pct: 2.0,
            buy_and_hold_return_pct: 3.0,
            classical_drawdown_pct: -4.0,
            enhanced_drawdown_pct: -5.0,
            classical_sharpe: 0.6,
            enhanced_sharpe: 0.7,
            directional_accuracy_pct: 52.0,
        }
    }

    fn report() -> TickerReport {
        TickerReport {
            ticker: "^HSI".to_string(),
            comparison: vec![ComparisonPoint {
                date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
                close: 28_000.0,
                enhanced: 100_000.0,
                classical: 100_000.0,
                buy_and_hold: 100_000.0,
                predicted_wma_next: Some(28_010.0),
            }],
            classical: BacktestResult::new(StrategyKind::Classical, Portfolio::new(100_000.0)),
            enhanced: BacktestResult::new(StrategyKind::Enhanced, Portfolio::new(100_000.0)),
            metrics: vec![
                (StrategyKind::Enhanced, Metrics::from_curve(&[], &[], 1.0, 0.0)),
                (StrategyKind::Classical, Metrics::from_curve(&[], &[], 1.0, 0.0)),
            ],
            model: ModelFit {
                train_rows: 300,
                ..ModelFit::default()
            },
            summary: summary(),
        }
    }

    #[test]
    fn writes_all_ticker_artifacts() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("evaluation");
        let writer = EvaluationReport::new(out.clone());
        writer.write_ticker(&report()).unwrap();

        assert!(out.join("HSI_comparison.svg").exists());
        let equity = fs::read_to_string(out.join("HSI_equity.csv")).unwrap();
        assert!(equity.contains("2020-01-02,28000.00,100000.00"));
        assert!(equity.trim_end().ends_with(",28010.00"));
        let trades = fs::read_to_string(out.join("HSI_trades.csv")).unwrap();
        assert_eq!(trades.lines().count(), 1);
        let metrics = fs::read_to_string(out.join("HSI_metrics.csv")).unwrap();
        let labels: Vec<&str> = metrics
            .lines()
            .skip(1)
            .filter_map(|l| l.split(',').next())
            .collect();
        assert_eq!(labels, vec!["Enhanced", "Classical"]);
        let model = fs::read_to_string(out.join("HSI_model.csv")).unwrap();
        assert!(model.contains("train_rows,300"));
    }

    #[test]
    fn writes_summary_file() {
        let dir = TempDir::new().unwrap();
        let writer = EvaluationReport::new(dir.path().to_path_buf());
        writer.write_summary(&[summary()]).unwrap();
        let text = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("^HSI,1.00,2.00,3.00,-4.00,-5.00,0.60,0.70,52.00"));
    }
}
