//! Report generation port.

use crate::domain::comparison::{TickerReport, TickerSummary};
use crate::domain::error::ForestError;

/// Port for writing evaluation artifacts.
pub trait ReportPort {
    /// Per-ticker artifacts (comparison chart, equity curves, trade log).
    fn write_ticker(&self, report: &TickerReport) -> Result<(), ForestError>;

    /// Cross-ticker summary table.
    fn write_summary(&self, summaries: &[TickerSummary]) -> Result<(), ForestError>;
}
