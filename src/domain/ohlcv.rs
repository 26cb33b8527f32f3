//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Sort ascending by date and drop duplicate dates, keeping the last bar seen.
pub fn normalize_bars(mut bars: Vec<OhlcvBar>) -> Vec<OhlcvBar> {
    // Stable sort keeps source order among equal dates, so the later bar wins below.
    bars.sort_by_key(|b| b.date);
    let mut out: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}
