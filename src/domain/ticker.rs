//! Ticker list parsing and file naming.

use std::collections::HashSet;

use super::error::ForestError;

/// Parse a comma-separated ticker list. Tickers are trimmed and uppercased;
/// empty entries and duplicates are rejected.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, ForestError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty ticker in list"));
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(invalid(&format!("duplicate ticker {}", ticker)));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

fn invalid(reason: &str) -> ForestError {
    ForestError::ConfigInvalid {
        section: "backtest".to_string(),
        key: "tickers".to_string(),
        reason: reason.to_string(),
    }
}

/// File-name-safe form of a ticker: `^` dropped, `.` replaced by `_`.
pub fn file_stem(ticker: &str) -> String {
    ticker.replace('^', "").replace('.', "_")
}
