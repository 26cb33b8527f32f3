//! Yahoo Finance chart API adapter.
//!
//! Daily bars come from `/v8/finance/chart/{ticker}` with an explicit
//! `period1`/`period2` window. `period2` is exclusive on Yahoo's side, so
//! the request runs to the day after `end_date`.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::error::ForestError;
use crate::domain::ohlcv::{OhlcvBar, normalize_bars};
use crate::ports::data_port::DataPort;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

pub struct YahooAdapter {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl YahooAdapter {
    pub fn new() -> Result<Self, ForestError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ForestError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ForestError::Fetch {
                ticker: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn chart_url(&self, ticker: &str, start_date: NaiveDate, end_date: NaiveDate) -> String {
        format!(
            "{}/v8/finance/chart/{}?interval=1d&period1={}&period2={}",
            self.base_url,
            ticker,
            day_start_timestamp(start_date),
            day_start_timestamp(end_date.succ_opt().unwrap_or(end_date)),
        )
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

impl DataPort for YahooAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ForestError> {
        let url = self.chart_url(ticker, start_date, end_date);
        info!(ticker, %start_date, %end_date, "downloading from Yahoo Finance");
        debug!(%url);

        let fetch_err = |reason: String| ForestError::Fetch {
            ticker: ticker.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| fetch_err(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| fetch_err(format!("failed to read response: {e}")))?;

        // Yahoo reports unknown tickers as 404 with a chart.error body.
        if !status.is_success() && !body.contains("\"chart\"") {
            return Err(fetch_err(format!("HTTP {status}")));
        }

        let bars = parse_chart_response(ticker, &body)?;
        let bars: Vec<OhlcvBar> = bars
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect();

        if bars.is_empty() {
            return Err(ForestError::NoData {
                ticker: ticker.to_string(),
            });
        }

        info!(ticker, bars = bars.len(), "downloaded");
        Ok(bars)
    }
}

fn value(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

/// Decode a chart API body into bars in exchange-local dates. Rows with
/// any missing value are skipped.
pub fn parse_chart_response(ticker: &str, body: &str) -> Result<Vec<OhlcvBar>, ForestError> {
    let fetch_err = |reason: String| ForestError::Fetch {
        ticker: ticker.to_string(),
        reason,
    };

    let response: YahooResponse =
        serde_json::from_str(body).map_err(|e| fetch_err(format!("invalid response: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(fetch_err(format!(
            "Yahoo API error: {} - {}",
            error.code, error.description
        )));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(ForestError::NoData {
            ticker: ticker.to_string(),
        });
    };

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Err(ForestError::NoData {
            ticker: ticker.to_string(),
        });
    };

    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let fields = (
            value(&quote.open, i),
            value(&quote.high, i),
            value(&quote.low, i),
            value(&quote.close, i),
            value(&quote.volume, i),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = fields else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };

        bars.push(OhlcvBar {
            date,
            open,
            high,
            low,
            close,
            volume: volume.round() as i64,
        });
    }

    Ok(normalize_bars(bars))
}
