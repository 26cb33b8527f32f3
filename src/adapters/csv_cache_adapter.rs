//! CSV price cache in front of another data source.
//!
//! One file per ticker and date range:
//! `<cache_dir>/<stem>_<start>_<end>.csv` with the header
//! `Date,Open,High,Low,Close,Volume`. Files are written to a temporary
//! name in the same directory and renamed into place, so an interrupted
//! write never leaves a partial file under the cache name.

use crate::domain::error::ForestError;
use crate::domain::ohlcv::{OhlcvBar, normalize_bars};
use crate::domain::ticker::file_stem;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CSV_HEADER: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

pub struct CsvCacheAdapter<D: DataPort> {
    cache_dir: PathBuf,
    upstream: D,
    offline: bool,
}

impl<D: DataPort> CsvCacheAdapter<D> {
    pub fn new(cache_dir: PathBuf, upstream: D) -> Self {
        Self {
            cache_dir,
            upstream,
            offline: false,
        }
    }

    /// Never call the upstream; a cache miss becomes `NoData`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn cache_path(&self, ticker: &str, start_date: NaiveDate, end_date: NaiveDate) -> PathBuf {
        self.cache_dir.join(format!(
            "{}_{}_{}.csv",
            file_stem(ticker),
            start_date.format("%Y-%m-%d"),
            end_date.format("%Y-%m-%d")
        ))
    }
}

impl<D: DataPort> DataPort for CsvCacheAdapter<D> {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ForestError> {
        let path = self.cache_path(ticker, start_date, end_date);

        if path.exists() {
            info!(ticker, path = %path.display(), "loading cached prices");
            let bars: Vec<OhlcvBar> = read_bars(&path)?
                .into_iter()
                .filter(|b| b.date >= start_date && b.date <= end_date)
                .collect();
            if bars.is_empty() {
                return Err(ForestError::NoData {
                    ticker: ticker.to_string(),
                });
            }
            return Ok(bars);
        }

        if self.offline {
            warn!(ticker, path = %path.display(), "offline and not cached");
            return Err(ForestError::NoData {
                ticker: ticker.to_string(),
            });
        }

        let bars = normalize_bars(self.upstream.fetch_ohlcv(ticker, start_date, end_date)?);
        if bars.is_empty() {
            return Err(ForestError::NoData {
                ticker: ticker.to_string(),
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_bars(&path, &bars)?;
        info!(ticker, bars = bars.len(), path = %path.display(), "cached prices");

        Ok(bars)
    }
}

fn format_err(path: &Path, reason: impl std::fmt::Display) -> ForestError {
    ForestError::CacheFormat {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    path: &Path,
) -> Result<T, ForestError>
where
    T::Err: std::fmt::Display,
{
    let name = CSV_HEADER[index];
    let raw = record
        .get(index)
        .ok_or_else(|| format_err(path, format!("missing {name} column")))?;
    raw.trim()
        .parse()
        .map_err(|e| format_err(path, format!("invalid {name} value {raw:?}: {e}")))
}

/// Read a cache file, sorted ascending with duplicate dates removed.
pub fn read_bars(path: &Path) -> Result<Vec<OhlcvBar>, ForestError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| format_err(path, e))?;
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| format_err(path, e))?;
        let date_str = record
            .get(0)
            .ok_or_else(|| format_err(path, "missing Date column"))?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .map_err(|e| format_err(path, format!("invalid date {date_str:?}: {e}")))?;

        bars.push(OhlcvBar {
            date,
            open: field(&record, 1, path)?,
            high: field(&record, 2, path)?,
            low: field(&record, 3, path)?,
            close: field(&record, 4, path)?,
            volume: field::<f64>(&record, 5, path)?.round() as i64,
        });
    }

    Ok(normalize_bars(bars))
}

/// Write a cache file atomically: rows go to a temporary file next to
/// `path`, which replaces `path` only once complete.
pub fn write_bars(path: &Path, bars: &[OhlcvBar]) -> Result<(), ForestError> {
    let io_err = |e: csv::Error| ForestError::Io(std::io::Error::other(e));
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".partial-")
        .suffix(".csv.tmp")
        .tempfile_in(dir)?;

    let mut wtr = csv::Writer::from_writer(tmp);
    wtr.write_record(CSV_HEADER).map_err(io_err)?;
    for bar in bars {
        wtr.write_record([
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])
        .map_err(io_err)?;
    }
    let tmp = wtr.into_inner().map_err(|e| e.into_error())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
