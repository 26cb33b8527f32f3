//! Price history port.

use crate::domain::error::ForestError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `ticker` with `start_date <= date <= end_date`, ascending.
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ForestError>;
}
