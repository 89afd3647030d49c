//! Historical data access port trait.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Source of daily OHLCV history. Shared across worker threads.
pub trait DataPort: Send + Sync {
    /// Bars for `code` from `start_date` up to the most recent session,
    /// ascending by date.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError>;
}
