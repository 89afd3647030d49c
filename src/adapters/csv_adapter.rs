//! CSV file adapters for offline listings and daily series.
//!
//! Layout under the base directory:
//! - `listing_{SEGMENT}.csv` with header `code,name`
//! - `{code}.csv` with header `date,open,high,low,close,volume`

use crate::domain::error::ScreenerError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use crate::ports::listing_port::ListingPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct SeriesRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    code: String,
    name: String,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let fetch_err = |reason: String| ScreenerError::Fetch {
            code: code.to_string(),
            reason,
        };

        let path = self.csv_path(code);
        let content = fs::read_to_string(&path)
            .map_err(|e| fetch_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.deserialize::<SeriesRow>() {
            let row = result.map_err(|e| fetch_err(format!("CSV parse error: {}", e)))?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
                .map_err(|e| fetch_err(format!("invalid date '{}': {}", row.date, e)))?;

            if date < start_date {
                continue;
            }
            if !(row.volume.is_finite() && row.volume.fract() == 0.0) {
                return Err(fetch_err(format!(
                    "invalid volume {} on {}",
                    row.volume, row.date
                )));
            }

            bars.push(OhlcvBar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume as i64,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

pub struct CsvListingAdapter {
    base_path: PathBuf,
}

impl CsvListingAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn listing_path(&self, segment: &str) -> PathBuf {
        self.base_path
            .join(format!("listing_{}.csv", segment.to_uppercase()))
    }
}

impl ListingPort for CsvListingAdapter {
    fn list_instruments(&self, segment: &str) -> Result<Vec<Instrument>, ScreenerError> {
        let listing_err = |reason: String| ScreenerError::Listing {
            segment: segment.to_string(),
            reason,
        };

        let path = self.listing_path(segment);
        let content = fs::read_to_string(&path)
            .map_err(|e| listing_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        rdr.deserialize::<ListingRow>()
            .map(|result| {
                result
                    .map(|row| Instrument::new(row.code, row.name))
                    .map_err(|e| listing_err(format!("CSV parse error: {}", e)))
            })
            .collect()
    }
}
