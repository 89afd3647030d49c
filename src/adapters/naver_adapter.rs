//! Naver Finance chart adapter.
//!
//! The chart endpoint answers with XML whose `<item>` elements carry a
//! pipe-separated `data` attribute: `YYYYMMDD|open|high|low|close|volume`.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{Local, NaiveDate};
use std::time::Duration;
use tracing::debug;

const CHART_URL: &str = "https://fchart.stock.naver.com/sise.nhn";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub struct NaverChartAdapter {
    client: reqwest::blocking::Client,
}

impl NaverChartAdapter {
    pub fn new(timeout: Duration) -> Result<Self, ScreenerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(std::io::Error::other)?;
        Ok(Self { client })
    }
}

impl DataPort for NaverChartAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let fetch_err = |reason: String| ScreenerError::Fetch {
            code: code.to_string(),
            reason,
        };

        // Calendar days bound the number of sessions from above.
        let today = Local::now().date_naive();
        let count = ((today - start_date).num_days().max(1) + 1).to_string();

        debug!(code, count = %count, "requesting chart");
        let body = self
            .client
            .get(CHART_URL)
            .query(&[
                ("symbol", code),
                ("timeframe", "day"),
                ("count", count.as_str()),
                ("requestType", "0"),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| fetch_err(e.to_string()))?;

        let mut bars = parse_chart(&body).map_err(fetch_err)?;
        bars.retain(|b| b.date >= start_date);
        Ok(bars)
    }
}

/// Extracts every `data="..."` item from a chart response.
pub fn parse_chart(body: &str) -> Result<Vec<OhlcvBar>, String> {
    const MARKER: &str = "data=\"";

    let mut bars = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find(MARKER) {
        rest = &rest[start + MARKER.len()..];
        let end = rest
            .find('"')
            .ok_or_else(|| "unterminated data attribute".to_string())?;
        bars.push(parse_item(&rest[..end])?);
        rest = &rest[end + 1..];
    }
    Ok(bars)
}

fn parse_item(item: &str) -> Result<OhlcvBar, String> {
    let fields: Vec<&str> = item.split('|').map(str::trim).collect();
    let [date, open, high, low, close, volume] = fields.as_slice() else {
        return Err(format!("expected 6 fields in '{}'", item));
    };

    let price = |s: &str| {
        s.parse::<f64>()
            .map_err(|e| format!("invalid price '{}': {}", s, e))
    };

    Ok(OhlcvBar {
        date: NaiveDate::parse_from_str(date, "%Y%m%d")
            .map_err(|e| format!("invalid date '{}': {}", date, e))?,
        open: price(*open)?,
        high: price(*high)?,
        low: price(*low)?,
        close: price(*close)?,
        volume: volume
            .parse::<i64>()
            .map_err(|e| format!("invalid volume '{}': {}", volume, e))?,
    })
}
