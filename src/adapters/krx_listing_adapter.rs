//! KRX market data listing adapter.

use crate::domain::error::ScreenerError;
use crate::domain::instrument::Instrument;
use crate::ports::listing_port::ListingPort;
use serde::Deserialize;
use std::time::Duration;

const LISTING_URL: &str = "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd";
const LISTING_BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT01901";
const REFERER: &str = "http://data.krx.co.kr/contents/MDC/MDI/mdiLoader";

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(rename = "OutBlock_1")]
    out_block: Vec<ListingEntry>,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    #[serde(rename = "ISU_SRT_CD")]
    short_code: String,
    #[serde(rename = "ISU_ABBRV")]
    abbreviation: String,
}

/// KRX market id for a segment name.
pub fn market_id(segment: &str) -> Option<&'static str> {
    match segment.to_uppercase().as_str() {
        "KOSPI" => Some("STK"),
        "KOSDAQ" => Some("KSQ"),
        "KONEX" => Some("KNX"),
        _ => None,
    }
}

pub fn parse_listing(body: &str) -> Result<Vec<Instrument>, serde_json::Error> {
    let response: ListingResponse = serde_json::from_str(body)?;
    Ok(response
        .out_block
        .into_iter()
        .map(|e| Instrument::new(e.short_code.trim(), e.abbreviation.trim()))
        .collect())
}

pub struct KrxListingAdapter {
    client: reqwest::blocking::Client,
}

impl KrxListingAdapter {
    pub fn new(timeout: Duration) -> Result<Self, ScreenerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(std::io::Error::other)?;
        Ok(Self { client })
    }
}

impl ListingPort for KrxListingAdapter {
    fn list_instruments(&self, segment: &str) -> Result<Vec<Instrument>, ScreenerError> {
        let listing_err = |reason: String| ScreenerError::Listing {
            segment: segment.to_string(),
            reason,
        };

        let mkt_id = market_id(segment)
            .ok_or_else(|| listing_err(format!("unknown market segment '{}'", segment)))?;

        let body = self
            .client
            .post(LISTING_URL)
            .header(reqwest::header::REFERER, REFERER)
            .form(&[
                ("bld", LISTING_BLD),
                ("mktId", mkt_id),
                ("share", "1"),
                ("csvxls_isNo", "false"),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| listing_err(e.to_string()))?;

        parse_listing(&body).map_err(|e| listing_err(format!("unexpected response: {}", e)))
    }
}
