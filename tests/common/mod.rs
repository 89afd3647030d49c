#![allow(dead_code)]

use chrono::NaiveDate;
use cloudscreen::domain::error::ScreenerError;
use cloudscreen::domain::instrument::Instrument;
pub use cloudscreen::domain::ohlcv::OhlcvBar;
use cloudscreen::ports::data_port::DataPort;
use cloudscreen::ports::listing_port::ListingPort;
use cloudscreen::ports::notify_port::NotifyPort;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        _start_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.errors.get(code) {
            return Err(ScreenerError::Fetch {
                code: code.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(code).cloned().unwrap_or_default())
    }
}

pub struct MockListingPort {
    pub segments: HashMap<String, Vec<Instrument>>,
}

impl MockListingPort {
    pub fn new() -> Self {
        Self {
            segments: HashMap::new(),
        }
    }

    pub fn with_segment(mut self, segment: &str, instruments: Vec<Instrument>) -> Self {
        self.segments.insert(segment.to_string(), instruments);
        self
    }
}

impl ListingPort for MockListingPort {
    fn list_instruments(&self, segment: &str) -> Result<Vec<Instrument>, ScreenerError> {
        self.segments
            .get(segment)
            .cloned()
            .ok_or_else(|| ScreenerError::Listing {
                segment: segment.to_string(),
                reason: "segment unavailable".to_string(),
            })
    }
}

/// Records every payload; fails when `fail` is set.
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn payloads(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotifyPort for RecordingNotifier {
    fn send(&self, payload: &str) -> Result<(), ScreenerError> {
        self.sent.lock().unwrap().push(payload.to_string());
        if self.fail {
            return Err(ScreenerError::Notify {
                reason: "webhook returned 500 Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Daily bars with high/low one unit around the close and a thin volume
/// profile that spikes every 30 bars.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start_date() + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: if i % 30 == 0 { 1_500_000 } else { 500_000 },
        })
        .collect()
}

/// Decline, flat base, small bounce: passes the strict below-cloud recipe.
pub fn below_cloud_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..=70).map(|i| 200.0 - 100.0 * i as f64 / 70.0).collect();
    closes.extend(std::iter::repeat_n(100.0, 15));
    closes.extend([101.0, 102.0, 103.0, 104.0]);
    closes
}

/// Plateau, crash and steady decline: passes the RSI-oversold recipe.
pub fn oversold_closes() -> Vec<f64> {
    let mut closes = vec![158.0; 50];
    closes.extend([80.0; 5]);
    closes.extend((0..15).map(|k| 120.0 - 0.4 * k as f64));
    closes
}

/// Flat series: never crosses, rejected by every recipe.
pub fn flat_closes(len: usize) -> Vec<f64> {
    vec![100.0; len]
}
