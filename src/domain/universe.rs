//! Universe construction: instrument listings per market segment, optionally
//! restricted to an explicit code list.

use crate::domain::error::ScreenerError;
use crate::domain::instrument::Instrument;
use crate::ports::listing_port::ListingPort;
use std::collections::HashSet;
use tracing::info;

pub const DEFAULT_SEGMENTS: [&str; 2] = ["KOSPI", "KOSDAQ"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Segment names from a comma list such as `KOSPI, kosdaq`.
pub fn parse_segments(input: &str) -> Result<Vec<String>, UniverseError> {
    parse_codes(input)
}

/// Concatenates the listings of every segment in order. Duplicates across
/// segments are kept. Any listing failure aborts.
pub fn build_universe(
    listing: &dyn ListingPort,
    segments: &[String],
) -> Result<Vec<Instrument>, ScreenerError> {
    let mut instruments = Vec::new();
    for segment in segments {
        let listed = listing.list_instruments(segment)?;
        info!(segment = %segment, count = listed.len(), "listed instruments");
        instruments.extend(listed);
    }
    Ok(instruments)
}

/// Keeps the instruments whose code is in `codes`, preserving universe order.
pub fn restrict_to_codes(instruments: Vec<Instrument>, codes: &[String]) -> Vec<Instrument> {
    let wanted: HashSet<&str> = codes.iter().map(String::as_str).collect();
    instruments
        .into_iter()
        .filter(|i| wanted.contains(i.code.to_uppercase().as_str()))
        .collect()
}
