//! Instrument listing port trait.

use crate::domain::error::ScreenerError;
use crate::domain::instrument::Instrument;

pub trait ListingPort {
    /// All instruments listed on a market segment (e.g. `KOSPI`).
    fn list_instruments(&self, segment: &str) -> Result<Vec<Instrument>, ScreenerError>;
}
