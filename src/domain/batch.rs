//! Batch runner: evaluates a recipe over an instrument universe on a
//! bounded worker pool.
//!
//! Each instrument is an independent task. Fetch failures, malformed series,
//! evaluator rejections and panics inside a task are folded into
//! `InstrumentOutcome::Skipped` so one bad instrument never aborts the run.

use crate::domain::condition::{assess, Recipe, Rejection, ScreenCriteria};
use crate::domain::error::ScreenerError;
use crate::domain::instrument::{Instrument, Match};
use crate::domain::ohlcv::validate_series;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info, warn};

pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub workers: usize,
    /// First date requested from the data port.
    pub start_date: NaiveDate,
}

#[derive(Debug)]
pub enum SkipReason {
    /// Fetch failed, returned nothing, or the series was malformed.
    Failed(ScreenerError),
    /// Data was fine but a predicate did not hold.
    Rejected(Rejection),
}

#[derive(Debug)]
pub enum InstrumentOutcome {
    Matched(Match),
    Skipped(SkipReason),
}

#[derive(Debug)]
pub struct SkippedInstrument {
    pub instrument: Instrument,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Sorted by code.
    pub matches: Vec<Match>,
    pub skipped: Vec<SkippedInstrument>,
}

impl BatchOutcome {
    pub fn rejected_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::Rejected(_)))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::Failed(_)))
            .count()
    }
}

/// Fetches, validates and evaluates a single instrument.
pub fn screen_instrument(
    instrument: &Instrument,
    data_port: &dyn DataPort,
    recipe: Recipe,
    criteria: &ScreenCriteria,
    start_date: NaiveDate,
) -> InstrumentOutcome {
    let bars = match data_port.fetch_ohlcv(&instrument.code, start_date) {
        Ok(bars) => bars,
        Err(e) => return InstrumentOutcome::Skipped(SkipReason::Failed(e)),
    };
    if bars.is_empty() {
        return InstrumentOutcome::Skipped(SkipReason::Failed(ScreenerError::NoData {
            code: instrument.code.clone(),
        }));
    }
    if let Err(e) = validate_series(&instrument.code, &bars) {
        return InstrumentOutcome::Skipped(SkipReason::Failed(e));
    }

    match assess(&bars, recipe, criteria) {
        Ok(()) => {
            let close = bars.last().map(|b| b.close).unwrap_or_default();
            InstrumentOutcome::Matched(Match {
                instrument: instrument.clone(),
                close,
            })
        }
        Err(rejection) => InstrumentOutcome::Skipped(SkipReason::Rejected(rejection)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Screens every instrument and collects the results on the calling thread.
///
/// `on_match` runs on the worker that found the match, as soon as it is found.
/// The returned matches are sorted by code, so the outcome does not depend on
/// scheduling.
pub fn run_batch<F>(
    instruments: &[Instrument],
    data_port: &dyn DataPort,
    recipe: Recipe,
    criteria: &ScreenCriteria,
    options: &BatchOptions,
    on_match: F,
) -> BatchOutcome
where
    F: Fn(&Match) + Sync,
{
    let task = |instrument: &Instrument| {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            screen_instrument(instrument, data_port, recipe, criteria, options.start_date)
        }))
        .unwrap_or_else(|payload| {
            InstrumentOutcome::Skipped(SkipReason::Failed(ScreenerError::TaskPanicked {
                code: instrument.code.clone(),
                message: panic_message(payload.as_ref()),
            }))
        });
        if let InstrumentOutcome::Matched(m) = &outcome {
            on_match(m);
        }
        (instrument.clone(), outcome)
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build();

    let results: Vec<(Instrument, InstrumentOutcome)> = match pool {
        Ok(pool) => pool.install(|| instruments.par_iter().map(task).collect()),
        Err(e) => {
            warn!(error = %e, "worker pool unavailable, screening sequentially");
            instruments.iter().map(task).collect()
        }
    };

    let mut outcome = BatchOutcome::default();
    for (instrument, result) in results {
        match result {
            InstrumentOutcome::Matched(m) => outcome.matches.push(m),
            InstrumentOutcome::Skipped(reason) => {
                match &reason {
                    SkipReason::Failed(e) => {
                        warn!(code = %instrument.code, error = %e, "skipping instrument")
                    }
                    SkipReason::Rejected(r) => {
                        debug!(code = %instrument.code, reason = %r, "rejected")
                    }
                }
                outcome.skipped.push(SkippedInstrument { instrument, reason });
            }
        }
    }

    outcome
        .matches
        .sort_by(|a, b| a.instrument.code.cmp(&b.instrument.code));
    outcome
        .skipped
        .sort_by(|a, b| a.instrument.code.cmp(&b.instrument.code));

    info!(
        recipe = %recipe,
        total = instruments.len(),
        matched = outcome.matches.len(),
        rejected = outcome.rejected_count(),
        failed = outcome.failed_count(),
        "screening complete"
    );

    outcome
}
