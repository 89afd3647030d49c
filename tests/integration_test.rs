//! Integration tests for the screening pipeline.
//!
//! Tests cover:
//! - Batch isolation: a failing fetch skips only that instrument
//! - Empty universe still yields a "no matches" report
//! - Determinism across worker counts and input order
//! - Recipe selection over the same universe
//! - Report delivery through a notifier, including delivery failure

mod common;

use chrono::NaiveDate;
use common::*;
use cloudscreen::cli::{dispatch_report, run_screen_pipeline};
use cloudscreen::domain::batch::{run_batch, BatchOptions, SkipReason};
use cloudscreen::domain::condition::{Recipe, Rejection, ScreenCriteria};
use cloudscreen::domain::config_validation::ScreenConfig;
use cloudscreen::domain::error::ScreenerError;
use cloudscreen::domain::instrument::Instrument;
use cloudscreen::domain::report::{render_report, NO_MATCHES};
use std::sync::Mutex;

fn timestamp() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, 1)
        .unwrap()
        .and_hms_opt(15, 40, 0)
        .unwrap()
}

fn options(workers: usize) -> BatchOptions {
    BatchOptions {
        workers,
        start_date: start_date(),
    }
}

fn three_instruments() -> Vec<Instrument> {
    vec![
        Instrument::new("000001", "첫째"),
        Instrument::new("000002", "둘째"),
        Instrument::new("000003", "셋째"),
    ]
}

mod batch_isolation {
    use super::*;

    #[test]
    fn failing_fetch_skips_only_that_instrument() {
        let port = MockDataPort::new()
            .with_bars("000001", bars_from_closes(&oversold_closes()))
            .with_error("000002", "connection reset")
            .with_bars("000003", bars_from_closes(&oversold_closes()));

        let outcome = run_batch(
            &three_instruments(),
            &port,
            Recipe::RsiOversold,
            &ScreenCriteria::default(),
            &options(3),
            |_| {},
        );

        let codes: Vec<&str> = outcome
            .matches
            .iter()
            .map(|m| m.instrument.code.as_str())
            .collect();
        assert_eq!(codes, vec!["000001", "000003"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].instrument.code, "000002");
        assert!(matches!(
            &outcome.skipped[0].reason,
            SkipReason::Failed(ScreenerError::Fetch { reason, .. }) if reason == "connection reset"
        ));
        assert_eq!(port.call_count(), 3);
    }

    #[test]
    fn short_history_is_a_rejection_not_a_failure() {
        let port = MockDataPort::new()
            .with_bars("000001", bars_from_closes(&oversold_closes()[..40]));

        let outcome = run_batch(
            &three_instruments()[..1],
            &port,
            Recipe::RsiOversold,
            &ScreenCriteria::default(),
            &options(1),
            |_| {},
        );

        assert!(outcome.matches.is_empty());
        assert!(matches!(
            outcome.skipped[0].reason,
            SkipReason::Rejected(Rejection::InsufficientHistory {
                bars: 40,
                minimum: 60
            })
        ));
    }

    #[test]
    fn missing_series_is_no_data() {
        let port = MockDataPort::new();
        let outcome = run_batch(
            &three_instruments(),
            &port,
            Recipe::StrictBelowCloud,
            &ScreenCriteria::default(),
            &options(2),
            |_| {},
        );
        assert_eq!(outcome.failed_count(), 3);
        assert!(outcome
            .skipped
            .iter()
            .all(|s| matches!(s.reason, SkipReason::Failed(ScreenerError::NoData { .. }))));
    }

    #[test]
    fn announcements_match_final_result() {
        let port = MockDataPort::new()
            .with_bars("000001", bars_from_closes(&oversold_closes()))
            .with_bars("000002", bars_from_closes(&flat_closes(70)))
            .with_bars("000003", bars_from_closes(&oversold_closes()));
        let announced = Mutex::new(Vec::new());

        let outcome = run_batch(
            &three_instruments(),
            &port,
            Recipe::RsiOversold,
            &ScreenCriteria::default(),
            &options(4),
            |m| announced.lock().unwrap().push(m.instrument.code.clone()),
        );

        let mut announced = announced.into_inner().unwrap();
        announced.sort();
        let matched: Vec<String> = outcome
            .matches
            .iter()
            .map(|m| m.instrument.code.clone())
            .collect();
        assert_eq!(announced, matched);
        assert_eq!(outcome.rejected_count(), 1);
    }
}

mod determinism {
    use super::*;

    fn port() -> MockDataPort {
        MockDataPort::new()
            .with_bars("000001", bars_from_closes(&below_cloud_closes()))
            .with_bars("000002", bars_from_closes(&oversold_closes()))
            .with_bars("000003", bars_from_closes(&below_cloud_closes()))
    }

    #[test]
    fn same_input_same_outcome_any_worker_count() {
        let port = port();
        let criteria = ScreenCriteria::default();
        let baseline = run_batch(
            &three_instruments(),
            &port,
            Recipe::StrictBelowCloud,
            &criteria,
            &options(1),
            |_| {},
        );
        for workers in [2, 3, 10, 32] {
            let again = run_batch(
                &three_instruments(),
                &port,
                Recipe::StrictBelowCloud,
                &criteria,
                &options(workers),
                |_| {},
            );
            assert_eq!(again.matches, baseline.matches, "workers = {}", workers);
        }
    }

    #[test]
    fn input_order_does_not_matter() {
        let port = port();
        let mut reversed = three_instruments();
        reversed.reverse();
        let criteria = ScreenCriteria::default();

        let forward = run_batch(
            &three_instruments(),
            &port,
            Recipe::StrictBelowCloud,
            &criteria,
            &options(4),
            |_| {},
        );
        let backward = run_batch(&reversed, &port, Recipe::StrictBelowCloud, &criteria, &options(4), |_| {});
        assert_eq!(forward.matches, backward.matches);
    }

    #[test]
    fn recipe_selects_different_matches() {
        let port = port();
        let criteria = ScreenCriteria::default();
        let codes = |recipe| {
            run_batch(&three_instruments(), &port, recipe, &criteria, &options(2), |_| {})
                .matches
                .into_iter()
                .map(|m| m.instrument.code)
                .collect::<Vec<_>>()
        };

        assert_eq!(codes(Recipe::StrictBelowCloud), vec!["000001", "000003"]);
        assert_eq!(codes(Recipe::RsiOversold), vec!["000002"]);
    }
}

mod pipeline {
    use super::*;

    fn config() -> ScreenConfig {
        ScreenConfig {
            recipe: Recipe::RsiOversold,
            workers: 2,
            segments: vec!["KOSPI".to_string(), "KOSDAQ".to_string()],
            ..ScreenConfig::default()
        }
    }

    fn listing() -> MockListingPort {
        MockListingPort::new()
            .with_segment(
                "KOSPI",
                vec![
                    Instrument::new("000001", "첫째"),
                    Instrument::new("000002", "둘째"),
                ],
            )
            .with_segment("KOSDAQ", vec![Instrument::new("000003", "셋째")])
    }

    #[test]
    fn empty_universe_reports_no_matches() {
        let listing = MockListingPort::new()
            .with_segment("KOSPI", vec![])
            .with_segment("KOSDAQ", vec![]);
        let data = MockDataPort::new();

        let run = run_screen_pipeline(&listing, &data, &config(), None, start_date(), timestamp())
            .unwrap();

        assert!(run.outcome.matches.is_empty());
        assert!(run.report.contains(NO_MATCHES));
        assert!(run.report.ends_with("2024-04-01 15:40:00 (KST)"));
        assert_eq!(data.call_count(), 0);
    }

    #[test]
    fn listing_failure_aborts() {
        let listing = MockListingPort::new().with_segment("KOSPI", vec![]);
        let data = MockDataPort::new();

        let err = run_screen_pipeline(&listing, &data, &config(), None, start_date(), timestamp())
            .err()
            .unwrap();
        assert!(matches!(err, ScreenerError::Listing { segment, .. } if segment == "KOSDAQ"));
    }

    #[test]
    fn report_lists_matches_across_segments() {
        let data = MockDataPort::new()
            .with_bars("000001", bars_from_closes(&oversold_closes()))
            .with_error("000002", "timeout")
            .with_bars("000003", bars_from_closes(&oversold_closes()));

        let run = run_screen_pipeline(&listing(), &data, &config(), None, start_date(), timestamp())
            .unwrap();

        assert_eq!(run.outcome.matches.len(), 2);
        assert!(run.report.contains("(2개)"));
        assert!(run.report.contains("• 셋째 (000003) - 114원"));
        assert!(run.report.contains("• 첫째 (000001) - 114원"));
        assert!(!run.report.contains("000002"));
    }

    #[test]
    fn code_filter_restricts_universe() {
        let data = MockDataPort::new()
            .with_bars("000001", bars_from_closes(&oversold_closes()))
            .with_bars("000003", bars_from_closes(&oversold_closes()));
        let codes = vec!["000003".to_string()];

        let run = run_screen_pipeline(
            &listing(),
            &data,
            &config(),
            Some(&codes),
            start_date(),
            timestamp(),
        )
        .unwrap();

        assert_eq!(data.call_count(), 1);
        assert_eq!(run.outcome.matches.len(), 1);
        assert_eq!(run.outcome.matches[0].instrument.code, "000003");
    }

    #[test]
    fn dispatch_sends_rendered_report() {
        let notifier = RecordingNotifier::new();
        let report = render_report(
            &[],
            Recipe::StrictBelowCloud,
            &ScreenCriteria::default(),
            timestamp(),
            "KST",
        );

        dispatch_report(Some(&notifier), &report);
        assert_eq!(notifier.payloads(), vec![report]);
    }

    #[test]
    fn dispatch_failure_does_not_panic() {
        let notifier = RecordingNotifier::failing();
        dispatch_report(Some(&notifier), "payload");
        assert_eq!(notifier.payloads().len(), 1);
    }

    #[test]
    fn dispatch_without_notifier_is_noop() {
        dispatch_report(None, "payload");
    }
}
