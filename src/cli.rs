//! CLI definition and dispatch.

use chrono::{Duration as DateDuration, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::csv_adapter::{CsvAdapter, CsvListingAdapter};
use crate::adapters::discord_webhook::DiscordWebhook;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::krx_listing_adapter::KrxListingAdapter;
use crate::adapters::naver_adapter::NaverChartAdapter;
use crate::domain::batch::{run_batch, BatchOptions, BatchOutcome};
use crate::domain::condition::{assess, Recipe};
use crate::domain::config_validation::{
    load_screen_config, validate_screen_config, DataSource, ListingSource, ScreenConfig,
};
use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::validate_series;
use crate::domain::report::render_report;
use crate::domain::snapshot::compute_snapshot;
use crate::domain::universe::{build_universe, parse_codes, restrict_to_codes};
use crate::ports::data_port::DataPort;
use crate::ports::listing_port::ListingPort;
use crate::ports::notify_port::NotifyPort;

pub const WEBHOOK_ENV_VAR: &str = "DISCORD_WEBHOOK_URL";

#[derive(Parser, Debug)]
#[command(
    name = "cloudscreen",
    about = "Daily Korean equity screener (volume regime, golden cross, Ichimoku cloud, RSI)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen the listed universe and report matches
    Screen {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        recipe: Option<String>,
        /// Read listings and series from CSV files in this directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        workers: Option<usize>,
        /// Comma-separated codes restricting the universe
        #[arg(long)]
        codes: Option<String>,
        #[arg(long)]
        webhook_url: Option<String>,
        #[arg(long)]
        no_notify: bool,
    },
    /// Show the latest indicators and verdict for one instrument
    Inspect {
        #[arg(long)]
        code: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        recipe: Option<String>,
    },
    /// List available recipes
    Recipes,
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ScreenOverrides {
    pub recipe: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub workers: Option<usize>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Screen {
            config,
            recipe,
            data_dir,
            workers,
            codes,
            webhook_url,
            no_notify,
        } => {
            let overrides = ScreenOverrides {
                recipe,
                data_dir,
                workers,
            };
            run_screen(
                config.as_ref(),
                &overrides,
                codes.as_deref(),
                webhook_url,
                no_notify,
            )
        }
        Command::Inspect {
            code,
            config,
            data_dir,
            recipe,
        } => {
            let overrides = ScreenOverrides {
                recipe,
                data_dir,
                workers: None,
            };
            run_inspect(&code, config.as_ref(), &overrides)
        }
        Command::Recipes => run_recipes(),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &ScreenerError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ScreenerError> {
    FileConfigAdapter::from_file(path).map_err(|e| ScreenerError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Loads the config file (or defaults), applies overrides and validates.
pub fn resolve_screen_config(
    config_path: Option<&PathBuf>,
    overrides: &ScreenOverrides,
) -> Result<ScreenConfig, ScreenerError> {
    let base = match config_path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            load_screen_config(&load_config(path)?)?
        }
        None => ScreenConfig::default(),
    };
    let config = apply_overrides(base, overrides)?;
    validate_screen_config(&config)?;
    Ok(config)
}

pub fn apply_overrides(
    mut config: ScreenConfig,
    overrides: &ScreenOverrides,
) -> Result<ScreenConfig, ScreenerError> {
    if let Some(name) = &overrides.recipe {
        config.recipe = name
            .parse::<Recipe>()
            .map_err(|e| ScreenerError::config_invalid("screener", "recipe", e.to_string()))?;
    }
    if let Some(workers) = overrides.workers {
        config.workers = workers;
    }
    if let Some(dir) = &overrides.data_dir {
        config.data.path = Some(dir.clone());
        config.data.source = DataSource::Csv;
        config.data.listing = ListingSource::Csv;
    }
    Ok(config)
}

/// First non-empty of: command line, config file, environment.
pub fn resolve_webhook_url(
    cli_value: Option<String>,
    config_value: Option<String>,
    env_value: Option<String>,
) -> Option<String> {
    [cli_value, config_value, env_value]
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

pub fn build_listing_port(config: &ScreenConfig) -> Result<Box<dyn ListingPort>, ScreenerError> {
    let timeout = Duration::from_secs(config.data.timeout_secs);
    match (config.data.listing, &config.data.path) {
        (ListingSource::Csv, Some(path)) => Ok(Box::new(CsvListingAdapter::new(path.clone()))),
        (ListingSource::Csv, None) => Err(ScreenerError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        }),
        (ListingSource::Krx, _) => Ok(Box::new(KrxListingAdapter::new(timeout)?)),
    }
}

pub fn build_data_port(config: &ScreenConfig) -> Result<Box<dyn DataPort>, ScreenerError> {
    let timeout = Duration::from_secs(config.data.timeout_secs);
    match (config.data.source, &config.data.path) {
        (DataSource::Csv, Some(path)) => Ok(Box::new(CsvAdapter::new(path.clone()))),
        (DataSource::Csv, None) => Err(ScreenerError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        }),
        (DataSource::Naver, _) => Ok(Box::new(NaverChartAdapter::new(timeout)?)),
    }
}

/// Wall-clock time in the configured report zone.
pub fn report_time(config: &ScreenConfig) -> Result<NaiveDateTime, ScreenerError> {
    let offset = i32::try_from(config.utc_offset_hours * 3600)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            ScreenerError::config_invalid("screener", "utc_offset_hours", "offset out of range")
        })?;
    Ok(Utc::now().with_timezone(&offset).naive_local())
}

pub fn history_start(
    config: &ScreenConfig,
    today: NaiveDate,
) -> Result<NaiveDate, ScreenerError> {
    DateDuration::try_days(config.history_days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or_else(|| {
            ScreenerError::config_invalid("screener", "history_days", "history start out of range")
        })
}

pub struct ScreenRun {
    pub outcome: BatchOutcome,
    pub report: String,
}

/// Universe construction, batch evaluation and report rendering.
///
/// Only a listing failure is returned as an error; per-instrument problems
/// end up in `outcome.skipped`.
pub fn run_screen_pipeline(
    listing: &dyn ListingPort,
    data: &dyn DataPort,
    config: &ScreenConfig,
    codes: Option<&[String]>,
    start_date: NaiveDate,
    timestamp: NaiveDateTime,
) -> Result<ScreenRun, ScreenerError> {
    let mut universe = build_universe(listing, &config.segments)?;
    if let Some(codes) = codes {
        universe = restrict_to_codes(universe, codes);
    }
    info!(
        recipe = %config.recipe,
        instruments = universe.len(),
        workers = config.workers,
        %start_date,
        "screening universe"
    );

    let options = BatchOptions {
        workers: config.workers,
        start_date,
    };
    let outcome = run_batch(
        &universe,
        data,
        config.recipe,
        &config.criteria,
        &options,
        |m| println!("✅ 조건 만족: {}", m.instrument),
    );

    let report = render_report(
        &outcome.matches,
        config.recipe,
        &config.criteria,
        timestamp,
        &config.tz_label,
    );
    Ok(ScreenRun { outcome, report })
}

/// Sends the report if a notifier is configured. Failures are logged only.
pub fn dispatch_report(notifier: Option<&dyn NotifyPort>, report: &str) {
    match notifier {
        Some(n) => {
            if let Err(e) = n.send(report) {
                warn!(error = %e, "failed to deliver report");
            }
        }
        None => warn!("no webhook URL configured; report printed to stdout only"),
    }
}

fn run_screen(
    config_path: Option<&PathBuf>,
    overrides: &ScreenOverrides,
    codes: Option<&str>,
    webhook_flag: Option<String>,
    no_notify: bool,
) -> ExitCode {
    let config = match resolve_screen_config(config_path, overrides) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let codes = match codes.map(parse_codes).transpose() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: invalid --codes: {e}");
            return ExitCode::from(2);
        }
    };

    let notify = !no_notify && config.notify.enabled;
    let webhook_url = if !notify {
        None
    } else {
        resolve_webhook_url(
            webhook_flag,
            config.notify.webhook_url.clone(),
            std::env::var(WEBHOOK_ENV_VAR).ok(),
        )
    };

    let ports = build_listing_port(&config).and_then(|l| Ok((l, build_data_port(&config)?)));
    let (listing, data) = match ports {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let timestamp = match report_time(&config) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let start_date = match history_start(&config, Local::now().date_naive()) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let run = match run_screen_pipeline(
        listing.as_ref(),
        data.as_ref(),
        &config,
        codes.as_deref(),
        start_date,
        timestamp,
    ) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    println!("\n{}", run.report);

    if !notify {
        info!("notification disabled");
        return ExitCode::SUCCESS;
    }
    let notifier = match webhook_url {
        Some(url) => {
            match DiscordWebhook::new(url, Duration::from_secs(config.notify.timeout_secs)) {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!(error = %e, "webhook client unavailable");
                    None
                }
            }
        }
        None => None,
    };
    dispatch_report(notifier.as_ref().map(|w| w as &dyn NotifyPort), &run.report);

    ExitCode::SUCCESS
}

fn run_inspect(code: &str, config_path: Option<&PathBuf>, overrides: &ScreenOverrides) -> ExitCode {
    let config = match resolve_screen_config(config_path, overrides) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let data = match build_data_port(&config) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let code = code.trim().to_uppercase();
    let start_date = match history_start(&config, Local::now().date_naive()) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let bars = match data.fetch_ohlcv(&code, start_date) {
        Ok(b) if b.is_empty() => return fail(&ScreenerError::NoData { code }),
        Ok(b) => b,
        Err(e) => return fail(&e),
    };
    if let Err(e) = validate_series(&code, &bars) {
        return fail(&e);
    }

    let first = bars.first().map(|b| b.date);
    let last = bars.last().map(|b| b.date);
    if let (Some(first), Some(last)) = (first, last) {
        println!("{code}: {} bars, {first} to {last}", bars.len());
    }
    print!("{}", compute_snapshot(&bars, &config.criteria));

    match assess(&bars, config.recipe, &config.criteria) {
        Ok(()) => println!("{}: match", config.recipe),
        Err(rejection) => println!("{}: rejected ({rejection})", config.recipe),
    }
    ExitCode::SUCCESS
}

fn run_recipes() -> ExitCode {
    for recipe in Recipe::ALL {
        println!(
            "{:<20} {} (needs {} bars)",
            recipe.name(),
            recipe.summary(),
            recipe.min_history()
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    match load_screen_config(&adapter) {
        Ok(config) => {
            println!(
                "{}: OK (recipe {}, segments {}, {} workers)",
                config_path.display(),
                config.recipe,
                config.segments.join(","),
                config.workers
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
