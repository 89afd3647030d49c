//! Screen configuration: loading from a `ConfigPort` and validation.
//!
//! Every key is optional. Missing keys take the defaults below; present keys
//! must parse and pass validation before a run starts.

use crate::domain::batch::DEFAULT_WORKERS;
use crate::domain::condition::{Recipe, ScreenCriteria};
use crate::domain::error::ScreenerError;
use crate::domain::universe::{parse_segments, DEFAULT_SEGMENTS};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_HISTORY_DAYS: i64 = 120;
pub const MAX_HISTORY_DAYS: i64 = 36_500;
pub const DEFAULT_UTC_OFFSET_HOURS: i64 = 9;
pub const DEFAULT_TZ_LABEL: &str = "KST";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Naver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    Csv,
    Krx,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub source: DataSource,
    pub listing: ListingSource,
    /// Directory holding the CSV listing and series files.
    pub path: Option<PathBuf>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotifySettings {
    /// `false` keeps the report on stdout only.
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub recipe: Recipe,
    pub workers: usize,
    pub history_days: i64,
    pub segments: Vec<String>,
    pub utc_offset_hours: i64,
    pub tz_label: String,
    pub criteria: ScreenCriteria,
    pub data: DataSettings,
    pub notify: NotifySettings,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            recipe: Recipe::StrictBelowCloud,
            workers: DEFAULT_WORKERS,
            history_days: DEFAULT_HISTORY_DAYS,
            segments: DEFAULT_SEGMENTS.iter().map(|s| s.to_string()).collect(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            tz_label: DEFAULT_TZ_LABEL.to_string(),
            criteria: ScreenCriteria::default(),
            data: DataSettings {
                source: DataSource::Naver,
                listing: ListingSource::Krx,
                path: None,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            notify: NotifySettings {
                enabled: true,
                webhook_url: None,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
        }
    }
}

/// Reads and validates the full screen configuration.
pub fn load_screen_config(config: &dyn ConfigPort) -> Result<ScreenConfig, ScreenerError> {
    let defaults = ScreenConfig::default();

    let recipe = match non_empty(config, "screener", "recipe") {
        Some(name) => name
            .parse::<Recipe>()
            .map_err(|e| ScreenerError::config_invalid("screener", "recipe", e.to_string()))?,
        None => defaults.recipe,
    };

    let segments = match non_empty(config, "screener", "segments") {
        Some(list) => parse_segments(&list)
            .map_err(|e| ScreenerError::config_invalid("screener", "segments", e.to_string()))?,
        None => defaults.segments,
    };

    let screen = ScreenConfig {
        recipe,
        workers: get_count(config, "screener", "workers", defaults.workers)?,
        history_days: config.get_int("screener", "history_days", defaults.history_days),
        segments,
        utc_offset_hours: config.get_int(
            "screener",
            "utc_offset_hours",
            defaults.utc_offset_hours,
        ),
        tz_label: non_empty(config, "screener", "tz_label").unwrap_or(defaults.tz_label),
        criteria: load_criteria(config, &defaults.criteria)?,
        data: load_data_settings(config, &defaults.data)?,
        notify: NotifySettings {
            enabled: config.get_bool("notify", "enabled", defaults.notify.enabled),
            webhook_url: non_empty(config, "notify", "webhook_url"),
            timeout_secs: get_count(
                config,
                "notify",
                "timeout_secs",
                defaults.notify.timeout_secs as usize,
            )? as u64,
        },
    };

    validate_screen_config(&screen)?;
    Ok(screen)
}

fn load_criteria(
    config: &dyn ConfigPort,
    defaults: &ScreenCriteria,
) -> Result<ScreenCriteria, ScreenerError> {
    Ok(ScreenCriteria {
        volume_lookback: get_count(config, "criteria", "volume_lookback", defaults.volume_lookback)?,
        volume_threshold: config.get_double(
            "criteria",
            "volume_threshold",
            defaults.volume_threshold,
        ),
        ma_short: get_count(config, "criteria", "ma_short", defaults.ma_short)?,
        ma_long: get_count(config, "criteria", "ma_long", defaults.ma_long)?,
        cross_window: get_count(config, "criteria", "cross_window", defaults.cross_window)?,
        rsi_period: get_count(config, "criteria", "rsi_period", defaults.rsi_period)?,
        rsi_threshold: config.get_double("criteria", "rsi_threshold", defaults.rsi_threshold),
        cloud_tolerance: config.get_double(
            "criteria",
            "cloud_tolerance",
            defaults.cloud_tolerance,
        ),
    })
}

fn load_data_settings(
    config: &dyn ConfigPort,
    defaults: &DataSettings,
) -> Result<DataSettings, ScreenerError> {
    let source = match non_empty(config, "data", "source") {
        Some(s) => match s.to_lowercase().as_str() {
            "csv" => DataSource::Csv,
            "naver" => DataSource::Naver,
            other => {
                return Err(ScreenerError::config_invalid(
                    "data",
                    "source",
                    format!("unknown data source '{}' (expected csv or naver)", other),
                ))
            }
        },
        None => defaults.source,
    };

    let listing = match non_empty(config, "data", "listing") {
        Some(s) => match s.to_lowercase().as_str() {
            "csv" => ListingSource::Csv,
            "krx" => ListingSource::Krx,
            other => {
                return Err(ScreenerError::config_invalid(
                    "data",
                    "listing",
                    format!("unknown listing source '{}' (expected csv or krx)", other),
                ))
            }
        },
        None => defaults.listing,
    };

    Ok(DataSettings {
        source,
        listing,
        path: non_empty(config, "data", "path").map(PathBuf::from),
        timeout_secs: get_count(
            config,
            "data",
            "timeout_secs",
            defaults.timeout_secs as usize,
        )? as u64,
    })
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Non-negative integer key; negative values are rejected here, zero by
/// `validate_screen_config`.
fn get_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ScreenerError> {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value)
        .map_err(|_| ScreenerError::config_invalid(section, key, format!("{} must be non-negative", key)))
}

/// Checks the cross-field constraints of a (possibly CLI-overridden) config.
pub fn validate_screen_config(config: &ScreenConfig) -> Result<(), ScreenerError> {
    if config.workers < 1 {
        return Err(ScreenerError::config_invalid(
            "screener",
            "workers",
            "workers must be at least 1",
        ));
    }
    if !(1..=MAX_HISTORY_DAYS).contains(&config.history_days) {
        return Err(ScreenerError::config_invalid(
            "screener",
            "history_days",
            format!("history_days must be between 1 and {}", MAX_HISTORY_DAYS),
        ));
    }
    if config.segments.is_empty() {
        return Err(ScreenerError::ConfigMissing {
            section: "screener".to_string(),
            key: "segments".to_string(),
        });
    }
    if !(-12..=14).contains(&config.utc_offset_hours) {
        return Err(ScreenerError::config_invalid(
            "screener",
            "utc_offset_hours",
            "utc_offset_hours must be between -12 and 14",
        ));
    }

    validate_criteria(&config.criteria)?;

    if config.data.timeout_secs < 1 {
        return Err(ScreenerError::config_invalid(
            "data",
            "timeout_secs",
            "timeout_secs must be at least 1",
        ));
    }
    if config.notify.timeout_secs < 1 {
        return Err(ScreenerError::config_invalid(
            "notify",
            "timeout_secs",
            "timeout_secs must be at least 1",
        ));
    }
    let needs_path =
        config.data.source == DataSource::Csv || config.data.listing == ListingSource::Csv;
    if needs_path && config.data.path.is_none() {
        return Err(ScreenerError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        });
    }
    Ok(())
}

fn validate_criteria(criteria: &ScreenCriteria) -> Result<(), ScreenerError> {
    let periods = [
        ("volume_lookback", criteria.volume_lookback),
        ("ma_short", criteria.ma_short),
        ("ma_long", criteria.ma_long),
        ("rsi_period", criteria.rsi_period),
    ];
    for (key, value) in periods {
        if value < 1 {
            return Err(ScreenerError::config_invalid(
                "criteria",
                key,
                format!("{} must be at least 1", key),
            ));
        }
    }
    if criteria.ma_short >= criteria.ma_long {
        return Err(ScreenerError::config_invalid(
            "criteria",
            "ma_short",
            "ma_short must be less than ma_long",
        ));
    }
    if criteria.cross_window < 2 {
        return Err(ScreenerError::config_invalid(
            "criteria",
            "cross_window",
            "cross_window must be at least 2",
        ));
    }
    if criteria.volume_threshold <= 0.0 {
        return Err(ScreenerError::config_invalid(
            "criteria",
            "volume_threshold",
            "volume_threshold must be positive",
        ));
    }
    if criteria.rsi_threshold <= 0.0 || criteria.rsi_threshold > 100.0 {
        return Err(ScreenerError::config_invalid(
            "criteria",
            "rsi_threshold",
            "rsi_threshold must be in (0, 100]",
        ));
    }
    if criteria.cloud_tolerance <= 0.0 || criteria.cloud_tolerance > 1.0 {
        return Err(ScreenerError::config_invalid(
            "criteria",
            "cloud_tolerance",
            "cloud_tolerance must be in (0, 1]",
        ));
    }
    Ok(())
}
