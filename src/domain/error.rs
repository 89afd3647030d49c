//! Domain error types.

/// Top-level error type for cloudscreen.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to list instruments for {segment}: {reason}")]
    Listing { segment: String, reason: String },

    #[error("failed to fetch {code}: {reason}")]
    Fetch { code: String, reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("malformed series for {code}: {reason}")]
    MalformedSeries { code: String, reason: String },

    #[error("screening {code} panicked: {message}")]
    TaskPanicked { code: String, message: String },

    #[error("notification failed: {reason}")]
    Notify { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ScreenerError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::Listing { .. } => 3,
            ScreenerError::Fetch { .. }
            | ScreenerError::NoData { .. }
            | ScreenerError::MalformedSeries { .. }
            | ScreenerError::TaskPanicked { .. } => 5,
            ScreenerError::Notify { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
