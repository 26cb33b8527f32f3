//! Domain error types.

/// Top-level error type for bandforest.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
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

    #[error("failed to fetch {ticker}: {reason}")]
    Fetch { ticker: String, reason: String },

    #[error("malformed cache file {path}: {reason}")]
    CacheFormat { path: String, reason: String },

    #[error("no data found for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data for {ticker}: have {rows} usable rows, need {minimum}")]
    InsufficientData {
        ticker: String,
        rows: usize,
        minimum: usize,
    },

    #[error("no test data for {ticker} on or after {split}")]
    NoTestData { ticker: String, split: String },

    #[error("model error: {reason}")]
    Model { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ForestError> for std::process::ExitCode {
    fn from(err: &ForestError) -> Self {
        let code: u8 = match err {
            ForestError::Io(_) => 1,
            ForestError::ConfigParse { .. }
            | ForestError::ConfigMissing { .. }
            | ForestError::ConfigInvalid { .. } => 2,
            ForestError::Fetch { .. } | ForestError::CacheFormat { .. } => 3,
            ForestError::Model { .. } => 4,
            ForestError::NoData { .. }
            | ForestError::InsufficientData { .. }
            | ForestError::NoTestData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
