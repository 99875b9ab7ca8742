use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Document-level failures. Per-record problems never reach this type;
/// they are logged and the offending record is skipped.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// True for the "no document available" class of failures.
    pub fn is_fetch(&self) -> bool {
        matches!(self, ScrapeError::Fetch { .. } | ScrapeError::Status { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, ScrapeError::Parse(_))
    }
}
