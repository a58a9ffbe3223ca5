use std::path::PathBuf;

/// Errors that abort a chart run.
///
/// Degenerate analysis inputs (too few onsets, silence) are not errors; the
/// pipeline absorbs them with fallback constants.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Symphonia(#[from] symphonia::core::errors::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, ChartError>;
