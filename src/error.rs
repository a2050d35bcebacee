//! Typed errors raised at the crate's collaborator seams.
//!
//! The pipeline stages themselves never fail: problems inside a stage are
//! logged and the affected values become `None`.

/// Failure of the name knowledge base.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("name knowledge base unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read name knowledge base: {0}")]
    Read(#[from] csv::Error),

    #[error("name knowledge base I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a remote weather or geocoding request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid request URL {url}: {reason}")]
    Url { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure to load a pipeline configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("unsupported config version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}
