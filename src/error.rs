//! Error types for the harvester.

use thiserror::Error;

/// Main error type for a capture cycle
#[derive(Error, Debug)]
pub enum HarvestError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog request failed with status {status}")]
    CatalogStatus { status: u16 },

    #[error("Malformed catalog response: {0}")]
    CatalogMalformed(String),

    #[error("Upload rejected with status {status}: {body}")]
    PublishStatus { status: u16, body: String },

    // Browser errors
    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation to {url} timed out after {secs}s")]
    NavigationTimeout { url: String, secs: u64 },

    #[error("A capture cycle is already running against this session")]
    CycleInProgress,

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Transport failures are worth retrying; status and shape failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            HarvestError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            HarvestError::Launch(_) | HarvestError::Browser(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
