use thiserror::Error;

use crate::worker::WorkerState;

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// For `Fetcher` implementations without a transport of their own.
    #[error("Network unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode cache record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt cache record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Install of {version} failed on {path}: {reason}")]
    InstallFailed {
        version: String,
        path: String,
        reason: String,
    },

    #[error("Invalid manifest entry: {0}")]
    InvalidManifest(String),

    #[error("Worker is {actual}, expected {expected}")]
    InvalidState {
        expected: WorkerState,
        actual: WorkerState,
    },

    #[error("Offline and no fallback available for {0}")]
    Offline(String),

    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl WorkerError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &[u8]) -> String {
        let text = String::from_utf8_lossy(body);
        if text.len() <= MAX_ERROR_BODY_LENGTH {
            text.into_owned()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|&i| text.is_char_boundary(i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &text[..cut], body.len())
        }
    }

    /// Install failure for a manifest entry that answered with a non-success status.
    pub fn from_install_status(version: &str, path: &str, status: u16, body: &[u8]) -> Self {
        WorkerError::InstallFailed {
            version: version.to_string(),
            path: path.to_string(),
            reason: format!("Status {}: {}", status, Self::truncate_body(body)),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BookingError {
    #[error("Cart has no package selected")]
    EmptyCart,
}
