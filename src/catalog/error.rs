//! Error types for catalog retrieval.

use thiserror::Error;

use crate::download::DownloadError;

/// Failure to obtain the archive listing. Always fatal for a run.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The configured host does not form a valid endpoint URL.
    #[error("invalid device host '{host}'")]
    InvalidHost {
        /// The rejected host value.
        host: String,
    },

    /// The listing request failed (transport, auth or HTTP status).
    #[error("failed to fetch archive listing: {0}")]
    Fetch(#[source] DownloadError),

    /// The listing body is not valid JSON.
    #[error("archive listing from {url} is not valid JSON: {source}")]
    Parse {
        /// The listing URL.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// Creates an invalid host error.
    pub fn invalid_host(host: impl Into<String>) -> Self {
        Self::InvalidHost { host: host.into() }
    }

    /// Creates a parse error.
    pub fn parse(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            url: url.into(),
            source,
        }
    }
}
