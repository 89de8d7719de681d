//! Error types for the download module.
//!
//! Every variant carries the URL or path it concerns so a failure can be
//! reported per archive without extra context from the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the device or writing archives.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The device rejected the credentials after a digest challenge.
    #[error("authentication rejected by {url} (HTTP {status})")]
    Auth {
        /// The URL that rejected the credentials.
        url: String,
        /// The final HTTP status code (normally 401).
        status: u16,
    },

    /// Network-level error (DNS resolution, connection refused, reset, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect or read timed out.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response other than an authentication failure.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response was structurally unusable (bad challenge, malformed header).
    #[error("protocol error from {url}: {reason}")]
    Protocol {
        /// The URL whose response was malformed.
        url: String,
        /// What was wrong with the response.
        reason: String,
    },

    /// Local file system error (create, write, rename).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Creates an authentication error.
    pub fn auth(url: impl Into<String>, status: u16) -> Self {
        Self::Auth {
            url: url.into(),
            status,
        }
    }

    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub(crate) fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a protocol error.
    pub fn protocol(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Protocol {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// url or path, which the source errors don't carry.
