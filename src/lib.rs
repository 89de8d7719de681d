//! Timelapse archive downloader core library.
//!
//! Retrieves the timelapse archives a camera exposes over its HTTP API and
//! persists them locally. Every request is authenticated with HTTP Digest,
//! transfers stream into a `.part` file under an optional bit-rate ceiling,
//! transient failures are retried, and a file only appears under its final
//! name after an atomic rename.
//!
//! # Architecture
//!
//! - [`auth`] - Digest challenge parsing and the per-request [`DigestSession`]
//! - [`catalog`] - Archive listing and export URL derivation
//! - [`download`] - Reconciliation, rate limiting, retry and the streaming downloader
//! - [`run`] - The orchestrator that sequences a whole run
//! - [`cancel`] - Cooperative cancellation flag consumed by the orchestrator

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod cancel;
pub mod catalog;
pub mod download;
pub mod run;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use auth::{ChallengeError, Credentials, DigestAlgorithm, DigestChallenge, DigestSession};
pub use cancel::CancellationFlag;
pub use catalog::{ArchiveDescriptor, CatalogClient, CatalogError};
pub use download::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, Decision, DownloadError,
    DownloadOptions, DownloadReason, DownloadReport, DownloadTarget, FailureType, ProgressSink,
    RateLimit, RateLimitError, RateLimiter, ReconcilePolicy, RetryDecision, RetryPolicy,
    SkipReason, StreamingDownloader, TransferProgress, classify_error,
};
pub use run::{RunError, RunExit, RunObserver, RunOrchestrator, RunOutcome};
