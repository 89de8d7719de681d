//! Reconciliation, rate limiting, retry and the streaming downloader.
//!
//! # Features
//!
//! - Streaming downloads into `<name>.part`, published by atomic rename
//! - Bit-rate ceiling applied per chunk ([`RateLimit`], [`RateLimiter`])
//! - Fixed-delay bounded retry of transient failures ([`RetryPolicy`])
//! - Skip/download decisions against existing local files ([`ReconcilePolicy`])
//! - Structured error types carrying the URL or path they concern
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use timelapse_core::download::{DownloadOptions, RateLimit, RetryPolicy};
//!
//! let options = DownloadOptions {
//!     rate_limit: RateLimit::from_megabits_per_second(90.0).unwrap(),
//!     retry_policy: RetryPolicy::new(3, Duration::from_secs(5)),
//!     ..DownloadOptions::default()
//! };
//! ```

mod constants;
mod engine;
mod error;
mod filename;
mod progress;
pub mod rate_limiter;
mod reconcile;
mod retry;
mod target;
mod transfer;

pub use constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_RATE_LIMIT_MBPS, DEFAULT_TIMEOUT, FALLBACK_FILENAME, PART_SUFFIX,
};
pub use engine::{DownloadOptions, DownloadReport, StreamingDownloader};
pub use error::DownloadError;
pub use filename::local_filename_from_url;
pub use progress::{ProgressSink, TransferProgress};
pub use rate_limiter::{RateLimit, RateLimitError, RateLimiter};
pub use reconcile::{Decision, DownloadReason, ReconcilePolicy, SkipReason, probe_remote_size};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, FailureType, RetryDecision, RetryPolicy,
    classify_error,
};
pub use target::DownloadTarget;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
