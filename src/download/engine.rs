//! Streaming downloader with rate limiting and bounded retry.
//!
//! [`StreamingDownloader::download`] fetches one [`DownloadTarget`]:
//!
//! 1. Any stale `<local_path>.part` left by an earlier failure is removed.
//! 2. The export URL is fetched through the [`DigestSession`].
//! 3. The body is written to the `.part` file in fixed-size chunks. After each
//!    chunk progress is reported and the [`RateLimiter`] sleeps off any lead
//!    over the configured ceiling.
//! 4. A fully consumed body is synced and renamed onto the final path.
//!
//! Failures delete the temporary file. Retryable failures (5xx, network,
//! timeout) start a new attempt after the policy's delay, unless attempts are
//! exhausted or cancellation was requested in the meantime.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use timelapse_core::{Credentials, DigestSession, DownloadOptions, DownloadTarget, StreamingDownloader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = DigestSession::new(Credentials::new("root", "secret"), Duration::from_secs(60))?;
//! let downloader = StreamingDownloader::new(session, DownloadOptions::default());
//! let target = DownloadTarget::new(
//!     "http://192.168.0.90/local/timelapseme/archives?export=1&file=day.zip",
//!     Path::new("./archives/day.zip"),
//! );
//! let report = downloader.download(&target).await?;
//! println!("{} bytes in {} attempt(s)", report.bytes, report.attempts);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Response;
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::constants::DEFAULT_CHUNK_SIZE;
use super::error::DownloadError;
use super::progress::ProgressSink;
use super::rate_limiter::{RateLimit, RateLimiter};
use super::retry::{RetryDecision, RetryPolicy};
use super::target::DownloadTarget;
use super::transfer::{TransferSession, remove_part_file};
use crate::auth::DigestSession;
use crate::cancel::CancellationFlag;

/// Knobs for [`StreamingDownloader`].
#[derive(Clone)]
pub struct DownloadOptions {
    /// Bit-rate ceiling per transfer.
    pub rate_limit: RateLimit,
    /// Attempt bound and delay between attempts.
    pub retry_policy: RetryPolicy,
    /// Bytes per write/progress/throttle step.
    pub chunk_size: usize,
    /// Receives per-chunk progress and retry notices.
    pub progress: Option<Arc<dyn ProgressSink>>,
    /// Once set, no further retry attempts are started.
    pub cancellation: Option<CancellationFlag>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            rate_limit: RateLimit::Unlimited,
            retry_policy: RetryPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress: None,
            cancellation: None,
        }
    }
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("rate_limit", &self.rate_limit)
            .field("retry_policy", &self.retry_policy)
            .field("chunk_size", &self.chunk_size)
            .field("progress", &self.progress.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

/// Result of a successful [`StreamingDownloader::download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Final path the archive was published to.
    pub path: PathBuf,
    /// Bytes written by the successful attempt.
    pub bytes: u64,
    /// `Content-Length` announced by the device, if any.
    pub total_bytes: Option<u64>,
    /// Attempts used, including the successful one.
    pub attempts: u32,
    /// Wall time across all attempts, including retry delays.
    pub elapsed: Duration,
}

/// Downloads targets one at a time through a [`DigestSession`].
#[derive(Debug, Clone)]
pub struct StreamingDownloader {
    session: DigestSession,
    options: DownloadOptions,
    limiter: RateLimiter,
}

impl StreamingDownloader {
    /// Creates a downloader. A zero `chunk_size` is raised to 1.
    #[must_use]
    pub fn new(session: DigestSession, mut options: DownloadOptions) -> Self {
        options.chunk_size = options.chunk_size.max(1);
        let limiter = RateLimiter::new(options.rate_limit);
        Self {
            session,
            options,
            limiter,
        }
    }

    /// Returns the session used for requests.
    #[must_use]
    pub fn session(&self) -> &DigestSession {
        &self.session
    }

    /// Returns the configured options.
    #[must_use]
    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    /// Downloads `target`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt when it is not retryable, when
    /// attempts are exhausted, or when cancellation was requested before the
    /// next attempt could start. No `.part` file remains after an error.
    #[instrument(skip(self, target), fields(url = %target.url))]
    pub async fn download(&self, target: &DownloadTarget) -> Result<DownloadReport, DownloadError> {
        let policy = &self.options.retry_policy;
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "attempting download");

            let error = match self.attempt(target).await {
                Ok((bytes, total_bytes)) => {
                    info!(
                        path = %target.local_path.display(),
                        bytes,
                        attempts = attempt,
                        "download complete"
                    );
                    return Ok(DownloadReport {
                        path: target.local_path.clone(),
                        bytes,
                        total_bytes,
                        attempts: attempt,
                        elapsed: started.elapsed(),
                    });
                }
                Err(e) => e,
            };

            match policy.decide(&error, attempt) {
                RetryDecision::Retry { delay, attempt: next_attempt } => {
                    if self.is_cancelled() {
                        info!(attempt, "cancellation requested; not retrying");
                        return Err(error);
                    }
                    warn!(
                        attempt = next_attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "retrying download"
                    );
                    if let Some(sink) = &self.options.progress {
                        sink.on_retry(attempt, policy.max_attempts(), &error, delay);
                    }
                    tokio::time::sleep(delay).await;
                    if self.is_cancelled() {
                        info!(attempt, "cancellation requested during retry delay");
                        return Err(error);
                    }
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(%reason, error = %error, "not retrying download");
                    return Err(error);
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
    }

    /// One GET-stream-publish cycle.
    async fn attempt(&self, target: &DownloadTarget) -> Result<(u64, Option<u64>), DownloadError> {
        let part_path = target.part_path();
        remove_part_file(&part_path).await;

        let response = self.session.perform_get(&target.url).await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(DownloadError::http_status(&target.url, status.as_u16()));
        }

        let total_bytes = content_length(response.headers(), &target.url)?;
        debug!(?total_bytes, "streaming body");

        let mut transfer = TransferSession::create(part_path, total_bytes).await?;
        let result = match self.stream_body(&mut transfer, response, &target.url).await {
            Ok(()) => transfer.commit(&target.local_path).await,
            Err(e) => {
                transfer.discard().await;
                Err(e)
            }
        };

        if let Some(sink) = &self.options.progress {
            sink.on_transfer_end(result.is_ok());
        }
        result.map(|bytes| (bytes, total_bytes))
    }

    async fn stream_body(
        &self,
        transfer: &mut TransferSession,
        response: Response,
        url: &str,
    ) -> Result<(), DownloadError> {
        let chunk_size = self.options.chunk_size;
        let mut buffer = Vec::with_capacity(chunk_size);
        let mut stream = response.bytes_stream();

        while let Some(item) = stream.next().await {
            let bytes = item.map_err(|e| DownloadError::network(url, e))?;
            let mut rest: &[u8] = &bytes;
            while !rest.is_empty() {
                let take = (chunk_size - buffer.len()).min(rest.len());
                buffer.extend_from_slice(&rest[..take]);
                rest = &rest[take..];
                if buffer.len() == chunk_size {
                    self.flush_chunk(transfer, &mut buffer).await?;
                }
            }
        }

        if !buffer.is_empty() || transfer.bytes_transferred() == 0 {
            self.flush_chunk(transfer, &mut buffer).await?;
        }
        Ok(())
    }

    async fn flush_chunk(
        &self,
        transfer: &mut TransferSession,
        buffer: &mut Vec<u8>,
    ) -> Result<(), DownloadError> {
        transfer.write_chunk(buffer).await?;
        buffer.clear();

        if let Some(sink) = &self.options.progress {
            sink.on_progress(&transfer.progress());
        }
        self.limiter
            .throttle(transfer.bytes_transferred(), transfer.started())
            .await;
        Ok(())
    }
}

/// Reads `Content-Length`. Absent or zero means unknown.
fn content_length(headers: &HeaderMap, url: &str) -> Result<Option<u64>, DownloadError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return Ok(None);
    };
    let length = value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            DownloadError::protocol(url, format!("malformed Content-Length header: {value:?}"))
        })?;
    Ok((length > 0).then_some(length))
}
