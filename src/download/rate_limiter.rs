//! Bit-rate ceiling for a single streaming transfer.
//!
//! The [`RateLimiter`] never sleeps ahead of time. After each chunk the
//! downloader asks how long the bytes written so far *should* have taken at
//! the configured rate, and sleeps only the positive difference from the time
//! that actually elapsed. The transfer therefore never exceeds the ceiling by
//! more than one chunk's worth, and a slow link is never slowed further.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use timelapse_core::download::{RateLimit, RateLimiter};
//!
//! let limit = RateLimit::from_megabits_per_second(8.0).unwrap();
//! let limiter = RateLimiter::new(limit);
//!
//! // 1 MB at 8 Mbit/s takes one second; half a second has passed already.
//! let pause = limiter.pause_for(1_000_000, Duration::from_millis(500));
//! assert_eq!(pause, Duration::from_millis(500));
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Configured transfer ceiling.
///
/// "No limit" is its own state rather than a zero rate, so a missing or zero
/// value can never silently turn throttling off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimit {
    /// Transfer as fast as the link allows.
    Unlimited,
    /// At most this many bits per second (always > 0).
    BitsPerSecond(u64),
}

/// A rate that cannot be used as a ceiling.
#[derive(Debug, Error, PartialEq)]
pub enum RateLimitError {
    /// Zero, negative, NaN or infinite.
    #[error("rate limit must be a positive number of Mbps, got {0}")]
    NotPositive(f64),

    /// Rounds down to zero bits per second.
    #[error("rate limit {0} Mbps is below 1 bit per second")]
    TooSmall(f64),
}

impl RateLimit {
    /// Converts a megabit-per-second figure (10^6 bits) into a limit.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] when `mbps` is not a finite positive number
    /// or is too small to express as a whole bit per second.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn from_megabits_per_second(mbps: f64) -> Result<Self, RateLimitError> {
        if !mbps.is_finite() || mbps <= 0.0 {
            return Err(RateLimitError::NotPositive(mbps));
        }
        let bits = (mbps * 1_000_000.0).min(u64::MAX as f64) as u64;
        if bits == 0 {
            return Err(RateLimitError::TooSmall(mbps));
        }
        Ok(Self::BitsPerSecond(bits))
    }

    /// Returns the ceiling in bits per second, or `None` when unlimited.
    #[must_use]
    pub fn bits_per_second(self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::BitsPerSecond(bits) => Some(bits),
        }
    }
}

impl fmt::Display for RateLimit {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::BitsPerSecond(bits) => write!(f, "{} Mbps", *bits as f64 / 1_000_000.0),
        }
    }
}

/// Paces a transfer against a [`RateLimit`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    limit: RateLimit,
}

impl RateLimiter {
    /// Creates a limiter for `limit`.
    #[must_use]
    #[instrument(level = "debug")]
    pub fn new(limit: RateLimit) -> Self {
        debug!(%limit, "creating rate limiter");
        Self { limit }
    }

    /// Time `bytes` should take at the configured rate (zero when unlimited).
    #[must_use]
    pub fn required_elapsed(&self, bytes: u64) -> Duration {
        let Some(bits_per_second) = self.limit.bits_per_second() else {
            return Duration::ZERO;
        };
        let nanos = u128::from(bytes) * 8 * NANOS_PER_SEC / u128::from(bits_per_second);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// How long to sleep so that `bytes` sent in `elapsed` stays within the limit.
    #[must_use]
    pub fn pause_for(&self, bytes: u64, elapsed: Duration) -> Duration {
        self.required_elapsed(bytes).saturating_sub(elapsed)
    }

    /// Sleeps as needed after `bytes` have been sent since `started`.
    pub async fn throttle(&self, bytes: u64, started: Instant) {
        let pause = self.pause_for(bytes, started.elapsed());
        if pause.is_zero() {
            return;
        }
        trace!(bytes, pause_ms = pause.as_millis(), "throttling transfer");
        tokio::time::sleep(pause).await;
    }
}
