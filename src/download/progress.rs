//! Transfer progress snapshots and the sink that receives them.

use std::time::Duration;

use super::DownloadError;

/// State of one transfer attempt, reported at least once per chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes written to the temporary file so far in this attempt.
    pub bytes_so_far: u64,
    /// Expected size from `Content-Length`, `None` when unknown.
    pub total_bytes: Option<u64>,
    /// Time since the attempt's response arrived.
    pub elapsed: Duration,
}

impl TransferProgress {
    /// Completion percentage (0-100), `None` when the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f64> {
        let total = self.total_bytes.filter(|total| *total > 0)?;
        Some((self.bytes_so_far as f64 / total as f64 * 100.0).min(100.0))
    }

    /// Average throughput since the attempt started.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bytes_per_second(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.bytes_so_far as f64 / secs)
    }

    /// Remaining time at the average throughput so far.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total_bytes?;
        let rate = self.bytes_per_second().filter(|rate| *rate > 0.0)?;
        let remaining = total.saturating_sub(self.bytes_so_far) as f64;
        Duration::try_from_secs_f64(remaining / rate).ok()
    }
}

/// Receives progress from the streaming downloader.
///
/// Only [`on_progress`](Self::on_progress) is required. Any
/// `Fn(&TransferProgress)` closure is a sink.
pub trait ProgressSink: Send + Sync {
    /// Called after every chunk is written.
    fn on_progress(&self, progress: &TransferProgress);

    /// Called when attempt `attempt` of `max_attempts` failed with a
    /// retryable error and the next attempt starts after `delay`.
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &DownloadError, delay: Duration) {
        let _ = (attempt, max_attempts, error, delay);
    }

    /// Called once per attempt after the body stream ends or fails.
    fn on_transfer_end(&self, success: bool) {
        let _ = success;
    }
}

impl<F> ProgressSink for F
where
    F: Fn(&TransferProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &TransferProgress) {
        self(progress);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn progress(bytes: u64, total: Option<u64>, secs: u64) -> TransferProgress {
        TransferProgress {
            bytes_so_far: bytes,
            total_bytes: total,
            elapsed: Duration::from_secs(secs),
        }
    }

    #[test]
    fn test_percent_known_total() {
        let p = progress(250, Some(1000), 1);
        assert!((p.percent().unwrap() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percent_unknown_or_zero_total() {
        assert!(progress(250, None, 1).percent().is_none());
        assert!(progress(0, Some(0), 1).percent().is_none());
    }

    #[test]
    fn test_bytes_per_second_and_eta() {
        let p = progress(500, Some(1500), 5);
        assert!((p.bytes_per_second().unwrap() - 100.0).abs() < f64::EPSILON);
        assert_eq!(p.eta(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_no_rate_before_time_passes() {
        let p = progress(500, Some(1500), 0);
        assert!(p.bytes_per_second().is_none());
        assert!(p.eta().is_none());
    }

    #[test]
    fn test_closure_is_a_sink() {
        use std::sync::Mutex;

        let seen = Mutex::new(Vec::new());
        let sink = |p: &TransferProgress| seen.lock().unwrap().push(p.bytes_so_far);
        sink.on_progress(&progress(1, None, 0));
        sink.on_progress(&progress(2, None, 0));
        sink.on_transfer_end(true);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
