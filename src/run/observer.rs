//! Hooks for reporting a run as it progresses.

use crate::download::{Decision, DownloadError, DownloadReport, DownloadTarget};

/// Receives one call per run step. Every method defaults to a no-op.
pub trait RunObserver: Send + Sync {
    /// The catalog listed `count` archives.
    fn catalog_loaded(&self, count: usize) {
        let _ = count;
    }

    /// Reconciliation decided what to do with `target`.
    fn decided(&self, target: &DownloadTarget, decision: &Decision) {
        let _ = (target, decision);
    }

    /// A download of `target` is starting.
    fn download_started(&self, target: &DownloadTarget) {
        let _ = target;
    }

    /// `target` was published.
    fn download_succeeded(&self, target: &DownloadTarget, report: &DownloadReport) {
        let _ = (target, report);
    }

    /// `target` failed for good.
    fn download_failed(&self, target: &DownloadTarget, error: &DownloadError) {
        let _ = (target, error);
    }

    /// The run stopped with `remaining` archives unprocessed.
    fn cancelled(&self, remaining: usize) {
        let _ = remaining;
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}
