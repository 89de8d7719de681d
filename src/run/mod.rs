//! Sequences a whole run: catalog, then reconcile and download each archive.
//!
//! Archives are processed strictly one after another. Cancellation is only
//! observed between archives, so an archive that has started either gets
//! published or cleaned up before the run stops.

mod observer;
mod outcome;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

pub use observer::{RunObserver, SilentObserver};
pub use outcome::{RunExit, RunOutcome};

use crate::cancel::CancellationFlag;
use crate::catalog::{CatalogClient, CatalogError};
use crate::download::{Decision, ReconcilePolicy, StreamingDownloader};

/// Errors that abort a run before any archive is processed.
#[derive(Debug, Error)]
pub enum RunError {
    /// The archive listing could not be fetched or parsed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl RunError {
    /// Exit status for this error.
    #[must_use]
    pub fn exit_status(&self) -> RunExit {
        match self {
            Self::Catalog(_) => RunExit::CatalogUnavailable,
        }
    }
}

/// Drives catalog retrieval, reconciliation and downloads for one device.
pub struct RunOrchestrator {
    catalog: CatalogClient,
    policy: ReconcilePolicy,
    downloader: StreamingDownloader,
    output_dir: PathBuf,
    observer: Arc<dyn RunObserver>,
}

impl RunOrchestrator {
    /// Creates an orchestrator that reports nothing.
    pub fn new(
        catalog: CatalogClient,
        policy: ReconcilePolicy,
        downloader: StreamingDownloader,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            policy,
            downloader,
            output_dir: output_dir.into(),
            observer: Arc::new(SilentObserver),
        }
    }

    /// Replaces the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Runs to completion or until `cancel` is observed between archives.
    ///
    /// Per-archive failures are counted, never returned. The outcome is
    /// marked interrupted whenever `cancel` was set by the end of the run.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Catalog`] when the listing cannot be obtained.
    #[instrument(skip(self, cancel), fields(output_dir = %self.output_dir.display()))]
    pub async fn run(&self, cancel: &CancellationFlag) -> Result<RunOutcome, RunError> {
        let targets = self.catalog.list_archives(&self.output_dir).await?;
        self.observer.catalog_loaded(targets.len());

        let mut outcome = RunOutcome::default();
        if targets.is_empty() {
            info!("no archives listed");
            return Ok(outcome);
        }

        for (index, target) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                let remaining = targets.len() - index;
                warn!(remaining, "run cancelled");
                outcome.interrupted = true;
                self.observer.cancelled(remaining);
                break;
            }

            let decision = self
                .policy
                .decide(target, self.downloader.session())
                .await;
            self.observer.decided(target, &decision);

            match decision {
                Decision::Skip(_) => outcome.record_skip(),
                Decision::Download(_) => {
                    self.observer.download_started(target);
                    match self.downloader.download(target).await {
                        Ok(report) => {
                            outcome.record_success();
                            self.observer.download_succeeded(target, &report);
                        }
                        Err(error) => {
                            warn!(url = %target.url, error = %error, "archive failed");
                            outcome.record_failure();
                            self.observer.download_failed(target, &error);
                        }
                    }
                }
            }
        }
        // A request that landed mid-archive (e.g. during a retry delay) still
        // makes this an interrupted run.
        outcome.interrupted |= cancel.is_cancelled();

        info!(
            succeeded = outcome.succeeded,
            skipped = outcome.skipped,
            failed = outcome.failed,
            interrupted = outcome.interrupted,
            "run finished"
        );
        Ok(outcome)
    }
}
