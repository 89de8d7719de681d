//! Aggregate result of a run and the exit status it maps to.

use std::process::ExitCode;

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Archives downloaded and published.
    pub succeeded: usize,
    /// Archives left alone by reconciliation.
    pub skipped: usize,
    /// Archives whose download failed after retries.
    pub failed: usize,
    /// The run stopped on a cancellation request with archives remaining.
    pub interrupted: bool,
}

impl RunOutcome {
    pub(crate) fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub(crate) fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Archives reconciled or transferred, whatever the result.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    /// Maps the outcome to a process exit status. Interruption wins over
    /// failures.
    #[must_use]
    pub fn exit_status(&self) -> RunExit {
        if self.interrupted {
            RunExit::Interrupted
        } else if self.failed > 0 {
            RunExit::Failures
        } else {
            RunExit::Success
        }
    }
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// Every archive was downloaded or skipped (including "nothing to do").
    Success,
    /// At least one archive failed; the run completed.
    Failures,
    /// The catalog could not be fetched; nothing was attempted.
    CatalogUnavailable,
    /// Cancelled before all archives were processed.
    Interrupted,
}

impl RunExit {
    /// Numeric exit code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failures => 1,
            Self::CatalogUnavailable => 2,
            Self::Interrupted => 130,
        }
    }
}

impl From<RunExit> for ExitCode {
    fn from(exit: RunExit) -> Self {
        ExitCode::from(exit.code())
    }
}
