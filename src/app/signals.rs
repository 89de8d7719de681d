//! Two-stage Ctrl+C handling.
//!
//! The first interrupt requests cancellation: the current archive finishes
//! (or is cleaned up) and no further archive starts. A second interrupt exits
//! immediately with status 130.

use timelapse_core::{CancellationFlag, RunExit};
use tokio::task::JoinHandle;
use tracing::warn;

pub(crate) fn spawn_interrupt_listener(cancel: CancellationFlag) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl+C");
                return;
            }
            if cancel.cancel() {
                eprintln!("\n\nInterrupted by user (Ctrl+C). Finishing the current archive...");
                eprintln!("Press Ctrl+C again to force exit.");
            } else {
                eprintln!("\nForce exit!");
                std::process::exit(i32::from(RunExit::Interrupted.code()));
            }
        }
    })
}
