//! Per-archive console lines and the transfer progress bar.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressStyle};
use timelapse_core::{
    Decision, DownloadError, DownloadReason, DownloadTarget, ProgressSink, RunObserver,
    SkipReason, TransferProgress,
};

/// Prints run events to stdout/stderr and draws one progress bar per transfer.
pub(crate) struct ConsoleReporter {
    show_progress: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub(crate) fn new(show_progress: bool) -> Self {
        Self {
            show_progress,
            bar: Mutex::new(None),
        }
    }

    fn with_bar<T>(&self, f: impl FnOnce(&mut Option<ProgressBar>) -> T) -> T {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn clear_bar(&self) {
        self.with_bar(|bar| {
            if let Some(bar) = bar.take() {
                bar.finish_and_clear();
            }
        });
    }
}

fn new_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "[{bar:30.cyan/blue}] {percent:>3}% {bytes}/{total_bytes} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} Downloaded: {bytes} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        }
    }
}

/// Speed and ETA suffix, e.g. `11.2 MiB/s ETA: 42 seconds`.
pub(crate) fn rate_message(progress: &TransferProgress) -> String {
    let Some(rate) = progress.bytes_per_second() else {
        return String::new();
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let speed = format!("{}/s", HumanBytes(rate as u64));
    match progress.eta() {
        Some(eta) => format!("{speed} ETA: {}", HumanDuration(eta)),
        None => speed,
    }
}

pub(crate) fn skip_line(name: &str, reason: SkipReason) -> String {
    match reason {
        SkipReason::Exists => format!("SKIP  {name} (already exists)"),
        SkipReason::SizeMatches(size) => {
            format!("SKIP  {name} (already exists, size matches: {size} bytes)")
        }
        SkipReason::SizeUnverified => format!("SKIP  {name} (already exists, cannot verify size)"),
    }
}

impl RunObserver for ConsoleReporter {
    fn catalog_loaded(&self, count: usize) {
        if count == 0 {
            println!("No timelapse archives found on camera.");
        } else {
            println!("Found {count} timelapse archive(s) to download.\n");
        }
    }

    fn decided(&self, target: &DownloadTarget, decision: &Decision) {
        match decision {
            Decision::Skip(reason) => println!("{}", skip_line(&target.display_name(), *reason)),
            Decision::Download(DownloadReason::SizeMismatch { local, remote }) => println!(
                "INFO  {} exists but size mismatch (local: {local}, remote: {remote}), re-downloading",
                target.display_name()
            ),
            Decision::Download(_) => {}
        }
    }

    fn download_started(&self, target: &DownloadTarget) {
        println!("GET   {}", target.url);
        println!("SAVE  {}", target.local_path.display());
    }

    fn download_failed(&self, target: &DownloadTarget, error: &DownloadError) {
        self.clear_bar();
        eprintln!("FAIL  {}\n      {error}", target.url);
    }

    fn cancelled(&self, remaining: usize) {
        self.clear_bar();
        eprintln!("\nStopping download process... ({remaining} archive(s) not processed)");
    }
}

impl ProgressSink for ConsoleReporter {
    fn on_progress(&self, progress: &TransferProgress) {
        if !self.show_progress {
            return;
        }
        self.with_bar(|slot| {
            let bar = slot.get_or_insert_with(|| new_bar(progress.total_bytes));
            bar.set_position(progress.bytes_so_far);
            bar.set_message(rate_message(progress));
        });
    }

    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &DownloadError, delay: Duration) {
        self.clear_bar();
        eprintln!("      Attempt {attempt}/{max_attempts} failed: {error}");
        eprintln!("      Retrying in {} seconds...", delay.as_secs());
    }

    fn on_transfer_end(&self, success: bool) {
        self.with_bar(|slot| {
            if let Some(bar) = slot.take() {
                if success {
                    bar.finish();
                } else {
                    bar.abandon();
                }
            }
        });
    }
}
