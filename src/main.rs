//! CLI entry point for the timelapse archive downloader.

use std::process::ExitCode;

mod app;
mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match app::runtime::run_timelapse_download().await {
        Ok(exit) => exit.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
