//! Terminal detection and tracing setup.

/// Log level used when `RUST_LOG` is not set.
pub(crate) fn resolve_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_show_progress(
    no_progress: bool,
    stderr_is_terminal: bool,
    dumb_terminal: bool,
) -> bool {
    !no_progress && stderr_is_terminal && !dumb_terminal
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `default_level`.
pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
