//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use timelapse_core::download::{DEFAULT_RATE_LIMIT_MBPS, DEFAULT_TIMEOUT};
use timelapse_core::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};

/// Download timelapse archives from a camera over digest-authenticated HTTP.
///
/// Lists the archives the camera exposes, skips the ones already present in
/// the output directory and streams the rest to disk under a bandwidth cap.
// No Debug derive: the struct holds the password.
#[derive(Parser)]
#[command(name = "timelapse-dl")]
#[command(author, version, about)]
pub struct Args {
    /// Camera hostname or IP address (optionally host:port)
    #[arg(long, default_value = "192.168.0.90")]
    pub host: String,

    /// Directory to save downloaded files (created if missing)
    #[arg(long, default_value = ".")]
    pub outdir: PathBuf,

    /// Username for digest auth
    #[arg(long, env = "TIMELAPSE_USER")]
    pub user: String,

    /// Password for digest auth
    #[arg(long = "pass", env = "TIMELAPSE_PASS", hide_env_values = true)]
    pub password: String,

    /// Connect and per-read HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Download rate limit in Mbps (must be > 0)
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT_MBPS, conflicts_with = "no_rate_limit")]
    pub rate_limit: f64,

    /// Download without a rate limit
    #[arg(long)]
    pub no_rate_limit: bool,

    /// Maximum attempts per archive, including the first
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_retries: u32,

    /// Delay in seconds between attempts
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    pub retry_delay: u64,

    /// Compare sizes with the camera before skipping existing files
    #[arg(long)]
    pub check_size: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Download archives even if the local file exists
    #[arg(long)]
    pub overwrite: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["timelapse-dl", "--user", "root", "--pass", "secret"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.host, "192.168.0.90");
        assert_eq!(args.outdir, PathBuf::from("."));
        assert_eq!(args.timeout, 60);
        assert!((args.rate_limit - 90.0).abs() < f64::EPSILON);
        assert!(!args.no_rate_limit);
        assert_eq!(args.max_retries, 3);
        assert_eq!(args.retry_delay, 5);
        assert!(!args.check_size);
        assert!(!args.no_progress);
        assert!(!args.overwrite);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_requires_credentials() {
        // Env fallbacks must not leak into this test.
        if std::env::var_os("TIMELAPSE_USER").is_some() {
            return;
        }
        let result = Args::try_parse_from(["timelapse-dl", "--pass", "secret"]);
        assert_eq!(
            result.err().unwrap().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_rate_limit_conflicts_with_no_rate_limit() {
        let result = parse(&["--rate-limit", "10", "--no-rate-limit"]);
        assert_eq!(
            result.err().unwrap().kind(),
            clap::error::ErrorKind::ArgumentConflict
        );
        assert!(parse(&["--no-rate-limit"]).unwrap().no_rate_limit);
    }

    #[test]
    fn test_cli_max_retries_must_be_positive() {
        assert!(parse(&["--max-retries", "0"]).is_err());
        assert_eq!(parse(&["--max-retries", "7"]).unwrap().max_retries, 7);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        assert_eq!(parse(&["-v"]).unwrap().verbose, 1);
        assert_eq!(parse(&["-vv"]).unwrap().verbose, 2);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        assert!(parse(&["-q"]).unwrap().quiet);
        assert!(parse(&["-q", "-v"]).is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["timelapse-dl", "--help"]);
        assert_eq!(
            result.err().unwrap().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }
}
