//! Constants for the download module (chunking, timeouts, rate limiting).

use std::time::Duration;

/// Size of each body chunk written, reported and throttled as a unit (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Default connect and per-read timeout for device requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bit-rate ceiling in megabits per second.
pub const DEFAULT_RATE_LIMIT_MBPS: f64 = 90.0;

/// Suffix appended to the final path while a transfer is in flight.
pub const PART_SUFFIX: &str = ".part";

/// Name used when neither the `file` parameter nor the URL path yields one.
pub const FALLBACK_FILENAME: &str = "download.bin";
