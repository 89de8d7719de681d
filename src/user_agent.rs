//! User-Agent string sent with every device request.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/timelapse-dl";

/// Default User-Agent for device requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("timelapse-dl/{version} (+{PROJECT_UA_URL})")
}
