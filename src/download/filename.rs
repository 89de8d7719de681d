//! Local filename derivation for download targets.
//!
//! The export URL names the archive in its `file` query parameter. That value
//! wins; otherwise the last path segment is used, and `download.bin` when
//! neither yields a usable name. Only the final component is ever kept, so a
//! name can never point outside the output directory.

use url::Url;

use super::constants::FALLBACK_FILENAME;

/// Derives the local filename for `url`.
#[must_use]
pub fn local_filename_from_url(url: &Url) -> String {
    let from_query = url
        .query_pairs()
        .find(|(key, _)| key == "file")
        .and_then(|(_, value)| basename(&value));
    if let Some(name) = from_query {
        return name;
    }

    let from_path = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| {
            urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |s| s.into_owned())
        })
        .and_then(|segment| basename(&segment));

    from_path.unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Last `/`- or `\`-separated component, rejecting empty and dot segments.
fn basename(value: &str) -> Option<String> {
    let last = value.rsplit(['/', '\\']).next().unwrap_or(value);
    if is_safe_filename_segment(last) {
        Some(last.to_string())
    } else {
        None
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.chars().any(char::is_control)
}
