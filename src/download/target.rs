//! Download targets: where an archive comes from and where it lands.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use url::Url;

use super::constants::PART_SUFFIX;
use super::filename::local_filename_from_url;

/// An archive's export URL paired with its final local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Authenticated export URL.
    pub url: String,
    /// Final path of the archive. Only ever written by an atomic rename.
    pub local_path: PathBuf,
}

impl DownloadTarget {
    /// Creates a target from explicit parts.
    pub fn new(url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            local_path: local_path.into(),
        }
    }

    /// Derives a target for `url` inside `output_dir`, naming the file after
    /// the `file` query parameter or the last path segment.
    #[must_use]
    pub fn from_url(url: &Url, output_dir: &Path) -> Self {
        Self {
            url: url.to_string(),
            local_path: output_dir.join(local_filename_from_url(url)),
        }
    }

    /// Temporary path written during a transfer: `<local_path>.part`.
    #[must_use]
    pub fn part_path(&self) -> PathBuf {
        let mut name = OsString::from(self.local_path.as_os_str());
        name.push(PART_SUFFIX);
        PathBuf::from(name)
    }

    /// File name of the final path, for display.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.local_path.file_name().map_or_else(
            || self.local_path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}
