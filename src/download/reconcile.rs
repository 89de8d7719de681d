//! Decide whether an archive needs (re-)downloading.

use reqwest::header::CONTENT_LENGTH;
use tracing::{debug, instrument};

use super::target::DownloadTarget;
use crate::auth::DigestSession;

/// Why an archive is downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadReason {
    /// `overwrite` was requested.
    Overwrite,
    /// No local file exists yet.
    Missing,
    /// Local and remote sizes differ.
    SizeMismatch {
        /// Local file size in bytes.
        local: u64,
        /// Remote `Content-Length`.
        remote: u64,
    },
}

/// Why an archive is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A local file exists and sizes were not compared.
    Exists,
    /// The local file has the size the device reports.
    SizeMatches(u64),
    /// Size comparison was requested but the device reported no usable size.
    SizeUnverified,
}

/// Outcome of [`ReconcilePolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Fetch the archive.
    Download(DownloadReason),
    /// Leave the local file alone.
    Skip(SkipReason),
}

/// Local/remote comparison rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Always download, ignoring local state.
    pub overwrite: bool,
    /// Compare the local size against a HEAD probe before skipping.
    pub check_size: bool,
}

impl ReconcilePolicy {
    /// Decides what to do with `target`. Never fails: an unreadable local
    /// file counts as missing and a failed probe as an unverified size.
    #[instrument(skip(self, target, session), fields(path = %target.local_path.display()))]
    pub async fn decide(&self, target: &DownloadTarget, session: &DigestSession) -> Decision {
        if self.overwrite {
            return Decision::Download(DownloadReason::Overwrite);
        }

        let local = match tokio::fs::metadata(&target.local_path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Decision::Download(DownloadReason::Missing),
        };

        if !self.check_size {
            return Decision::Skip(SkipReason::Exists);
        }

        match probe_remote_size(session, &target.url).await {
            None => Decision::Skip(SkipReason::SizeUnverified),
            Some(remote) if remote == local => Decision::Skip(SkipReason::SizeMatches(local)),
            Some(remote) => Decision::Download(DownloadReason::SizeMismatch { local, remote }),
        }
    }
}

/// Remote size from an authenticated HEAD, `None` when unavailable.
///
/// The header is read directly: a HEAD response has no body, so the body
/// length reqwest tracks is always zero.
pub async fn probe_remote_size(session: &DigestSession, url: &str) -> Option<u64> {
    let response = match session.perform_head(url).await {
        Ok(response) => response,
        Err(e) => {
            debug!(url, error = %e, "size probe failed");
            return None;
        }
    };
    if response.status().as_u16() >= 400 {
        debug!(url, status = response.status().as_u16(), "size probe rejected");
        return None;
    }
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::Credentials;
    use crate::test_support::digest_server::{DigestAuth, TEST_PASS, TEST_USER};
    use crate::test_support::socket_guard::start_mock_server_or_skip;

    fn session() -> DigestSession {
        DigestSession::new(
            Credentials::new(TEST_USER, TEST_PASS),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn existing_target(dir: &TempDir, url: String, len: usize) -> DownloadTarget {
        let local_path = dir.path().join("a.zip");
        std::fs::write(&local_path, vec![0u8; len]).unwrap();
        DownloadTarget::new(url, local_path)
    }

    async fn head_server(remote_len: Option<&str>, status: u16) -> Option<MockServer> {
        let server = start_mock_server_or_skip().await?;
        let mut template = ResponseTemplate::new(status);
        if let Some(len) = remote_len {
            template = template.insert_header("Content-Length", len);
        }
        Mock::given(method("HEAD"))
            .respond_with(DigestAuth::new(template))
            .mount(&server)
            .await;
        Some(server)
    }

    #[tokio::test]
    async fn test_overwrite_always_downloads() {
        let dir = TempDir::new().unwrap();
        // Unroutable URL: overwrite must not touch the network.
        let target = existing_target(&dir, "http://127.0.0.1:9/a".to_string(), 10);
        let policy = ReconcilePolicy {
            overwrite: true,
            check_size: true,
        };
        assert_eq!(
            policy.decide(&target, &session()).await,
            Decision::Download(DownloadReason::Overwrite)
        );
    }

    #[tokio::test]
    async fn test_missing_file_downloads() {
        let dir = TempDir::new().unwrap();
        let target = DownloadTarget::new("http://127.0.0.1:9/a", dir.path().join("absent.zip"));
        assert_eq!(
            ReconcilePolicy::default().decide(&target, &session()).await,
            Decision::Download(DownloadReason::Missing)
        );
    }

    #[tokio::test]
    async fn test_existing_file_skips_without_size_check() {
        let dir = TempDir::new().unwrap();
        let target = existing_target(&dir, "http://127.0.0.1:9/a".to_string(), 3);
        assert_eq!(
            ReconcilePolicy::default().decide(&target, &session()).await,
            Decision::Skip(SkipReason::Exists)
        );
    }

    #[tokio::test]
    async fn test_check_size_match_skips() {
        let Some(server) = head_server(Some("5"), 200).await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let target = existing_target(&dir, format!("{}/archive?export=1", server.uri()), 5);
        let policy = ReconcilePolicy {
            overwrite: false,
            check_size: true,
        };
        assert_eq!(
            policy.decide(&target, &session()).await,
            Decision::Skip(SkipReason::SizeMatches(5))
        );
    }

    #[tokio::test]
    async fn test_check_size_mismatch_downloads() {
        let Some(server) = head_server(Some("9"), 200).await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let target = existing_target(&dir, format!("{}/archive?export=1", server.uri()), 5);
        let policy = ReconcilePolicy {
            overwrite: false,
            check_size: true,
        };
        assert_eq!(
            policy.decide(&target, &session()).await,
            Decision::Download(DownloadReason::SizeMismatch {
                local: 5,
                remote: 9
            })
        );
    }

    #[tokio::test]
    async fn test_check_size_probe_error_status_skips_unverified() {
        let Some(server) = head_server(None, 500).await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let target = existing_target(&dir, format!("{}/archive?export=1", server.uri()), 5);
        let policy = ReconcilePolicy {
            overwrite: false,
            check_size: true,
        };
        assert_eq!(
            policy.decide(&target, &session()).await,
            Decision::Skip(SkipReason::SizeUnverified)
        );
    }

    #[tokio::test]
    async fn test_check_size_unreachable_device_skips_unverified() {
        let dir = TempDir::new().unwrap();
        let target = existing_target(&dir, "http://127.0.0.1:9/archive".to_string(), 5);
        let policy = ReconcilePolicy {
            overwrite: false,
            check_size: true,
        };
        assert_eq!(
            policy.decide(&target, &session()).await,
            Decision::Skip(SkipReason::SizeUnverified)
        );
    }
}
