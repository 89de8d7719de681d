//! End-to-end CLI tests for the timelapse-dl binary.

use assert_cmd::Command;
use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::ResponseTemplate;

mod support;
use support::device::{Archive, mount_camera, mount_export, mount_listing};
use support::digest_server::{TEST_PASS, TEST_USER};
use support::socket_guard::start_mock_server_or_skip;

fn binary() -> Command {
    let mut cmd = Command::cargo_bin("timelapse-dl").unwrap();
    cmd.env_remove("TIMELAPSE_USER")
        .env_remove("TIMELAPSE_PASS")
        .env_remove("RUST_LOG");
    cmd
}

/// Runs the binary off the async runtime so the mock server keeps serving.
async fn run_against(host: String, outdir: &TempDir, extra: &[&str]) -> std::process::Output {
    let outdir = outdir.path().to_path_buf();
    let extra: Vec<String> = extra.iter().map(ToString::to_string).collect();
    tokio::task::spawn_blocking(move || {
        binary()
            .args(["--host", host.as_str(), "--user", TEST_USER, "--pass", TEST_PASS])
            .arg("--outdir")
            .arg(&outdir)
            .args(["--no-progress", "--no-rate-limit", "--retry-delay", "0"])
            .args(&extra)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

#[test]
fn test_binary_help_displays_usage() {
    binary()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download timelapse archives"))
        .stdout(predicate::str::contains("--rate-limit"));
}

#[test]
fn test_binary_version_displays_version() {
    binary()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("timelapse-dl"));
}

#[test]
fn test_binary_missing_user_returns_error() {
    binary()
        .args(["--pass", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_binary_zero_rate_limit_is_rejected() {
    let dir = TempDir::new().unwrap();
    binary()
        .args(["--user", "u", "--pass", "p", "--rate-limit", "0"])
        .arg("--outdir")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid --rate-limit"));
}

#[test]
fn test_binary_invalid_host_is_catalog_failure() {
    let dir = TempDir::new().unwrap();
    binary()
        .args(["--host", "bad host", "--user", "u", "--pass", "p"])
        .arg("--outdir")
        .arg(dir.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "Fetching timelapse archives from bad host...",
        ))
        .stderr(predicate::str::contains("ERROR: Failed to fetch archives"));
}

#[test]
fn test_binary_unreachable_camera_is_catalog_failure() {
    let dir = TempDir::new().unwrap();
    binary()
        .args(["--host", "127.0.0.1:9", "--user", "u", "--pass", "p", "--timeout", "2"])
        .arg("--outdir")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ERROR: Failed to fetch archives"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_empty_catalog_exits_zero() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_listing(&server, &[]).await;
    let dir = TempDir::new().unwrap();

    run_against(server.address().to_string(), &dir, &[])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No timelapse archives found on camera.",
        ))
        .stdout(predicate::str::contains(
            "Done. downloaded=0 skipped=0 failed=0",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_downloads_then_skips() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let archives = [
        Archive::new(1, "a.zip", b"first archive"),
        Archive::new(2, "b.zip", b"second archive"),
    ];
    mount_camera(&server, &archives).await;
    let dir = TempDir::new().unwrap();
    let host = server.address().to_string();

    run_against(host.clone(), &dir, &[])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Found 2 timelapse archive(s) to download.",
        ))
        .stdout(predicate::str::contains("GET   http://"))
        .stdout(predicate::str::contains("SAVE  "))
        .stdout(predicate::str::contains(
            "Done. downloaded=2 skipped=0 failed=0",
        ));
    assert_eq!(
        std::fs::read(dir.path().join("a.zip")).unwrap(),
        b"first archive"
    );

    run_against(host, &dir, &[])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("SKIP  a.zip (already exists)"))
        .stdout(predicate::str::contains(
            "Done. downloaded=0 skipped=2 failed=0",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_failed_archive_exits_one() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let archives = [Archive::new(1, "missing.zip", b"")];
    mount_listing(&server, &archives).await;
    mount_export(&server, &archives[0], ResponseTemplate::new(404)).await;
    let dir = TempDir::new().unwrap();

    run_against(server.address().to_string(), &dir, &["--max-retries", "1"])
        .await
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FAIL  http://"))
        .stdout(predicate::str::contains(
            "Done. downloaded=0 skipped=0 failed=1",
        ));
    assert!(!dir.path().join("missing.zip").exists());
}
