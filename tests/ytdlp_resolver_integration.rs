//! Integration tests for the yt-dlp resolver against stand-in executables.
#![cfg(unix)]

use clipfetch_core::{DownloadTarget, Resolver, TargetRequest, YtDlpResolver};
use tempfile::TempDir;

mod support;
use support::fake_ytdlp::{write_failing_script, write_working_script};

#[tokio::test]
async fn test_discover_formats_keeps_tool_order() {
    let bin = TempDir::new().unwrap();
    let resolver = YtDlpResolver::with_program(write_working_script(bin.path()));

    let formats = resolver
        .discover_formats("https://example.com/watch?v=1")
        .await
        .unwrap();

    let ids: Vec<&str> = formats.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["18", "140", "sb0"]);
    assert!(formats[0].has_video_track());
    assert!(!formats[1].has_video_track());
    assert!(!formats[2].has_direct_url());
    assert_eq!(formats[0].height, Some(360));
}

#[tokio::test]
async fn test_direct_link_resolution_returns_format_url() {
    let bin = TempDir::new().unwrap();
    let resolver = YtDlpResolver::with_program(write_working_script(bin.path()));

    let target = resolver
        .resolve_download_target("https://example.com/watch?v=1", "140", &TargetRequest::DirectLink)
        .await
        .unwrap();

    assert_eq!(
        target,
        DownloadTarget::DirectLink {
            url: "https://cdn.example/140.m4a".to_string()
        }
    );
}

#[tokio::test]
async fn test_direct_link_for_unknown_format_fails() {
    let bin = TempDir::new().unwrap();
    let resolver = YtDlpResolver::with_program(write_working_script(bin.path()));

    let err = resolver
        .resolve_download_target("https://example.com/watch?v=1", "999", &TargetRequest::DirectLink)
        .await
        .unwrap_err();
    assert!(err.message.contains("999"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_direct_link_for_format_without_url_fails() {
    let bin = TempDir::new().unwrap();
    let resolver = YtDlpResolver::with_program(write_working_script(bin.path()));

    let err = resolver
        .resolve_download_target("https://example.com/watch?v=1", "sb0", &TargetRequest::DirectLink)
        .await
        .unwrap_err();
    assert!(err.message.contains("no direct download link"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_materialize_writes_title_named_file() {
    let bin = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let resolver = YtDlpResolver::with_program(write_working_script(bin.path()));

    let target = resolver
        .resolve_download_target(
            "https://example.com/watch?v=1",
            "18",
            &TargetRequest::Materialize {
                destination_dir: out.path().to_path_buf(),
            },
        )
        .await
        .unwrap();

    let expected = out.path().join("My Video.mp4");
    assert_eq!(
        target,
        DownloadTarget::Materialized {
            title: "My Video".to_string(),
            path: expected.clone(),
        }
    );
    assert!(expected.exists(), "file should have been written");
}

#[tokio::test]
async fn test_tool_failure_reports_last_stderr_line() {
    let bin = TempDir::new().unwrap();
    let resolver = YtDlpResolver::with_program(write_failing_script(
        bin.path(),
        "ERROR: [youtube] abc: Video unavailable",
    ));

    let err = resolver
        .discover_formats("https://example.com/watch?v=abc")
        .await
        .unwrap_err();
    assert_eq!(err.message, "ERROR: [youtube] abc: Video unavailable");
}

#[tokio::test]
async fn test_missing_executable_names_program() {
    let bin = TempDir::new().unwrap();
    let missing = bin.path().join("no-such-yt-dlp");
    let resolver = YtDlpResolver::with_program(&missing);

    let err = resolver
        .discover_formats("https://example.com/watch?v=1")
        .await
        .unwrap_err();
    assert!(err.message.contains("no-such-yt-dlp"), "unexpected error: {err}");
    assert!(err.message.contains("ytdlp_path"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_blank_url_is_rejected_without_spawning() {
    let bin = TempDir::new().unwrap();
    let resolver = YtDlpResolver::with_program(bin.path().join("never-run"));

    let err = resolver.discover_formats("   ").await.unwrap_err();
    assert!(!err.message.contains("never-run"), "should not spawn: {err}");
}
