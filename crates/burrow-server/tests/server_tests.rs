//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use burrow_exec::{BroadcastHub, ToolLocator};
use burrow_scan::{DiskUsage, Volume};
use burrow_server::{AppContext, LOG_HELLO, ServerConfig, StaticMetrics, router};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn context(home: &Path, log_path: Option<&Path>) -> AppContext {
    let metrics = StaticMetrics::new(
        home,
        DiskUsage {
            total: 1000,
            used: 500,
            free: 500,
        },
    );
    context_with(home, log_path, metrics)
}

fn context_with(home: &Path, log_path: Option<&Path>, metrics: StaticMetrics) -> AppContext {
    let mut builder = ServerConfig::builder();
    builder.home(home).open_browser(false);
    if let Some(path) = log_path {
        builder.log_path(path);
    }
    let config = builder.build().unwrap();

    let hub = match &config.log_path {
        Some(path) => BroadcastHub::with_log_file(path),
        None => BroadcastHub::new(),
    };
    let locator = ToolLocator::with_paths(hub.clone(), [home.join("no-such-tool")]);
    AppContext::with_locator(config, Arc::new(metrics), hub, locator)
}

fn sized_file(path: &Path, len: u64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::File::create(path).unwrap().set_len(len).unwrap();
}

async fn get_json(ctx: &AppContext, uri: &str) -> (StatusCode, Value) {
    let response = router(ctx.clone())
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn send_json(ctx: &AppContext, method: Method, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router(ctx.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_health() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), None);

    let (status, body) = get_json(&ctx, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_analyze_defaults_to_home() {
    let temp = TempDir::new().unwrap();
    sized_file(&temp.path().join("media/film.mkv"), 5000);
    sized_file(&temp.path().join("notes.txt"), 10);
    let ctx = context(temp.path(), None);

    let (status, body) = get_json(&ctx, "/api/analyze").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "media");
    assert_eq!(entries[0]["size"], 5000);
    assert_eq!(entries[0]["is_dir"], true);
    assert!(entries[0]["size_human"].is_string());
}

#[tokio::test]
async fn test_analyze_missing_path_is_empty_list() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), None);
    let uri = format!("/api/analyze?path={}/missing", temp.path().display());

    let (status, body) = get_json(&ctx, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn test_analyze_large_with_min_size() {
    let temp = TempDir::new().unwrap();
    sized_file(&temp.path().join("big.bin"), 10_000_000);
    sized_file(&temp.path().join("small.txt"), 1000);
    sized_file(&temp.path().join("node_modules/x.js"), 5_000_000);
    let ctx = context(temp.path(), None);

    let (status, body) = get_json(&ctx, "/api/analyze/large?min_size=1000000").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["big.bin", "node_modules"]);
}

#[tokio::test]
async fn test_purge_scan_reports_type() {
    let temp = TempDir::new().unwrap();
    sized_file(&temp.path().join("app/dist/bundle.js"), 300);
    let ctx = context(temp.path(), None);

    let (status, body) = get_json(&ctx, "/api/purge/scan").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["type"], "dist");
    assert_eq!(body[0]["size"], 300);
}

#[tokio::test]
async fn test_storage_breakdown_uses_metrics_disk() {
    let temp = TempDir::new().unwrap();
    sized_file(&temp.path().join("Documents/report.pdf"), 100);
    let ctx = context(temp.path(), None);

    let (status, body) = get_json(&ctx, "/api/storage/breakdown").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1000);
    assert_eq!(body["used"], 500);
    let documents = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Documents")
        .unwrap();
    assert_eq!(documents["percent"], 20.0);
}

#[tokio::test]
async fn test_analyze_other_reports_total() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), None);

    let (status, body) = get_json(&ctx, "/api/storage/analyze-other").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["total_other"].as_u64().unwrap() <= 500);
    assert!(body["total_other_human"].is_string());
    assert!(body["categories"].is_array());
}

#[tokio::test]
async fn test_volumes_listed_from_metrics() {
    let temp = TempDir::new().unwrap();
    let disk = DiskUsage {
        total: 1000,
        used: 500,
        free: 500,
    };
    let metrics = StaticMetrics::new(temp.path(), disk)
        .with_volumes(vec![Volume::new("/dev/disk3s1", "/", 1000, 400)]);
    let ctx = context_with(temp.path(), None, metrics);

    let (status, body) = get_json(&ctx, "/api/volumes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["mount_point"], "/");
    assert_eq!(body[0]["used_bytes"], 600);
    assert_eq!(body[0]["is_main"], true);
}

#[tokio::test]
async fn test_analyze_volume_by_path() {
    let temp = TempDir::new().unwrap();
    sized_file(&temp.path().join("docker/disk.raw"), 300 * 1024 * 1024);
    sized_file(&temp.path().join("small.txt"), 10);
    let ctx = context(temp.path(), None);
    let uri = format!("/api/volumes/analyze?path={}", temp.path().display());

    let (status, body) = get_json(&ctx, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_size"], 300 * 1024 * 1024);
    assert_eq!(body["categories"][0]["name"], "docker");
    assert_eq!(body["categories"][0]["icon"], "docker");
    assert_eq!(body["categories"][0]["percent"], 100.0);
}

#[tokio::test]
async fn test_clean_without_tool_reports_in_body() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), None);

    let (status, body) = send_json(&ctx, Method::POST, "/api/clean?category=all", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(outcome["success"], false);
    assert_eq!(outcome["message"], "Mole CLI not found");
    assert!(outcome.get("output").is_none());
}

#[tokio::test]
async fn test_uninstall_without_apps() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), None);

    let (status, body) =
        send_json(&ctx, Method::POST, "/api/uninstall", serde_json::json!({ "apps": [] })).await;
    assert_eq!(status, StatusCode::OK);
    let outcomes: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(outcomes[0]["message"], "No apps specified");
}

#[tokio::test]
async fn test_delete_files() {
    let temp = TempDir::new().unwrap();
    let victim = temp.path().join("old.dmg");
    sized_file(&victim, 2048);
    let ctx = context(temp.path(), None);

    let body = serde_json::json!({ "paths": [victim, "/etc"] });
    let (status, bytes) = send_json(&ctx, Method::DELETE, "/api/files", body).await;
    assert_eq!(status, StatusCode::OK);

    let report: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(report["success"], false);
    assert_eq!(report["deleted_count"], 1);
    assert_eq!(report["deleted_size"], 2048);
    assert_eq!(report["errors"][0], "Protected system path");
    assert!(!victim.exists());
}

#[tokio::test]
async fn test_delete_files_requires_paths() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), None);

    let (status, body) =
        send_json(&ctx, Method::POST, "/api/files", serde_json::json!({ "paths": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "No paths specified");
}

#[tokio::test]
async fn test_debug_logs() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("logs/web-ui.log");
    let ctx = context(temp.path(), Some(&log_path));

    let response = router(ctx.clone())
        .oneshot(Request::get("/api/debug/logs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"No log file found yet.");

    ctx.hub.log("scan started");
    let response = router(ctx.clone())
        .oneshot(Request::get("/api/debug/logs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&bytes).trim_end().ends_with(" scan started"));
}

#[tokio::test]
async fn test_log_stream_relays_hub_lines() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), None);

    let response = router(ctx.clone())
        .oneshot(Request::get("/api/logs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut body = response.into_body();
    ctx.hub.publish("removing caches");

    let mut received = String::new();
    let read = async {
        while !received.contains("removing caches") {
            let frame = body.frame().await.unwrap().unwrap();
            if let Ok(data) = frame.into_data() {
                received.push_str(&String::from_utf8_lossy(&data));
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read).await.unwrap();

    assert!(received.starts_with(&format!("data: {LOG_HELLO}\n\n")));
    assert!(received.contains("data: removing caches\n\n"));

    drop(body);
    assert_eq!(ctx.hub.subscriber_count(), 0);
}
