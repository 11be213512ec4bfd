//! HTTP routes.
//!
//! Scans run on the blocking pool and always answer 200 with a possibly
//! empty list. Command failures are reported inside the outcome body, not
//! as HTTP errors.

use std::path::PathBuf;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use burrow_core::{CommandOutcome, PurgeCandidate, ScanEntry};
use burrow_exec::DeleteReport;
use burrow_scan::{
    LargeItemFinder, OtherBreakdown, PurgeScanner, StorageBreakdown, TopLevelBreakdown, Volume,
    VolumeAnalysis, VolumeAnalyzer, other_breakdown, storage_breakdown,
};

use crate::error::ServerError;
use crate::metrics::SystemStatus;
use crate::sse;
use crate::state::{AppContext, VERSION};

const NO_LOG_FILE: &str = "No log file found yet.";

/// Build the API router.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/status/stream", get(status_stream))
        .route("/api/logs", get(log_stream))
        .route("/api/debug/logs", get(debug_logs))
        .route("/api/analyze", get(analyze))
        .route("/api/analyze/large", get(analyze_large))
        .route("/api/analyze/downloads", get(analyze_downloads))
        .route("/api/storage/breakdown", get(breakdown))
        .route("/api/storage/analyze-other", get(analyze_other))
        .route("/api/volumes", get(volumes))
        .route("/api/volumes/analyze", get(analyze_volume))
        .route("/api/purge/scan", get(purge_scan))
        .route("/api/purge", post(purge))
        .route("/api/clean/preview", get(clean_preview))
        .route("/api/clean", post(clean))
        .route("/api/uninstall", post(uninstall))
        .route("/api/updates/perform", post(perform_update))
        .route("/api/files", post(delete_files).delete(delete_files))
        .with_state(ctx)
}

#[derive(Debug, Default, Deserialize)]
struct PathQuery {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LargeQuery {
    path: Option<PathBuf>,
    min_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CleanQuery {
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PathsRequest {
    #[serde(default)]
    paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct UninstallRequest {
    #[serde(default)]
    apps: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    name: String,
}

fn scan_root(ctx: &AppContext, path: Option<PathBuf>) -> PathBuf {
    path.filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| ctx.config.home.clone())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": VERSION }))
}

async fn status(State(ctx): State<AppContext>) -> Result<Json<SystemStatus>, ServerError> {
    let metrics = ctx.metrics.clone();
    let snapshot = tokio::task::spawn_blocking(move || metrics.snapshot()).await?;
    Ok(Json(snapshot))
}

async fn status_stream(State(ctx): State<AppContext>) -> impl IntoResponse {
    sse::into_sse(sse::status_events(ctx.metrics.clone(), sse::STATUS_INTERVAL))
}

async fn log_stream(State(ctx): State<AppContext>) -> impl IntoResponse {
    sse::into_sse(sse::log_events(ctx.hub.subscribe()))
}

async fn debug_logs(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ServerError> {
    let text = match ctx.hub.log_path() {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => NO_LOG_FILE.to_string(),
            Err(err) => return Err(ServerError::LogFile(err)),
        },
        None => NO_LOG_FILE.to_string(),
    };
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

async fn analyze(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Vec<ScanEntry>>, ServerError> {
    let root = scan_root(&ctx, query.path);
    let scanner = TopLevelBreakdown::new(&ctx.config.settings);
    let entries = tokio::task::spawn_blocking(move || scanner.scan(&root)).await?;
    Ok(Json(entries))
}

async fn analyze_large(
    State(ctx): State<AppContext>,
    Query(query): Query<LargeQuery>,
) -> Result<Json<Vec<ScanEntry>>, ServerError> {
    let root = scan_root(&ctx, query.path);
    let mut finder = LargeItemFinder::new(&ctx.config.settings);
    // An unparsable minimum keeps the configured default.
    if let Some(min_size) = query.min_size.and_then(|s| s.trim().parse::<u64>().ok()) {
        finder = finder.with_min_size(min_size);
    }
    let items = tokio::task::spawn_blocking(move || finder.scan(&root)).await?;
    Ok(Json(items))
}

async fn analyze_downloads(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<ScanEntry>>, ServerError> {
    let root = ctx.config.home.join("Downloads");
    let scanner = TopLevelBreakdown::new(&ctx.config.settings);
    let entries = tokio::task::spawn_blocking(move || scanner.scan(&root)).await?;
    Ok(Json(entries))
}

async fn breakdown(State(ctx): State<AppContext>) -> Result<Json<StorageBreakdown>, ServerError> {
    let report = tokio::task::spawn_blocking(move || {
        let disk = ctx.metrics.disk_usage();
        storage_breakdown(&ctx.config.home, disk, &ctx.config.settings)
    })
    .await?;
    Ok(Json(report))
}

async fn analyze_other(State(ctx): State<AppContext>) -> Result<Json<OtherBreakdown>, ServerError> {
    let report = tokio::task::spawn_blocking(move || {
        let disk = ctx.metrics.disk_usage();
        other_breakdown(&ctx.config.home, disk, &ctx.config.settings)
    })
    .await?;
    Ok(Json(report))
}

async fn volumes(State(ctx): State<AppContext>) -> Result<Json<Vec<Volume>>, ServerError> {
    let metrics = ctx.metrics.clone();
    let volumes = tokio::task::spawn_blocking(move || metrics.volumes()).await?;
    Ok(Json(volumes))
}

async fn analyze_volume(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<VolumeAnalysis>, ServerError> {
    let root = query
        .path
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("/"));
    let analyzer = VolumeAnalyzer::new(&ctx.config.settings);
    let analysis = tokio::task::spawn_blocking(move || analyzer.analyze(&root)).await?;
    Ok(Json(analysis))
}

async fn purge_scan(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Vec<PurgeCandidate>>, ServerError> {
    let root = scan_root(&ctx, query.path);
    let scanner = PurgeScanner::new(&ctx.config.settings);
    let found = tokio::task::spawn_blocking(move || scanner.scan(&root)).await?;
    Ok(Json(found))
}

async fn purge(
    State(ctx): State<AppContext>,
    Json(request): Json<PathsRequest>,
) -> Result<Json<CommandOutcome>, ServerError> {
    let maintenance = ctx.maintenance.clone();
    let outcome = tokio::task::spawn_blocking(move || maintenance.purge(&request.paths)).await?;
    Ok(Json(outcome))
}

async fn clean_preview(State(ctx): State<AppContext>) -> Json<CommandOutcome> {
    Json(ctx.maintenance.clean_preview().await)
}

async fn clean(
    State(ctx): State<AppContext>,
    Query(query): Query<CleanQuery>,
) -> Json<CommandOutcome> {
    Json(ctx.maintenance.clean(query.category.as_deref()).await)
}

async fn uninstall(
    State(ctx): State<AppContext>,
    Json(request): Json<UninstallRequest>,
) -> Json<Vec<CommandOutcome>> {
    Json(vec![ctx.maintenance.uninstall(&request.apps).await])
}

async fn perform_update(
    State(ctx): State<AppContext>,
    Json(request): Json<UpdateRequest>,
) -> Json<CommandOutcome> {
    Json(ctx.maintenance.update(&request.name).await)
}

async fn delete_files(
    State(ctx): State<AppContext>,
    Json(request): Json<PathsRequest>,
) -> Result<Json<DeleteReport>, ServerError> {
    let maintenance = ctx.maintenance.clone();
    let report =
        tokio::task::spawn_blocking(move || maintenance.remove_paths(&request.paths)).await??;
    Ok(Json(report))
}
