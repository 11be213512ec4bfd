//! HTTP API and server-sent event streams for burrow.
//!
//! The router exposes the scan modes, the cleanup actions and two live
//! streams: `/api/logs` relays every line published to the hub, and
//! `/api/status/stream` pushes a metrics snapshot every two seconds.

mod config;
mod error;
mod metrics;
mod routes;
mod sse;
mod state;

use std::future::Future;

pub use config::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use metrics::{
    CpuInfo, DiskInfo, MemoryInfo, MetricsProvider, NetworkInfo, StaticMetrics, SysinfoMetrics,
    SystemStatus, format_uptime,
};
pub use routes::router;
pub use sse::{LOG_HELLO, STATUS_HELLO, STATUS_INTERVAL, into_sse, log_events, status_events};
pub use state::{AppContext, VERSION};

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn serve<F>(ctx: AppContext, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = ctx.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!(target: "server", "listening on {addr}");
    ctx.hub.log(format!("Server listening on {}", ctx.config.url()));

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}
