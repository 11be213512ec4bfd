//! Process-wide context shared by every handler.

use std::sync::Arc;

use burrow_exec::{BroadcastHub, CommandRunner, Maintenance, ToolLocator};

use crate::config::ServerConfig;
use crate::metrics::MetricsProvider;

/// Version reported by the health and status endpoints.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Built once at startup and cloned into each request.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub hub: BroadcastHub,
    pub maintenance: Arc<Maintenance>,
    pub metrics: Arc<dyn MetricsProvider>,
}

impl AppContext {
    /// Wire the hub, runner and actions together from `config`.
    pub fn new(config: ServerConfig, metrics: Arc<dyn MetricsProvider>) -> Self {
        let hub = match &config.log_path {
            Some(path) => BroadcastHub::with_log_file(path),
            None => BroadcastHub::new(),
        };
        let locator = ToolLocator::new(hub.clone(), config.tool_dir.as_deref());
        Self::with_locator(config, metrics, hub, locator)
    }

    /// Like [`new`](Self::new), with an explicit hub and tool locator.
    pub fn with_locator(
        config: ServerConfig,
        metrics: Arc<dyn MetricsProvider>,
        hub: BroadcastHub,
        locator: ToolLocator,
    ) -> Self {
        let runner = CommandRunner::new(hub.clone());
        let maintenance = Maintenance::new(runner, locator, &config.settings);

        Self {
            config: Arc::new(config),
            hub,
            maintenance: Arc::new(maintenance),
            metrics,
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("subscribers", &self.hub.subscriber_count())
            .finish_non_exhaustive()
    }
}
