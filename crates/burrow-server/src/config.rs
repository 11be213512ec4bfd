//! Server configuration.

use std::path::PathBuf;

use derive_builder::Builder;

use burrow_core::ScanSettings;

/// Default bind host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Everything needed to start the dashboard server.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ServerConfig {
    /// Host to bind to.
    #[builder(default = "DEFAULT_HOST.to_string()")]
    pub host: String,

    /// Port to listen on.
    #[builder(default = "DEFAULT_PORT")]
    pub port: u16,

    /// Open the dashboard in a browser once listening.
    #[builder(default = "true")]
    pub open_browser: bool,

    /// Directory checked first for the maintenance CLI.
    #[builder(default, setter(into, strip_option))]
    pub tool_dir: Option<PathBuf>,

    /// Append-only log file mirroring the live log stream.
    #[builder(default, setter(into, strip_option))]
    pub log_path: Option<PathBuf>,

    /// Directory scanned when a request names no path.
    #[builder(default = "default_home()")]
    pub home: PathBuf,

    /// Scanner tunables.
    #[builder(default)]
    pub settings: ScanSettings,
}

fn default_home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

impl ServerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                return Err("host cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl ServerConfig {
    /// Create a new config builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL a local browser should open.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Whether opening a browser makes sense for this bind host.
    pub fn should_open_browser(&self) -> bool {
        self.open_browser && self.host == DEFAULT_HOST
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            open_browser: true,
            tool_dir: None,
            log_path: None,
            home: default_home(),
            settings: ScanSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ServerConfig::builder().build().unwrap();
        assert_eq!(config.bind_addr(), "localhost:8080");
        assert!(config.should_open_browser());
        assert!(config.tool_dir.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ServerConfig::builder()
            .host("0.0.0.0")
            .port(9000u16)
            .tool_dir("/opt/mole")
            .build()
            .unwrap();
        assert_eq!(config.url(), "http://0.0.0.0:9000");
        assert!(!config.should_open_browser());
        assert_eq!(config.tool_dir, Some(PathBuf::from("/opt/mole")));
    }

    #[test]
    fn test_builder_rejects_empty_host() {
        assert!(ServerConfig::builder().host("  ").build().is_err());
    }
}
