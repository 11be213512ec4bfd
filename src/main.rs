//! burrow - local disk usage dashboard with live cleanup logs.
//!
//! Usage:
//!   burrow                    Start the dashboard server
//!   burrow analyze [PATH]     Size the immediate children of PATH
//!   burrow large [PATH]       List large files and compact folders
//!   burrow purge [PATH]       Find disposable build/dependency folders
//!   burrow --help             Show help

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use burrow_core::{ScanSettings, format_size};
use burrow_exec::default_log_path;
use burrow_scan::{LargeItemFinder, PurgeScanner, TopLevelBreakdown};
use burrow_server::{AppContext, DEFAULT_HOST, DEFAULT_PORT, ServerConfig, SysinfoMetrics, VERSION};

#[derive(Parser)]
#[command(
    name = "burrow",
    version,
    about = "Local disk usage dashboard with live cleanup logs",
    long_about = "burrow serves a local dashboard that shows where disk space goes \
                  and runs cleanup actions through the Mole CLI.\n\n\
                  Run `burrow` to start the server, or use subcommands for quick \
                  reports in the terminal."
)]
struct Cli {
    /// Port to run the server on
    #[arg(long, env = "MOLE_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Host to bind to (use 0.0.0.0 for all interfaces)
    #[arg(long, env = "MOLE_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Do not open a browser on start
    #[arg(long, env = "MOLE_NO_OPEN")]
    no_open: bool,

    /// Directory containing the Mole CLI
    #[arg(long, env = "MOLE_DIR")]
    mole_dir: Option<PathBuf>,

    /// Log file mirroring the live log stream
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Scanner configuration file (defaults to <config_dir>/burrow/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Size the immediate children of a directory
    Analyze {
        /// Directory to analyze (defaults to the home directory)
        path: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List large files and compact folders
    Large {
        /// Directory to scan (defaults to the home directory)
        path: Option<PathBuf>,

        /// Minimum size (e.g., "500MB", "1GB")
        #[arg(short, long)]
        min_size: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Find disposable build and dependency folders
    Purge {
        /// Directory to scan (defaults to the home directory)
        path: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let mut cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => ScanSettings::load(path),
        None => ScanSettings::load_default(),
    }
    .context("Failed to load scanner configuration")?;

    let Some(command) = cli.command.take() else {
        return run_server(cli, settings);
    };

    match command {
        Command::Analyze { path, format } => {
            let root = resolve_root(path.as_deref())?;
            eprintln!("Analyzing {}...", root.display());
            let entries = TopLevelBreakdown::new(&settings).scan(&root);
            print_entries(&entries, format)?;
        }
        Command::Large {
            path,
            min_size,
            format,
        } => {
            let root = resolve_root(path.as_deref())?;
            let mut finder = LargeItemFinder::new(&settings);
            if let Some(min_size) = &min_size {
                finder = finder.with_min_size(parse_size(min_size)?);
            }
            eprintln!("Scanning {} for large items...", root.display());
            let items = finder.scan(&root);
            print_entries(&items, format)?;
        }
        Command::Purge { path, format } => {
            let root = resolve_root(path.as_deref())?;
            eprintln!("Scanning {} for purge candidates...", root.display());
            let found = PurgeScanner::new(&settings).scan(&root);
            match format {
                OutputFormat::Text => {
                    let total: u64 = found.iter().map(|c| c.size).sum();
                    println!();
                    for candidate in &found {
                        println!(
                            " {:>10}  {:<14} {}",
                            candidate.size_human,
                            candidate.matched_pattern,
                            candidate.path.display()
                        );
                    }
                    println!();
                    println!(" {} candidates, {} reclaimable", found.len(), format_size(total));
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&found)?),
            }
        }
    }

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` overrides the `info` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

/// Start the dashboard server and block until Ctrl-C.
fn run_server(cli: Cli, settings: ScanSettings) -> Result<()> {
    let mut builder = ServerConfig::builder();
    builder
        .host(cli.host)
        .port(cli.port)
        .open_browser(!cli.no_open)
        .settings(settings);
    if let Some(dir) = cli.mole_dir {
        builder.tool_dir(dir);
    }
    if let Some(path) = cli.log_file.or_else(default_log_path) {
        builder.log_path(path);
    }
    let config = builder.build().map_err(|e| eyre!("Invalid server configuration: {e}"))?;

    eprintln!();
    eprintln!("  burrow {VERSION}");
    eprintln!("{}", "─".repeat(40));
    eprintln!("  Server:  {}", config.url());
    eprintln!("  Bind:    {}", config.bind_addr());
    if let Some(path) = &config.log_path {
        eprintln!("  Log:     {}", path.display());
    }
    eprintln!("{}", "─".repeat(40));
    eprintln!();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let metrics = Arc::new(SysinfoMetrics::new(&config.home, VERSION));
        let open_url = config.should_open_browser().then(|| config.url());
        let ctx = AppContext::new(config, metrics);

        if let Some(url) = open_url {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                open_browser(&url);
            });
        }

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!(target: "server", "shutting down");
        };
        burrow_server::serve(ctx, shutdown).await
    })?;

    Ok(())
}

/// Open `url` with the platform's default handler. Failures are ignored.
fn open_browser(url: &str) {
    if let Err(err) = open::that_detached(url) {
        tracing::debug!(target: "server", "cannot open browser: {err}");
    }
}

fn resolve_root(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => path.canonicalize().context("Invalid path"),
        None => dirs::home_dir().ok_or_else(|| eyre!("Cannot determine the home directory")),
    }
}

/// Print ranked entries as a table or JSON.
fn print_entries(entries: &[burrow_core::ScanEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let total: u64 = entries.iter().map(|e| e.size).sum();
            println!();
            for entry in entries {
                let ratio = if total > 0 {
                    entry.size as f64 / total as f64
                } else {
                    0.0
                };
                println!(
                    " {:>10} {:>5.1}% {} {}{}",
                    entry.size_human,
                    ratio * 100.0,
                    make_bar(ratio, 10),
                    entry.name,
                    if entry.is_dir { "/" } else { "" }
                );
            }
            println!();
            println!(" {} entries, {}", entries.len(), format_size(total));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
    }
    Ok(())
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');

    let multiplier: u64 = if s.ends_with("GB") || s.ends_with('G') {
        1024 * 1024 * 1024
    } else if s.ends_with("MB") || s.ends_with('M') {
        1024 * 1024
    } else if s.ends_with("KB") || s.ends_with('K') {
        1024
    } else {
        1
    };

    let num: f64 = digits
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;
    Ok((num * multiplier as f64) as u64)
}
