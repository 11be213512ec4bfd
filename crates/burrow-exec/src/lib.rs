//! Live log broadcasting and external command execution for burrow.
//!
//! [`BroadcastHub`] fans log lines out to any number of subscribers and
//! mirrors them to a timestamped log file. [`CommandRunner`] runs a child
//! process, streaming each output line through the hub while collecting
//! the combined output. [`Maintenance`] builds the dashboard's cleanup
//! actions on top of both.

mod actions;
mod ansi;
mod error;
mod hub;
mod locator;
mod runner;

pub use actions::{DeleteReport, Maintenance, PROTECTED_PREFIXES, UpdateTarget, is_protected_path};
pub use ansi::strip_ansi;
pub use error::ExecError;
pub use hub::{BroadcastHub, SUBSCRIBER_CAPACITY, Subscription, default_log_path};
pub use locator::{TOOL_NAME, ToolLocator};
pub use runner::{BroadcastStyle, CommandRunner, RunOptions, SUCCESS_MESSAGE};

pub use burrow_core::CommandOutcome;
