//! External command execution with live output streaming.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

use burrow_core::CommandOutcome;

use crate::ExecError;
use crate::ansi::strip_ansi;
use crate::hub::BroadcastHub;

/// Message of a command that exited successfully.
pub const SUCCESS_MESSAGE: &str = "Completed successfully";

/// How output lines are published while a command runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BroadcastStyle {
    /// Publish lines exactly as the child printed them.
    #[default]
    Raw,
    /// Publish lines with terminal control sequences removed.
    Stripped,
}

/// Working directory, environment and broadcast style for a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub current_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub style: BroadcastStyle,
}

impl RunOptions {
    /// Options with no working directory, no extra environment and raw lines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the child in `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Add an environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the broadcast style.
    pub fn style(mut self, style: BroadcastStyle) -> Self {
        self.style = style;
        self
    }
}

/// Runs child processes, streaming each output line to the hub.
///
/// Stdout and stderr are drained concurrently by one task each, so the
/// relative order of lines from the two streams is not deterministic.
/// There is no timeout: the child is always awaited to completion.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    hub: BroadcastHub,
}

impl CommandRunner {
    /// Create a runner publishing to `hub`.
    pub fn new(hub: BroadcastHub) -> Self {
        Self { hub }
    }

    /// The hub receiving output lines.
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Run `program` with `args` and wait for it to exit.
    ///
    /// `success` reflects the exit status only. `output` holds every line
    /// from both streams with control sequences removed, and is returned
    /// for failed runs too.
    pub async fn run<I, S>(&self, program: &Path, args: I, options: &RunOptions) -> CommandOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        let rendered = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");

        let mut command = Command::new(program);
        command
            .args(&args)
            .envs(options.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &options.current_dir {
            command.current_dir(dir);
        }

        self.hub.log(format!("Running command: {} {rendered}", program.display()));

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = ExecError::spawn(program, source);
                tracing::warn!(target: "exec", "{err}");
                self.hub.publish(format!("Error starting command: {err}"));
                return CommandOutcome::failed(err.to_string());
            }
        };

        let buffer = Arc::new(Mutex::new(String::new()));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(self.spawn_reader(stdout, &buffer, options.style));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(self.spawn_reader(stderr, &buffer, options.style));
        }

        let status = child.wait().await;
        for reader in readers {
            let _ = reader.await;
        }

        let output = {
            let buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
            strip_ansi(&buffer).into_owned()
        };

        let outcome = match status {
            Ok(status) if status.success() => CommandOutcome::succeeded(SUCCESS_MESSAGE),
            Ok(status) => CommandOutcome::failed(exit_message(status)),
            Err(err) => CommandOutcome::failed(err.to_string()),
        };
        tracing::debug!(target: "exec", "{} finished: {}", program.display(), outcome.message);

        outcome.with_output(output)
    }

    fn spawn_reader<R>(
        &self,
        stream: R,
        buffer: &Arc<Mutex<String>>,
        style: BroadcastStyle,
    ) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let hub = self.hub.clone();
        let buffer = Arc::clone(buffer);

        tokio::spawn(async move {
            let mut reader = BufReader::new(stream);
            let mut raw = Vec::new();
            loop {
                raw.clear();
                match reader.read_until(b'\n', &mut raw).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                let text = String::from_utf8_lossy(&raw);
                let line = text.trim_end_matches(['\n', '\r']);

                {
                    let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                    buffer.push_str(line);
                    buffer.push('\n');
                }

                match style {
                    BroadcastStyle::Raw => hub.publish(line),
                    BroadcastStyle::Stripped => hub.publish(strip_ansi(line)),
                }
            }
        })
    }
}

fn exit_message(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status {code}"),
        None => status.to_string(),
    }
}
