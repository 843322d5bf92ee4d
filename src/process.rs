//! Subprocess execution with bounded runtimes

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

/// Default time budget for one subprocess.
///
/// Builds dominate the runtime here and can legitimately take a long time,
/// so the bound exists to surface hangs, not to police slowness.
const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// One subprocess invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program to execute.
    pub program: String,
    /// Arguments, excluding the program itself.
    pub args: Vec<String>,
    /// Working directory (inherited when unset).
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered over the inherited ones.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Build a spec from a program and its arguments.
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Run in `dir` instead of the inherited working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Add one environment variable on top of the inherited environment.
    #[must_use]
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code (-1 when the process was terminated by a signal).
    pub code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited with status zero.
    pub const fn success(&self) -> bool {
        self.code == 0
    }
}

/// Capability to execute subprocesses.
///
/// The engine never talks to `std::process` directly; everything goes
/// through this trait so tests can script git and nix interactions.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion and capture output.
    ///
    /// A non-zero exit is a successful *run* here; callers that require
    /// status zero use [`ProcessRunner::run_checked`].
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Run and require exit status zero, returning captured stdout.
    async fn run_checked(&self, spec: &CommandSpec) -> Result<String> {
        let output = self.run(spec).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(Error::CommandFailed {
                command: spec.to_string(),
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }
}

/// [`ProcessRunner`] backed by `tokio::process` with a wall-clock bound.
#[derive(Debug, Clone)]
pub struct TokioRunner {
    timeout: Duration,
}

impl TokioRunner {
    /// Runner with the default time budget.
    pub const fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Runner with an explicit time budget per invocation.
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %spec, "running subprocess");

        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|source| Error::CommandSpawn {
            program: spec.program.clone(),
            source,
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::CommandTimeout {
                command: spec.to_string(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|source| Error::CommandSpawn {
                program: spec.program.clone(),
                source,
            })?;

        let result = CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %spec, code = result.code, "subprocess finished");
        Ok(result)
    }
}
