//! Synchronous command execution.

use crate::command::ShellCommand;
use crate::error::{TrainingError, TrainingResult};
use async_trait::async_trait;
use std::fmt;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStdout, Command};
use tracing::debug;

/// Exit status of a finished command. `code` is `None` when killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    code: Option<i32>,
}

impl CommandStatus {
    pub const SUCCESS: Self = Self { code: Some(0) };

    #[must_use]
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for CommandStatus {
    fn from(status: ExitStatus) -> Self {
        Self { code: status.code() }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => f.write_str("termination by signal"),
        }
    }
}

/// Output of [`CommandRunner::run_capturing_lines`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedLines {
    /// Stdout lines, each trimmed.
    pub lines: Vec<String>,
    pub success: bool,
}

/// Runs opaque commands to completion.
///
/// Implementations only fail when a command cannot be started; a non-zero exit
/// is reported through the returned status and every caller decides what it means.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ShellCommand) -> TrainingResult<CommandStatus>;

    async fn run_capturing_lines(&self, command: &ShellCommand) -> TrainingResult<CapturedLines>;
}

/// Runs commands through `sh -c`, inheriting the environment.
///
/// Child stdout is sent to our stderr so stdout stays free for the final report.
#[derive(Debug, Default, Clone)]
pub struct ShellRunner;

impl ShellRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn shell(line: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

/// Collect trimmed stdout lines, replacing invalid UTF-8 instead of failing.
async fn read_lossy_lines(stdout: ChildStdout, lines: &mut Vec<String>) -> std::io::Result<()> {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        lines.push(String::from_utf8_lossy(&buf).trim().to_string());
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &ShellCommand) -> TrainingResult<CommandStatus> {
        let line = command.to_shell_string();
        debug!("Executing command: {line}");

        let status = Self::shell(&line)
            .stdout(Stdio::from(std::io::stderr()))
            .status()
            .await
            .map_err(|source| TrainingError::Spawn { command: line.clone(), source })?;
        Ok(status.into())
    }

    async fn run_capturing_lines(&self, command: &ShellCommand) -> TrainingResult<CapturedLines> {
        let line = command.to_shell_string();
        debug!("Executing command: {line}");

        let mut child = Self::shell(&line)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| TrainingError::Spawn { command: line.clone(), source })?;

        let mut lines = Vec::new();
        let read = match child.stdout.take() {
            Some(stdout) => read_lossy_lines(stdout, &mut lines).await,
            None => Ok(()),
        };
        let status = child.wait().await?;
        read?;
        Ok(CapturedLines { lines, success: status.success() })
    }
}
