//! Long-lived request/response subprocess.

use crate::command::ShellCommand;
use crate::error::{TrainingError, TrainingResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

/// How long a freshly spawned child must stay alive to count as started.
pub const STARTUP_GRACE: Duration = Duration::from_millis(250);

/// A child process addressed one line in, one line out.
///
/// Calls are strictly sequential (`&mut self`). The child is killed if the
/// channel is dropped without [`PipeChannel::close`].
pub struct PipeChannel {
    command: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl PipeChannel {
    /// Spawn `command` and check it is still running after [`STARTUP_GRACE`].
    ///
    /// A missing executable only shows up once the shell has tried to exec
    /// it, so the child gets a short window to fail before it counts as started.
    pub async fn open(command: &ShellCommand) -> TrainingResult<Self> {
        let line = command.to_shell_string();
        debug!("Starting up process: {line}");

        let startup_error =
            |reason: String| TrainingError::ScorerStartup { command: line.clone(), reason };

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&line)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| startup_error(e.to_string()))?;

        // Taken before waiting: `Child::wait` closes a stdin it still owns.
        let stdin =
            child.stdin.take().ok_or_else(|| startup_error("stdin not captured".to_string()))?;
        let stdout =
            child.stdout.take().ok_or_else(|| startup_error("stdout not captured".to_string()))?;

        if let Ok(exited) = tokio::time::timeout(STARTUP_GRACE, child.wait()).await {
            let status = exited.map_err(|e| startup_error(e.to_string()))?;
            return Err(startup_error(format!("exited during startup with {status}")));
        }

        Ok(Self { command: line, child, stdin, stdout: BufReader::new(stdout) })
    }

    /// Write `message` plus a newline, then read back exactly one trimmed line.
    ///
    /// Returns an empty string if the child closed its output.
    pub async fn send_receive(&mut self, message: &str) -> TrainingResult<String> {
        debug!("Sending {message:?} to {}", self.command);
        let mut request = message.trim().to_string();
        request.push('\n');

        self.stdin.write_all(request.as_bytes()).await.map_err(TrainingError::ScorerChannel)?;
        self.stdin.flush().await.map_err(TrainingError::ScorerChannel)?;

        let mut response = String::new();
        self.stdout.read_line(&mut response).await.map_err(TrainingError::ScorerChannel)?;
        Ok(response.trim().to_string())
    }

    /// Close the child's stdin and wait for it to exit.
    pub async fn close(self) -> TrainingResult<()> {
        let Self { command, mut child, stdin, stdout } = self;
        drop(stdin);
        drop(stdout);
        let status = child.wait().await?;
        debug!("{command} exited with {status}");
        Ok(())
    }
}
