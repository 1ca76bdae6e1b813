//! Distributed filesystem access through the `hadoop fs` client.

use crate::command::ShellCommand;
use crate::error::{TrainingError, TrainingResult};
use crate::runner::CommandRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Join a name onto an HDFS directory.
#[must_use]
pub fn hdfs_join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name.trim_start_matches('/'))
}

/// Thin gateway over `<hadoop> fs <subcommand>`.
#[derive(Clone)]
pub struct DistributedFs {
    runner: Arc<dyn CommandRunner>,
    hadoop_bin: PathBuf,
}

impl DistributedFs {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, hadoop_bin: PathBuf) -> Self {
        Self { runner, hadoop_bin }
    }

    #[must_use]
    pub fn fs_command(&self, subcommand: &str) -> ShellCommand {
        ShellCommand::from_path(&self.hadoop_bin).args(["fs", subcommand])
    }

    /// True if `dir` is a directory.
    pub async fn exists(&self, dir: &str) -> TrainingResult<bool> {
        let status = self.runner.run(&self.fs_command("-test").args(["-d", dir])).await?;
        Ok(status.success())
    }

    /// True if `path` exists (file or directory).
    pub async fn exists_file(&self, path: &str) -> TrainingResult<bool> {
        let status = self.runner.run(&self.fs_command("-test").args(["-e", path])).await?;
        Ok(status.success())
    }

    /// Returns true when `dir` is absent afterwards: either it never existed or
    /// it was removed. Returns false when it exists and `remove` is false.
    pub async fn remove_if_exists(&self, dir: &str, remove: bool) -> TrainingResult<bool> {
        if !self.exists(dir).await? {
            return Ok(true);
        }
        if !remove {
            debug!("Keeping existing HDFS directory {dir}");
            return Ok(false);
        }
        self.checked(self.fs_command("-rmr").arg(dir)).await?;
        Ok(true)
    }

    pub async fn put(&self, local: &Path, dest_dir: &str) -> TrainingResult<()> {
        self.checked(self.fs_command("-put").arg(local.to_string_lossy()).arg(dest_dir)).await
    }

    /// Copy to HDFS and delete the local file.
    pub async fn move_from_local(&self, local: &Path, dest_dir: &str) -> TrainingResult<()> {
        self.checked(self.fs_command("-moveFromLocal").arg(local.to_string_lossy()).arg(dest_dir))
            .await
    }

    pub async fn get(&self, remote: &str, local: &Path) -> TrainingResult<()> {
        self.checked(self.fs_command("-get").arg(remote).arg(local.to_string_lossy())).await
    }

    /// Create `dir`. Callers check [`DistributedFs::exists`] first.
    pub async fn mkdir(&self, dir: &str) -> TrainingResult<()> {
        self.checked(self.fs_command("-mkdir").arg(dir)).await
    }

    /// `hadoop fs -cat <glob> | <local>`; a non-zero pipeline status is fatal.
    pub async fn cat_through_pipe(&self, glob: &str, local: ShellCommand) -> TrainingResult<()> {
        let pipeline = self.fs_command("-cat").arg(glob).pipe(local);
        let status = self.runner.run(&pipeline).await?;
        if !status.success() {
            return Err(TrainingError::PipelineFailed {
                status: status.to_string(),
                command: pipeline.to_shell_string(),
            });
        }
        Ok(())
    }

    async fn checked(&self, command: ShellCommand) -> TrainingResult<()> {
        let status = self.runner.run(&command).await?;
        if !status.success() {
            return Err(TrainingError::FsCommandFailed {
                status: status.to_string(),
                command: command.to_shell_string(),
            });
        }
        Ok(())
    }
}
