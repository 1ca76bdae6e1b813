//! Locating the Hadoop installation and its streaming jar.

use crate::command::ShellCommand;
use crate::error::{TrainingError, TrainingResult};
use crate::runner::CommandRunner;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_ROOTS: [&str; 3] = ["/usr/lib/hadoop", "/usr/local/lib/hadoop", "/opt/lib/hadoop"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HadoopInstallation {
    root: PathBuf,
    streaming_jar: PathBuf,
}

impl HadoopInstallation {
    /// Resolve the installation from explicit locations or the usual install roots.
    pub fn discover(root: Option<&Path>, streaming_jar: Option<&Path>) -> TrainingResult<Self> {
        let candidates: Vec<PathBuf> = DEFAULT_ROOTS.iter().map(PathBuf::from).collect();
        Self::discover_in(root, streaming_jar, &candidates)
    }

    fn discover_in(
        root: Option<&Path>,
        streaming_jar: Option<&Path>,
        candidates: &[PathBuf],
    ) -> TrainingResult<Self> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => candidates.iter().find(|c| c.is_dir()).cloned().ok_or_else(|| {
                TrainingError::InstallationNotFound(
                    "Unable to find the hadoop installation. \
                     Please specify with --hadooproot."
                        .to_string(),
                )
            })?,
        };

        if !root.is_dir() || !root.join("bin").join("hadoop").exists() {
            return Err(TrainingError::InstallationNotFound(format!(
                "--hadooproot must be the base directory of the hadoop installation (checked: {})",
                root.display()
            )));
        }

        let streaming_jar = match streaming_jar {
            Some(jar) => jar.to_path_buf(),
            None => find_streaming_jar(&root)?,
        };
        if !streaming_jar.exists() {
            return Err(TrainingError::InstallationNotFound(format!(
                "--streamingloc does not specify a valid jar file \
                 for the streaming interface (checked: {})",
                streaming_jar.display()
            )));
        }

        Ok(Self { root, streaming_jar })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn hadoop_bin(&self) -> PathBuf {
        self.root.join("bin").join("hadoop")
    }

    #[must_use]
    pub fn streaming_jar(&self) -> &Path {
        &self.streaming_jar
    }

    /// Log the version reported by `hadoop version`. Failure is only a warning.
    pub async fn probe_version(
        &self,
        runner: &dyn CommandRunner,
    ) -> TrainingResult<Option<String>> {
        let command = ShellCommand::from_path(&self.hadoop_bin()).arg("version");
        let captured = match runner.run_capturing_lines(&command).await {
            Ok(captured) => captured,
            Err(err) => {
                warn!("Unable to run {command}: {err}");
                return Ok(None);
            }
        };

        let version = captured.lines.into_iter().find(|l| !l.is_empty());
        match (&version, captured.success) {
            (Some(version), true) => info!("Using {version} at {}", self.root.display()),
            _ => warn!("Unable to determine hadoop version at {}", self.root.display()),
        }
        Ok(version.filter(|_| captured.success))
    }
}

fn find_streaming_jar(root: &Path) -> TrainingResult<PathBuf> {
    let direct = root.join("hadoop-streaming.jar");
    if direct.exists() {
        return Ok(direct);
    }

    let contrib = root.join("contrib").join("streaming");
    if !contrib.is_dir() {
        return Err(TrainingError::InstallationNotFound(format!(
            "{} does not exist. \
             Please specify location of hadoop streaming jar file with --streamingloc",
            contrib.display()
        )));
    }

    let pattern = contrib.join("hadoop-streaming*.jar");
    let matches: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| TrainingError::InstallationNotFound(e.to_string()))?
        .filter_map(Result::ok)
        .collect();

    match matches.as_slice() {
        [jar] => Ok(jar.clone()),
        _ => Err(TrainingError::InstallationNotFound(
            "Unable to find streaming jar, please specify with --streamingloc".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CapturedLines, CommandStatus};
    use async_trait::async_trait;
    use tempfile::TempDir;

    fn fake_root(temp: &TempDir) -> PathBuf {
        let root = temp.path().join("hadoop");
        std::fs::create_dir_all(root.join("bin")).unwrap();
        std::fs::write(root.join("bin").join("hadoop"), "").unwrap();
        root
    }

    #[test]
    fn test_discover_prefers_top_level_streaming_jar() {
        let temp = TempDir::new().unwrap();
        let root = fake_root(&temp);
        std::fs::write(root.join("hadoop-streaming.jar"), "").unwrap();

        let install = HadoopInstallation::discover(Some(&root), None).unwrap();
        assert_eq!(install.streaming_jar(), root.join("hadoop-streaming.jar"));
        assert_eq!(install.hadoop_bin(), root.join("bin").join("hadoop"));
    }

    #[test]
    fn test_discover_finds_single_contrib_jar() {
        let temp = TempDir::new().unwrap();
        let root = fake_root(&temp);
        let contrib = root.join("contrib").join("streaming");
        std::fs::create_dir_all(&contrib).unwrap();
        std::fs::write(contrib.join("hadoop-streaming-0.20.2.jar"), "").unwrap();

        let install = HadoopInstallation::discover(Some(&root), None).unwrap();
        assert_eq!(install.streaming_jar(), contrib.join("hadoop-streaming-0.20.2.jar"));
    }

    #[test]
    fn test_discover_rejects_ambiguous_contrib_jars() {
        let temp = TempDir::new().unwrap();
        let root = fake_root(&temp);
        let contrib = root.join("contrib").join("streaming");
        std::fs::create_dir_all(&contrib).unwrap();
        std::fs::write(contrib.join("hadoop-streaming-1.jar"), "").unwrap();
        std::fs::write(contrib.join("hadoop-streaming-2.jar"), "").unwrap();

        let err = HadoopInstallation::discover(Some(&root), None).unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn test_discover_uses_first_existing_default_root() {
        let temp = TempDir::new().unwrap();
        let root = fake_root(&temp);
        std::fs::write(root.join("hadoop-streaming.jar"), "").unwrap();
        let candidates = vec![temp.path().join("missing"), root.clone()];

        let install = HadoopInstallation::discover_in(None, None, &candidates).unwrap();
        assert_eq!(install.root(), root);

        let missing = [temp.path().join("missing")];
        let err = HadoopInstallation::discover_in(None, None, &missing).unwrap_err();
        assert!(matches!(err, TrainingError::InstallationNotFound(_)));
    }

    #[test]
    fn test_discover_requires_hadoop_binary_and_jar() {
        let temp = TempDir::new().unwrap();
        let err = HadoopInstallation::discover(Some(temp.path()), None).unwrap_err();
        assert_eq!(err.exit_code(), 10);

        let root = fake_root(&temp);
        let err =
            HadoopInstallation::discover(Some(&root), Some(&root.join("nope.jar"))).unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }

    struct VersionRunner(bool);

    #[async_trait]
    impl CommandRunner for VersionRunner {
        async fn run(&self, _command: &ShellCommand) -> TrainingResult<CommandStatus> {
            Ok(CommandStatus::SUCCESS)
        }

        async fn run_capturing_lines(
            &self,
            command: &ShellCommand,
        ) -> TrainingResult<CapturedLines> {
            assert!(command.has_word("version"));
            Ok(CapturedLines {
                lines: vec!["Hadoop 0.20.2".to_string(), "Subversion x".to_string()],
                success: self.0,
            })
        }
    }

    #[tokio::test]
    async fn test_probe_version() {
        let temp = TempDir::new().unwrap();
        let root = fake_root(&temp);
        std::fs::write(root.join("hadoop-streaming.jar"), "").unwrap();
        let install = HadoopInstallation::discover(Some(&root), None).unwrap();

        assert_eq!(
            install.probe_version(&VersionRunner(true)).await.unwrap(),
            Some("Hadoop 0.20.2".to_string())
        );
        assert_eq!(install.probe_version(&VersionRunner(false)).await.unwrap(), None);
    }

    struct UnstartableRunner;

    #[async_trait]
    impl CommandRunner for UnstartableRunner {
        async fn run(&self, _command: &ShellCommand) -> TrainingResult<CommandStatus> {
            Ok(CommandStatus::SUCCESS)
        }

        async fn run_capturing_lines(
            &self,
            command: &ShellCommand,
        ) -> TrainingResult<CapturedLines> {
            Err(TrainingError::Spawn {
                command: command.to_shell_string(),
                source: std::io::Error::other("no such file"),
            })
        }
    }

    #[tokio::test]
    async fn test_probe_version_failure_is_only_a_warning() {
        let temp = TempDir::new().unwrap();
        let root = fake_root(&temp);
        std::fs::write(root.join("hadoop-streaming.jar"), "").unwrap();
        let install = HadoopInstallation::discover(Some(&root), None).unwrap();

        assert_eq!(install.probe_version(&UnstartableRunner).await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_version_with_non_utf8_output() {
        use crate::runner::ShellRunner;
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let root = fake_root(&temp);
        let hadoop = root.join("bin").join("hadoop");
        std::fs::write(&hadoop, "#!/bin/sh\nprintf 'Hadoop 1.0 \\377\\n'\n").unwrap();
        std::fs::set_permissions(&hadoop, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::fs::write(root.join("hadoop-streaming.jar"), "").unwrap();
        let install = HadoopInstallation::discover(Some(&root), None).unwrap();

        let version = install.probe_version(&ShellRunner::new()).await.unwrap();
        assert_eq!(version, Some("Hadoop 1.0 \u{FFFD}".to_string()));
    }
}
