//! Shared fakes for the IPM training integration tests.
//!
//! `FakeCluster` stands in for the `hadoop` client: it keeps an in-memory set of
//! HDFS paths, records every command, and answers the `fs` subcommands the
//! crate issues. `ScriptedScorer` replays a fixed list of losses.

#![allow(dead_code)]

use async_trait::async_trait;
use ipm_training::{
    CapturedLines, CommandRunner, CommandStatus, DistributedFs, JobLauncher, LossScorer,
    ProgressEvent, ProgressSink, ShellCommand, StreamingOptions, TrainingResult,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const HADOOP_BIN: &str = "/opt/hadoop/bin/hadoop";
pub const STREAMING_JAR: &str = "/opt/hadoop/contrib/streaming/hadoop-streaming-0.20.jar";

#[derive(Default)]
pub struct FakeCluster {
    existing: Mutex<HashSet<String>>,
    uploads: Mutex<HashMap<String, String>>,
    log: Mutex<Vec<ShellCommand>>,
    /// 1-based index of the job submission that exits non-zero.
    fail_job: Option<usize>,
    /// Uploads succeed but leave nothing behind.
    drop_uploads: bool,
    /// Uploads exit non-zero without touching the local file.
    fail_uploads: bool,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths(paths: &[&str]) -> Self {
        let cluster = Self::default();
        cluster.existing.lock().unwrap().extend(paths.iter().map(|p| p.to_string()));
        cluster
    }

    pub fn failing_job(submission: usize) -> Self {
        Self { fail_job: Some(submission), ..Self::default() }
    }

    pub fn dropping_uploads() -> Self {
        Self { drop_uploads: true, ..Self::default() }
    }

    pub fn failing_uploads() -> Self {
        Self { fail_uploads: true, ..Self::default() }
    }

    pub fn commands(&self) -> Vec<ShellCommand> {
        self.log.lock().unwrap().clone()
    }

    /// Streaming job submissions in order.
    pub fn jobs(&self) -> Vec<ShellCommand> {
        self.commands().into_iter().filter(|c| c.has_word("jar")).collect()
    }

    /// `fs` commands with the given subcommand, in order.
    pub fn fs_calls(&self, subcommand: &str) -> Vec<ShellCommand> {
        self.commands().into_iter().filter(|c| fs_subcommand(c) == Some(subcommand)).collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.existing.lock().unwrap().contains(path)
    }

    /// Content of an uploaded file, by HDFS path.
    pub fn uploaded(&self, path: &str) -> Option<String> {
        self.uploads.lock().unwrap().get(path).cloned()
    }

    fn upload(&self, local: &Path, dest_dir: &str, remove_local: bool) -> CommandStatus {
        if self.fail_uploads {
            return CommandStatus::from_code(1);
        }
        let name = local.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let remote = format!("{}/{}", dest_dir.trim_end_matches('/'), name);
        let content = std::fs::read_to_string(local).unwrap_or_default();
        if remove_local {
            let _ = std::fs::remove_file(local);
        }
        if !self.drop_uploads {
            self.existing.lock().unwrap().insert(remote.clone());
            self.uploads.lock().unwrap().insert(remote, content);
        }
        CommandStatus::SUCCESS
    }

    fn submit(&self, command: &ShellCommand) -> CommandStatus {
        let submitted = self.jobs().len();
        if self.fail_job == Some(submitted) {
            return CommandStatus::from_code(1);
        }
        if let Some(output) = command.value_of("--output") {
            self.existing.lock().unwrap().insert(output.to_string());
        }
        CommandStatus::SUCCESS
    }
}

fn fs_subcommand(command: &ShellCommand) -> Option<&str> {
    let mut words = command.words().skip(1);
    match words.next() {
        Some("fs") => words.next(),
        _ => None,
    }
}

fn status(ok: bool) -> CommandStatus {
    if ok { CommandStatus::SUCCESS } else { CommandStatus::from_code(1) }
}

#[async_trait]
impl CommandRunner for FakeCluster {
    async fn run(&self, command: &ShellCommand) -> TrainingResult<CommandStatus> {
        self.log.lock().unwrap().push(command.clone());
        if command.has_word("jar") {
            return Ok(self.submit(command));
        }

        let words: Vec<String> = command.words().map(str::to_string).collect();
        let status = match fs_subcommand(command) {
            Some("-test") => status(self.contains(&words[4])),
            Some("-rmr") => status(self.existing.lock().unwrap().remove(&words[3])),
            Some("-mkdir") => {
                self.existing.lock().unwrap().insert(words[3].clone());
                CommandStatus::SUCCESS
            }
            Some("-put") => self.upload(Path::new(&words[3]), &words[4], false),
            Some("-moveFromLocal") => self.upload(Path::new(&words[3]), &words[4], true),
            Some("-cat") => {
                // The local side of the pipeline writes the merged file.
                let output = command
                    .value_of("-o")
                    .map(PathBuf::from)
                    .or_else(|| words.last().map(PathBuf::from));
                if let Some(output) = output {
                    std::fs::write(output, format!("merged from {}\n", words[3])).unwrap();
                }
                CommandStatus::SUCCESS
            }
            _ => CommandStatus::SUCCESS,
        };
        Ok(status)
    }

    async fn run_capturing_lines(&self, command: &ShellCommand) -> TrainingResult<CapturedLines> {
        self.log.lock().unwrap().push(command.clone());
        Ok(CapturedLines { lines: vec!["Hadoop 0.20.2".to_string()], success: true })
    }
}

pub fn fs_for(cluster: &Arc<FakeCluster>) -> DistributedFs {
    DistributedFs::new(cluster.clone(), PathBuf::from(HADOOP_BIN))
}

pub fn launcher_for(cluster: &Arc<FakeCluster>) -> JobLauncher {
    JobLauncher::new(
        cluster.clone(),
        PathBuf::from(HADOOP_BIN),
        PathBuf::from(STREAMING_JAR),
        StreamingOptions::default(),
    )
}

/// Replays scripted losses and remembers which models it was asked about.
pub struct ScriptedScorer {
    losses: VecDeque<Option<f64>>,
    pub scored: Vec<PathBuf>,
}

impl ScriptedScorer {
    pub fn new(losses: &[f64]) -> Self {
        Self::with_responses(losses.iter().copied().map(Some))
    }

    pub fn with_responses(responses: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self { losses: responses.into_iter().collect(), scored: Vec::new() }
    }
}

#[async_trait]
impl LossScorer for ScriptedScorer {
    async fn score(&mut self, model: &Path) -> TrainingResult<Option<f64>> {
        self.scored.push(model.to_path_buf());
        Ok(self.losses.pop_front().flatten())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
