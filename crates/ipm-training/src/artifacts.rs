use serde::Serialize;
use std::path::{Path, PathBuf};

/// Merged model written by one iteration. Never modified once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelArtifact {
    pub iteration: u32,
    pub path: PathBuf,
}

impl ModelArtifact {
    #[must_use]
    pub fn new(iteration: u32, path: PathBuf) -> Self {
        Self { iteration, path }
    }

    /// A model supplied by the caller to resume from.
    #[must_use]
    pub fn resumed(iteration: u32, path: &Path) -> Self {
        Self::new(iteration, path.to_path_buf())
    }

    /// Name the file has in a task's working directory once shipped with `-file`.
    #[must_use]
    pub fn task_local_name(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("./{name}")
    }
}

/// Best model of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestModel {
    pub iteration: u32,
    pub loss: f64,
    pub model: PathBuf,
}
