use crate::error::TrainingResult;
use crate::hdfs::hdfs_join;
use std::path::{Path, PathBuf};

/// Local layout for the models and derived data of a run.
///
/// Models are written as `<output_dir>/<model_name>_iter<N>.gz`.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    output_dir: PathBuf,
    model_name: String,
}

impl ModelLayout {
    #[must_use]
    pub fn new(output_dir: PathBuf, model_name: impl Into<String>) -> Self {
        Self { output_dir, model_name: model_name.into() }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn model_path(&self, iteration: u32) -> PathBuf {
        self.output_dir.join(format!("{}_iter{iteration}.gz", self.model_name))
    }

    /// Symbol table produced by the feature compilation pass.
    #[must_use]
    pub fn symbols_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.symbols.gz", self.model_name))
    }

    /// Compiled copy of the development data.
    #[must_use]
    pub fn compiled_dev_path(&self, dev_data: &Path) -> PathBuf {
        let name = dev_data
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.strip_suffix(".gz").unwrap_or(&name);
        self.output_dir.join(format!("{stem}.compiled.gz"))
    }

    pub fn ensure_output_dir(&self) -> TrainingResult<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

/// HDFS layout under the staging input directory.
#[derive(Debug, Clone)]
pub struct StagingLayout {
    input_dir: String,
}

impl StagingLayout {
    #[must_use]
    pub fn new(input_dir: impl Into<String>) -> Self {
        Self { input_dir: input_dir.into() }
    }

    #[must_use]
    pub fn input_dir(&self) -> &str {
        &self.input_dir
    }

    #[must_use]
    pub fn symbols_dir(&self) -> String {
        hdfs_join(&self.input_dir, "Symbols")
    }

    #[must_use]
    pub fn precompiled_dir(&self) -> String {
        hdfs_join(&self.input_dir, "Precompiled")
    }

    #[must_use]
    pub fn precompiled_dev_dir(&self) -> String {
        hdfs_join(&self.input_dir, "PrecompiledDev")
    }
}

/// Glob matching every reducer/mapper output shard of a job directory.
#[must_use]
pub fn shards_glob(job_output_dir: &str) -> String {
    hdfs_join(job_output_dir, "part-*")
}
