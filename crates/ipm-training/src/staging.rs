//! Staging local input files onto HDFS.

use crate::error::{TrainingError, TrainingResult};
use crate::hdfs::{hdfs_join, DistributedFs};
use flate2::read::GzDecoder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A local file bound to its location on HDFS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedInput {
    pub local: PathBuf,
    pub remote: String,
    /// True when the staged copy is the decompressed content of a `.gz` source.
    pub decompressed: bool,
}

impl StagedInput {
    /// The HDFS path to hand to a job as `--input`.
    #[must_use]
    pub fn job_input(&self) -> String {
        self.remote.clone()
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Basename the staged copy will have on HDFS.
#[must_use]
pub fn staged_file_name(local: &Path, decompress: bool) -> String {
    let name = local.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    if decompress && is_gzip(local) {
        name.strip_suffix(".gz").unwrap_or(&name).to_string()
    } else {
        name
    }
}

/// Decompress `source` into `dest`, creating or truncating it.
pub fn gunzip_to(source: &Path, dest: &Path) -> TrainingResult<()> {
    let wrap = |source_err: std::io::Error| TrainingError::Decompress {
        path: source.to_path_buf(),
        source: source_err,
    };

    let input = File::open(source).map_err(wrap)?;
    let mut decoder = GzDecoder::new(BufReader::new(input));
    let mut out = BufWriter::new(File::create(dest).map_err(wrap)?);
    std::io::copy(&mut decoder, &mut out).map_err(wrap)?;
    Ok(())
}

/// Puts local inputs on HDFS once, reusing earlier staging unless forced.
pub struct DataStager {
    fs: DistributedFs,
    scratch_dir: PathBuf,
}

impl DataStager {
    #[must_use]
    pub fn new(fs: DistributedFs, scratch_dir: PathBuf) -> Self {
        Self { fs, scratch_dir }
    }

    /// Make `local` available under `hdfs_dir` and return the binding.
    ///
    /// With `decompress`, a `.gz` source is gunzipped into the scratch
    /// directory and moved onto HDFS; anything else is copied as-is.
    pub async fn ensure_staged(
        &self,
        local: &Path,
        hdfs_dir: &str,
        force: bool,
        decompress: bool,
    ) -> TrainingResult<StagedInput> {
        let name = staged_file_name(local, decompress);
        let remote = hdfs_join(hdfs_dir, &name);
        let decompressed = decompress && is_gzip(local);
        debug!("Processing input {name}");

        let staged = StagedInput { local: local.to_path_buf(), remote, decompressed };

        if !force && self.fs.exists_file(&staged.remote).await? {
            debug!("Found file on HDFS: {}", staged.remote);
            return Ok(staged);
        }

        info!("Regenerating HDFS input: {}", staged.remote);
        if !local.exists() {
            return Err(TrainingError::InputNotFound(local.display().to_string()));
        }
        if !self.fs.exists(hdfs_dir).await? {
            self.fs.mkdir(hdfs_dir).await?;
        }

        if decompressed {
            let scratch = self.scratch_dir.join(&name);
            let (source, dest) = (local.to_path_buf(), scratch.clone());
            let moved = match tokio::task::spawn_blocking(move || gunzip_to(&source, &dest)).await {
                Ok(Ok(())) => self.fs.move_from_local(&scratch, hdfs_dir).await,
                Ok(Err(err)) => Err(err),
                Err(join) => Err(TrainingError::Io(std::io::Error::other(join))),
            };
            if let Err(err) = moved {
                if let Err(e) = tokio::fs::remove_file(&scratch).await {
                    debug!("Unable to remove scratch copy {}: {e}", scratch.display());
                }
                return Err(err);
            }
        } else {
            self.fs.put(local, hdfs_dir).await?;
        }

        if !self.fs.exists_file(&staged.remote).await? {
            return Err(TrainingError::StagingFailed(staged.remote));
        }
        Ok(staged)
    }
}
