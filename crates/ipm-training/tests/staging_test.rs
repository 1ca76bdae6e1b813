//! Integration tests for staging local data onto HDFS.

mod common;

use common::{fs_for, FakeCluster};
use flate2::write::GzEncoder;
use flate2::Compression;
use ipm_training::{DataStager, TrainingError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const INPUT_DIR: &str = "/user/ipm/in";

struct Fixture {
    cluster: Arc<FakeCluster>,
    stager: DataStager,
    data: TempDir,
    scratch: TempDir,
}

fn fixture(cluster: FakeCluster) -> Fixture {
    let cluster = Arc::new(cluster);
    let scratch = TempDir::new().unwrap();
    let stager = DataStager::new(fs_for(&cluster), scratch.path().to_path_buf());
    Fixture { cluster, stager, data: TempDir::new().unwrap(), scratch }
}

fn write_plain(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn write_gz(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

#[tokio::test]
async fn test_staging_is_idempotent() {
    let f = fixture(FakeCluster::new());
    let local = write_plain(f.data.path(), "train.txt", "example\n");

    let first = f.stager.ensure_staged(&local, INPUT_DIR, false, true).await.unwrap();
    let second = f.stager.ensure_staged(&local, INPUT_DIR, false, true).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.remote, "/user/ipm/in/train.txt");
    assert!(!first.decompressed);
    assert_eq!(f.cluster.fs_calls("-put").len(), 1);
    assert_eq!(f.cluster.fs_calls("-mkdir").len(), 1);
    assert_eq!(f.cluster.uploaded("/user/ipm/in/train.txt").as_deref(), Some("example\n"));
}

#[tokio::test]
async fn test_force_restages_existing_file() {
    let f = fixture(FakeCluster::with_paths(&[INPUT_DIR, "/user/ipm/in/train.txt"]));
    let local = write_plain(f.data.path(), "train.txt", "fresh\n");

    f.stager.ensure_staged(&local, INPUT_DIR, false, true).await.unwrap();
    assert!(f.cluster.fs_calls("-put").is_empty());

    f.stager.ensure_staged(&local, INPUT_DIR, true, true).await.unwrap();
    assert_eq!(f.cluster.fs_calls("-put").len(), 1);
    assert!(f.cluster.fs_calls("-mkdir").is_empty());
    assert_eq!(f.cluster.uploaded("/user/ipm/in/train.txt").as_deref(), Some("fresh\n"));
}

#[tokio::test]
async fn test_gzip_input_is_decompressed_and_moved() {
    let f = fixture(FakeCluster::new());
    let local = write_gz(f.data.path(), "train.txt.gz", "a 1\nb 2\n");

    let staged = f.stager.ensure_staged(&local, INPUT_DIR, false, true).await.unwrap();

    assert_eq!(staged.remote, "/user/ipm/in/train.txt");
    assert!(staged.decompressed);
    assert!(f.cluster.fs_calls("-put").is_empty());
    let moves = f.cluster.fs_calls("-moveFromLocal");
    assert_eq!(moves.len(), 1);
    assert!(moves[0].has_word(&f.scratch.path().join("train.txt").display().to_string()));
    assert_eq!(f.cluster.uploaded("/user/ipm/in/train.txt").as_deref(), Some("a 1\nb 2\n"));
    assert!(local.exists());
    assert!(!f.scratch.path().join("train.txt").exists());
}

#[tokio::test]
async fn test_gzip_kept_compressed_without_decompress() {
    let f = fixture(FakeCluster::new());
    let local = write_gz(f.data.path(), "dev.gz", "x\n");

    let staged = f.stager.ensure_staged(&local, INPUT_DIR, false, false).await.unwrap();

    assert_eq!(staged.remote, "/user/ipm/in/dev.gz");
    assert!(!staged.decompressed);
    assert_eq!(f.cluster.fs_calls("-put").len(), 1);
}

#[tokio::test]
async fn test_missing_upload_is_staging_failure() {
    let f = fixture(FakeCluster::dropping_uploads());
    let local = write_plain(f.data.path(), "train.txt", "x\n");

    let err = f.stager.ensure_staged(&local, INPUT_DIR, false, true).await.unwrap_err();

    assert!(matches!(
        &err,
        TrainingError::StagingFailed(remote) if remote == "/user/ipm/in/train.txt"
    ));
    assert_eq!(err.exit_code(), 11);
}

#[tokio::test]
async fn test_missing_local_file_is_input_error() {
    let f = fixture(FakeCluster::new());
    let local = f.data.path().join("absent.txt");

    let err = f.stager.ensure_staged(&local, INPUT_DIR, false, true).await.unwrap_err();

    assert_eq!(err.exit_code(), 130);
    assert!(f.cluster.fs_calls("-put").is_empty());
}

#[tokio::test]
async fn test_corrupt_gzip_is_decompress_error() {
    let f = fixture(FakeCluster::new());
    let local = write_plain(f.data.path(), "broken.gz", "not gzip at all");

    let err = f.stager.ensure_staged(&local, INPUT_DIR, false, true).await.unwrap_err();

    assert_eq!(err.exit_code(), 12);
    assert!(f.cluster.fs_calls("-moveFromLocal").is_empty());
}

#[tokio::test]
async fn test_failed_move_removes_scratch_copy() {
    let f = fixture(FakeCluster::failing_uploads());
    let local = write_gz(f.data.path(), "train.txt.gz", "a 1\n");

    let err = f.stager.ensure_staged(&local, INPUT_DIR, false, true).await.unwrap_err();

    assert_eq!(err.exit_code(), 35);
    assert_eq!(f.cluster.fs_calls("-moveFromLocal").len(), 1);
    assert!(!f.scratch.path().join("train.txt").exists());
    assert!(local.exists());
}

#[tokio::test]
async fn test_corrupt_gzip_leaves_no_scratch_copy() {
    let f = fixture(FakeCluster::new());
    let local = write_plain(f.data.path(), "broken.txt.gz", "not gzip at all");

    f.stager.ensure_staged(&local, INPUT_DIR, false, true).await.unwrap_err();

    assert!(!f.scratch.path().join("broken.txt").exists());
}
