//! Handles created from configuration files.

use cbridge::{BridgeConfig, ExecutionStrategy, Handle, MemoryBackend, CONFIG_FILE_NAME};
use tempfile::TempDir;

#[test]
fn default_file_creates_worker_handle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    BridgeConfig::write_default_if_missing(&path).unwrap();

    let config = BridgeConfig::from_file(&path).unwrap();
    let handle = Handle::create(MemoryBackend::new(), &config).unwrap();
    assert_eq!(handle.strategy(), ExecutionStrategy::QueueWorker);
    handle.destroy().unwrap();
}

#[test]
fn custom_thread_name_and_stack_size() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "strategy = \"worker\"\nworker_thread_name = \"bucket-a\"\nworker_stack_size = 1048576\n",
    )
    .unwrap();

    let config = BridgeConfig::from_file(&path).unwrap();
    assert_eq!(config.worker_thread_name, "bucket-a");
    assert_eq!(config.worker_stack_size, Some(1_048_576));

    let handle = Handle::create(MemoryBackend::new(), &config).unwrap();
    handle.destroy().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dirty_file_creates_dirty_handle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "strategy = \"dirty\"\n").unwrap();

    let config = BridgeConfig::from_file(&path).unwrap();
    let handle = Handle::create(MemoryBackend::new(), &config).unwrap();
    assert_eq!(handle.strategy(), ExecutionStrategy::DirtyOffload);
}

#[test]
fn malformed_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "strategy = [1, 2]\n").unwrap();
    assert!(BridgeConfig::from_file(&path).is_err());
}
