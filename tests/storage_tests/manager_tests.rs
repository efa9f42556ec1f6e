//! Tests for StorageManager
//!
//! These tests verify:
//! - Opening/creating storage directories
//! - Writing and reloading checkpoints
//! - Atomic replacement and temp-file cleanup
//! - Wiping on-disk state

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use wordkv::storage::StorageManager;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_storage() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("new_storage");

    assert!(!path.exists());

    let manager = StorageManager::open(&path).unwrap();

    assert!(path.is_dir());
    assert_eq!(manager.data_dir(), path.as_path());
}

#[test]
fn test_open_empty_directory() {
    let (_temp, path) = setup_temp_storage();

    let manager = StorageManager::open(&path).unwrap();

    assert!(manager.load().unwrap().is_none());
    assert_eq!(manager.checkpoints_written(), 0);
}

#[test]
fn test_open_removes_stale_temp_file() {
    let (_temp, path) = setup_temp_storage();
    let temp_file = path.join("checkpoint.wkv.tmp");
    fs::write(&temp_file, b"half written").unwrap();

    let _manager = StorageManager::open(&path).unwrap();

    assert!(!temp_file.exists());
}

// =============================================================================
// Checkpoint Tests
// =============================================================================

#[test]
fn test_write_and_load() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    let meta = manager
        .write_checkpoint(["cobra", "crocodile", "dolphin"], 3)
        .unwrap();

    assert_eq!(meta.path, manager.checkpoint_path());
    assert_eq!(meta.entry_count, 3);
    assert_eq!(manager.checkpoints_written(), 1);

    let checkpoint = manager.load().unwrap().unwrap();
    assert_eq!(checkpoint.last_lsn, 3);
    assert_eq!(checkpoint.keys, vec!["cobra", "crocodile", "dolphin"]);
}

#[test]
fn test_second_checkpoint_replaces_first() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    manager.write_checkpoint(["a", "b"], 2).unwrap();
    manager.write_checkpoint(["c"], 5).unwrap();

    let checkpoint = manager.load().unwrap().unwrap();
    assert_eq!(checkpoint.keys, vec!["c"]);
    assert_eq!(checkpoint.last_lsn, 5);
    assert!(!path.join("checkpoint.wkv.tmp").exists());
}

#[test]
fn test_failed_checkpoint_keeps_previous() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    manager.write_checkpoint(["keep"], 1).unwrap();
    // Unsorted input aborts the new checkpoint before the rename
    assert!(manager.write_checkpoint(["z", "a"], 2).is_err());

    let checkpoint = manager.load().unwrap().unwrap();
    assert_eq!(checkpoint.keys, vec!["keep"]);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_sees_checkpoint() {
    let (_temp, path) = setup_temp_storage();

    {
        let manager = StorageManager::open(&path).unwrap();
        manager.write_checkpoint(["persisted"], 4).unwrap();
    }

    let manager = StorageManager::open(&path).unwrap();
    let checkpoint = manager.load().unwrap().unwrap();
    assert_eq!(checkpoint.keys, vec!["persisted"]);
    assert_eq!(manager.checkpoints_written(), 0);
}

#[test]
fn test_wipe() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();
    manager.write_checkpoint(["gone"], 1).unwrap();

    manager.wipe().unwrap();

    assert!(manager.load().unwrap().is_none());
    // Wiping twice is fine
    manager.wipe().unwrap();
}
