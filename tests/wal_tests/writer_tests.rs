//! Tests for WAL Writer
//!
//! These tests verify:
//! - Writing entries to WAL
//! - LSN generation and sequencing (including across reopen)
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Truncation
//! - Damaged or failed appends never strand later entries
//! - Integration with reader

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wordkv::config::WalSyncStrategy;
use wordkv::wal::{Operation, WalReader, WalRecovery, WalWriter};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn insert(key: &str) -> Operation {
    Operation::Insert {
        key: key.to_string(),
    }
}

fn read_all(path: &PathBuf) -> Vec<wordkv::wal::WalEntry> {
    WalReader::open(path)
        .unwrap()
        .entries()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_write_single_entry() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    let lsn = writer.append(insert("key1")).unwrap();

    assert_eq!(lsn, 1);
    assert_eq!(writer.current_lsn(), 2);
    assert_eq!(writer.entry_count(), 1);
    assert_eq!(writer.path(), wal_path.as_path());
}

#[test]
fn test_write_multiple_entries() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    let lsn1 = writer.append(insert("a")).unwrap();
    let lsn2 = writer.append(insert("b")).unwrap();
    let lsn3 = writer.append(Operation::DeleteAll).unwrap();

    assert_eq!(lsn1, 1);
    assert_eq!(lsn2, 2);
    assert_eq!(lsn3, 3);
    assert_eq!(writer.current_lsn(), 4);
}

#[test]
fn test_lsn_sequential() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    let lsns: Vec<u64> = (0..100)
        .map(|i| writer.append(insert(&format!("key{}", i))).unwrap())
        .collect();

    for (i, lsn) in lsns.iter().enumerate() {
        assert_eq!(*lsn, (i + 1) as u64);
    }
}

#[test]
fn test_written_entries_readable() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(insert("dolphin")).unwrap();
        writer.append(Operation::DeleteAll).unwrap();
        writer.append(insert("cobra")).unwrap();
    }

    let entries = read_all(&wal_path);

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].operation, insert("dolphin"));
    assert_eq!(entries[1].operation, Operation::DeleteAll);
    assert_eq!(entries[2].operation, insert("cobra"));
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_continues_lsn() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(insert("a")).unwrap();
        writer.append(insert("b")).unwrap();
    }

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 3);
    assert_eq!(writer.entry_count(), 2);

    assert_eq!(writer.append(insert("c")).unwrap(), 3);
    assert_eq!(read_all(&wal_path).len(), 3);
}

#[test]
fn test_open_at_assigns_given_lsn() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open_at(&wal_path, WalSyncStrategy::EveryWrite, 500).unwrap();
    assert_eq!(writer.append(insert("x")).unwrap(), 500);
    assert_eq!(writer.current_lsn(), 501);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_every_n_entries_visible_before_sync() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 10 }).unwrap();
    for i in 0..3 {
        writer.append(insert(&format!("k{}", i))).unwrap();
    }

    // Below the fsync threshold, but the data is already handed to the OS
    assert_eq!(read_all(&wal_path).len(), 3);
}

#[test]
fn test_explicit_sync() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 1000 }).unwrap();
    writer.append(insert("k")).unwrap();
    writer.sync().unwrap();

    assert!(fs::metadata(&wal_path).unwrap().len() > 0);
}

// =============================================================================
// Truncation Tests
// =============================================================================

#[test]
fn test_truncate_empties_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(insert("a")).unwrap();
    writer.append(insert("b")).unwrap();

    writer.truncate().unwrap();

    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
    assert_eq!(writer.entry_count(), 0);
    assert!(read_all(&wal_path).is_empty());
}

#[test]
fn test_lsn_continues_after_truncate() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(insert("a")).unwrap();
    writer.append(insert("b")).unwrap();
    writer.truncate().unwrap();

    assert_eq!(writer.append(insert("c")).unwrap(), 3);

    let entries = read_all(&wal_path);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lsn, 3);
}

// =============================================================================
// Damaged Tail Tests
// =============================================================================

#[test]
fn test_open_cuts_damaged_tail() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(insert("a")).unwrap();
        writer.append(insert("b")).unwrap();
    }
    let clean_len = fs::metadata(&wal_path).unwrap().len();

    // Half a frame left by an interrupted append
    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[7u8; 11]).unwrap();
    drop(file);

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.valid_len(), clean_len);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), clean_len);

    assert_eq!(writer.append(insert("c")).unwrap(), 3);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(!result.was_truncated);
}

#[test]
fn test_valid_len_tracks_frames() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.valid_len(), 0);

    writer.append(insert("dolphin")).unwrap();
    writer.append(Operation::DeleteAll).unwrap();
    assert_eq!(writer.valid_len(), fs::metadata(&wal_path).unwrap().len());

    writer.truncate().unwrap();
    assert_eq!(writer.valid_len(), 0);
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_append_does_not_consume_lsn() {
    // Every write to /dev/full fails with ENOSPC
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }

    let mut writer = WalWriter::open_at(full, WalSyncStrategy::EveryWrite, 1).unwrap();

    assert!(writer.append(insert("lost")).is_err());
    assert!(writer.append(insert("lost again")).is_err());

    assert_eq!(writer.current_lsn(), 1);
    assert_eq!(writer.entry_count(), 0);
    assert_eq!(writer.valid_len(), 0);
}
