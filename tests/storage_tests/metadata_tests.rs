//! Metadata Tests
//!
//! Tests verify:
//! - Absent file means an empty store
//! - Fixed 16-byte big-endian layout
//! - Short or inconsistent files are corruption
//! - Live generation range arithmetic

use std::fs;

use sparsekv::storage::{Metadata, METADATA_FILENAME, METADATA_SIZE};
use sparsekv::LsmError;
use tempfile::TempDir;

#[test]
fn test_absent_file_is_empty_store() {
    let dir = TempDir::new().unwrap();
    let metadata = Metadata::load(dir.path()).unwrap();

    assert_eq!(metadata, Metadata::default());
    assert_eq!(metadata.live_runs, 0);
    assert_eq!(metadata.newest_generation, -1);
    assert_eq!(metadata.live_generations().count(), 0);
}

#[test]
fn test_persist_and_load() {
    let dir = TempDir::new().unwrap();
    let metadata = Metadata {
        live_runs: 2,
        newest_generation: 7,
    };

    metadata.persist(dir.path()).unwrap();

    assert_eq!(Metadata::load(dir.path()).unwrap(), metadata);
    assert!(!dir.path().join("metadata.dat.tmp").exists());
}

#[test]
fn test_big_endian_layout() {
    let dir = TempDir::new().unwrap();
    Metadata {
        live_runs: 1,
        newest_generation: 0x0102,
    }
    .persist(dir.path())
    .unwrap();

    let bytes = fs::read(dir.path().join(METADATA_FILENAME)).unwrap();
    assert_eq!(bytes.len(), METADATA_SIZE);
    assert_eq!(&bytes[..8], &1i64.to_be_bytes());
    assert_eq!(&bytes[8..], &0x0102i64.to_be_bytes());
}

#[test]
fn test_short_file_is_corruption() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(METADATA_FILENAME), [0u8; 10]).unwrap();

    assert!(matches!(
        Metadata::load(dir.path()),
        Err(LsmError::Corruption(_))
    ));
}

#[test]
fn test_inconsistent_values_are_corruption() {
    let dir = TempDir::new().unwrap();
    let mut bytes = 5i64.to_be_bytes().to_vec();
    bytes.extend_from_slice(&1i64.to_be_bytes());
    fs::write(dir.path().join(METADATA_FILENAME), bytes).unwrap();

    assert!(matches!(
        Metadata::load(dir.path()),
        Err(LsmError::Corruption(_))
    ));
}

#[test]
fn test_stale_temp_removed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("metadata.dat.tmp"), b"junk").unwrap();

    assert!(Metadata::remove_stale_temp(dir.path()).unwrap());
    assert!(!Metadata::remove_stale_temp(dir.path()).unwrap());
}

#[test]
fn test_live_generations_newest_first() {
    let metadata = Metadata {
        live_runs: 3,
        newest_generation: 9,
    };

    assert_eq!(metadata.oldest_generation(), 7);
    assert_eq!(metadata.live_generations().collect::<Vec<_>>(), vec![9, 8, 7]);
    assert!(metadata.is_live(7));
    assert!(!metadata.is_live(6));
    assert!(!metadata.is_live(10));
}

#[test]
fn test_flush_then_merge_transitions() {
    let metadata = Metadata::default().after_flush().after_flush();
    assert_eq!(
        metadata,
        Metadata {
            live_runs: 2,
            newest_generation: 1
        }
    );

    let merged = metadata.after_merge();
    assert_eq!(merged.live_runs, 1);
    assert_eq!(merged.newest_generation, 1);
    assert_eq!(merged.live_generations().collect::<Vec<_>>(), vec![1]);
}
