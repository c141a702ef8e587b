//! SSTable Tests
//!
//! Tests verify:
//! - Builder writes the three files and samples every k-th key
//! - Three-stage lookup finds every key, including bracket edges
//! - Keys outside the run (below, between, above) are absent
//! - Tombstones read back as tombstones
//! - Ordering is enforced at build time

use std::fs;
use std::io::Cursor;
use std::path::Path;

use sparsekv::codec::decode;
use sparsekv::memtable::MemTableEntry;
use sparsekv::storage::{
    DataFileIterator, SSTableBuilder, SSTableReader, SearchRange, TablePaths,
};
use sparsekv::LsmError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Keys "1".."12" in byte order with value `v{key}`
fn twelve_keys() -> Vec<(String, String)> {
    let mut keys: Vec<String> = (1..=12).map(|i| i.to_string()).collect();
    keys.sort();
    keys.into_iter().map(|k| (k.clone(), format!("v{}", k))).collect()
}

fn build(dir: &Path, prefix: &str, distance: usize, entries: &[(String, String)]) {
    let mut builder = SSTableBuilder::create(dir, prefix, distance).unwrap();
    for (k, v) in entries {
        builder
            .add(k.as_bytes(), &MemTableEntry::Value(v.as_bytes().to_vec()))
            .unwrap();
    }
    builder.finish().unwrap();
}

fn decode_keys(path: &Path) -> Vec<String> {
    let mut cursor = Cursor::new(fs::read(path).unwrap());
    let mut keys = Vec::new();
    while let Some(record) = decode(&mut cursor).unwrap() {
        keys.push(String::from_utf8(record.key).unwrap());
    }
    keys
}

/// Size of one index record for a key of `key_len` bytes
fn index_record_len(key_len: u64) -> u64 {
    8 + key_len + 8 + 8
}

// =============================================================================
// Builder Tests
// =============================================================================

#[test]
fn test_builder_creates_three_files() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());

    let paths = TablePaths::new(dir.path(), "0_");
    assert!(paths.exists());
    assert!(dir.path().join("0_data.dat").exists());
    assert!(dir.path().join("0_index.dat").exists());
    assert!(dir.path().join("0_sparseindex.dat").exists());
}

#[test]
fn test_builder_summary() {
    let dir = TempDir::new().unwrap();
    let mut builder = SSTableBuilder::create(dir.path(), "3_", 2).unwrap();
    for (k, v) in twelve_keys() {
        builder
            .add(k.as_bytes(), &MemTableEntry::Value(v.into_bytes()))
            .unwrap();
    }
    assert_eq!(builder.entry_count(), 12);

    let table = builder.finish().unwrap();

    assert_eq!(table.entry_count(), 12);
    assert_eq!(table.sparse_entry_count, 6);
    assert_eq!(table.min_key, b"1");
    assert_eq!(table.max_key, b"9");
    assert_eq!(table.data_size, fs::metadata(&table.paths.data).unwrap().len());
    assert_eq!(table.index_size, fs::metadata(&table.paths.index).unwrap().len());
    assert!(table.might_contain(b"5"));
    assert!(!table.might_contain(b"0"));
}

#[test]
fn test_index_holds_every_key_sparse_every_kth() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());
    let paths = TablePaths::new(dir.path(), "0_");

    let all: Vec<String> = twelve_keys().into_iter().map(|(k, _)| k).collect();
    assert_eq!(decode_keys(&paths.data), all);
    assert_eq!(decode_keys(&paths.index), all);
    assert_eq!(
        decode_keys(&paths.sparse_index),
        vec!["1", "11", "2", "4", "6", "8"]
    );
}

#[test]
fn test_distance_one_samples_every_key() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 1, &twelve_keys());
    let paths = TablePaths::new(dir.path(), "0_");

    assert_eq!(decode_keys(&paths.sparse_index).len(), 12);
}

#[test]
fn test_distance_larger_than_run_samples_first_key() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 100, &twelve_keys());
    let paths = TablePaths::new(dir.path(), "0_");

    assert_eq!(decode_keys(&paths.sparse_index), vec!["1"]);
}

#[test]
fn test_zero_distance_rejected() {
    let dir = TempDir::new().unwrap();
    let result = SSTableBuilder::create(dir.path(), "0_", 0);
    assert!(matches!(result, Err(LsmError::Config(_))));
}

#[test]
fn test_out_of_order_add_rejected() {
    let dir = TempDir::new().unwrap();
    let mut builder = SSTableBuilder::create(dir.path(), "0_", 2).unwrap();
    builder.add_value(b"b", Some(b"1")).unwrap();

    assert!(matches!(
        builder.add_value(b"a", Some(b"2")),
        Err(LsmError::Storage(_))
    ));
    assert!(matches!(
        builder.add_value(b"b", Some(b"3")),
        Err(LsmError::Storage(_))
    ));
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_get_every_key() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());
    let mut reader = SSTableReader::open(dir.path(), "0_").unwrap();

    for (k, v) in twelve_keys() {
        assert_eq!(
            reader.get(k.as_bytes()).unwrap(),
            Some(MemTableEntry::Value(v.into_bytes())),
            "key {}",
            k
        );
    }
}

#[test]
fn test_get_every_key_across_distances() {
    let dir = TempDir::new().unwrap();
    for distance in [1, 3, 5, 12, 13] {
        let prefix = format!("{}_", distance);
        build(dir.path(), &prefix, distance, &twelve_keys());
        let mut reader = SSTableReader::open(dir.path(), &prefix).unwrap();

        for (k, _) in twelve_keys() {
            assert!(reader.get(k.as_bytes()).unwrap().is_some(), "k={} d={}", k, distance);
        }
    }
}

#[test]
fn test_key_below_first_is_absent() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());
    let mut reader = SSTableReader::open(dir.path(), "0_").unwrap();

    assert_eq!(reader.search_sparse_index(b"0").unwrap(), None);
    assert_eq!(reader.get(b"0").unwrap(), None);
}

#[test]
fn test_missing_keys_between_and_above() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());
    let mut reader = SSTableReader::open(dir.path(), "0_").unwrap();

    // "100" sorts between "10" and "11"; "35" between "3" and "4"
    assert_eq!(reader.get(b"100").unwrap(), None);
    assert_eq!(reader.get(b"35").unwrap(), None);
    // "99" sorts after the last key
    assert_eq!(reader.get(b"99").unwrap(), None);
}

#[test]
fn test_tombstone_reads_back() {
    let dir = TempDir::new().unwrap();
    let mut builder = SSTableBuilder::create(dir.path(), "0_", 2).unwrap();
    builder.add_value(b"a", Some(b"1")).unwrap();
    builder.add(b"b", &MemTableEntry::Tombstone).unwrap();
    builder.add_value(b"c", Some(b"3")).unwrap();
    builder.finish().unwrap();

    let mut reader = SSTableReader::open(dir.path(), "0_").unwrap();
    assert_eq!(reader.get(b"b").unwrap(), Some(MemTableEntry::Tombstone));
    assert_eq!(
        reader.get(b"c").unwrap(),
        Some(MemTableEntry::Value(b"3".to_vec()))
    );
}

#[test]
fn test_empty_run() {
    let dir = TempDir::new().unwrap();
    SSTableBuilder::create(dir.path(), "0_", 2)
        .unwrap()
        .finish()
        .unwrap();

    let mut reader = SSTableReader::open(dir.path(), "0_").unwrap();
    assert_eq!(reader.paths(), &TablePaths::new(dir.path(), "0_"));
    assert_eq!(reader.get(b"anything").unwrap(), None);
    assert_eq!(reader.iter().unwrap().count(), 0);
}

// =============================================================================
// Sparse Index Search Tests
// =============================================================================

#[test]
fn test_sparse_search_exact_hit() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());
    let mut reader = SSTableReader::open(dir.path(), "0_").unwrap();

    assert_eq!(
        reader.search_sparse_index(b"1").unwrap(),
        Some(SearchRange::exact(0))
    );
    // "11" is the third index record
    let offset = index_record_len(1) + index_record_len(2);
    assert_eq!(
        reader.search_sparse_index(b"11").unwrap(),
        Some(SearchRange::exact(offset))
    );
}

#[test]
fn test_sparse_search_bracket() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());
    let mut reader = SSTableReader::open(dir.path(), "0_").unwrap();

    let range = reader.search_sparse_index(b"10").unwrap().unwrap();
    assert_eq!(range.lower_bound, Some(0));
    assert_eq!(
        range.upper_bound,
        Some(index_record_len(1) + index_record_len(2))
    );

    let offset = reader.search_index(b"10", range).unwrap();
    assert!(offset.is_some());
}

#[test]
fn test_sparse_search_past_last_sample_is_unbounded() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());
    let mut reader = SSTableReader::open(dir.path(), "0_").unwrap();

    let range = reader.search_sparse_index(b"9").unwrap().unwrap();
    assert!(range.lower_bound.is_some());
    assert_eq!(range.upper_bound, None);
    assert!(reader.search_index(b"9", range).unwrap().is_some());
}

#[test]
fn test_search_index_stops_at_bracket_end() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());
    let mut reader = SSTableReader::open(dir.path(), "0_").unwrap();

    // A bracket holding only "1" must not find "10"
    let range = SearchRange::exact(0);
    assert_eq!(reader.search_index(b"10", range).unwrap(), None);
}

// =============================================================================
// Iterator Tests
// =============================================================================

#[test]
fn test_data_file_iterator_look_ahead() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", 2, &twelve_keys());
    let paths = TablePaths::new(dir.path(), "0_");

    let mut iter = DataFileIterator::open(&paths.data).unwrap();
    assert_eq!(iter.current().unwrap().key, b"1");
    // Peeking does not consume
    assert_eq!(iter.current().unwrap().key, b"1");

    let first = iter.advance().unwrap().unwrap();
    assert_eq!(first.key, b"1");
    assert_eq!(iter.current().unwrap().key, b"10");

    let mut rest = 0;
    while iter.has_next() {
        iter.advance().unwrap();
        rest += 1;
    }
    assert_eq!(rest, 11);
    assert!(iter.advance().unwrap().is_none());
}
