//! Merge Tests
//!
//! Tests verify:
//! - Output keys are strictly ascending and cover both inputs
//! - The newer run wins on equal keys, tombstones included
//! - merge_generations replaces both runs with one under the newer id

use std::path::Path;

use sparsekv::memtable::MemTableEntry;
use sparsekv::storage::{
    generation_prefix, merge, merge_generations, merge_prefix, DataFileIterator, MergeOutcome,
    SSTableBuilder, SSTableReader, TablePaths,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn build(dir: &Path, prefix: &str, entries: &[(&str, Option<&str>)]) {
    let mut builder = SSTableBuilder::create(dir, prefix, 2).unwrap();
    for (k, v) in entries {
        builder
            .add_value(k.as_bytes(), v.map(str::as_bytes))
            .unwrap();
    }
    builder.finish().unwrap();
}

fn read_all(dir: &Path, prefix: &str) -> Vec<(String, Option<String>)> {
    let paths = TablePaths::new(dir, prefix);
    DataFileIterator::open(&paths.data)
        .unwrap()
        .map(|r| {
            let r = r.unwrap();
            (
                String::from_utf8(r.key).unwrap(),
                r.value.map(|v| String::from_utf8(v).unwrap()),
            )
        })
        .collect()
}

fn merge_into(dir: &Path, older: &str, newer: &str, out: &str) -> MergeOutcome {
    let mut a = DataFileIterator::open(&TablePaths::new(dir, older).data).unwrap();
    let mut b = DataFileIterator::open(&TablePaths::new(dir, newer).data).unwrap();
    let mut builder = SSTableBuilder::create(dir, out, 2).unwrap();
    let outcome = merge(&mut a, &mut b, &mut builder).unwrap();
    builder.finish().unwrap();
    outcome
}

// =============================================================================
// Merge Tests
// =============================================================================

#[test]
fn test_newer_value_wins() {
    let dir = TempDir::new().unwrap();
    build(
        dir.path(),
        "0_",
        &[("1", Some("One")), ("3", Some("Three")), ("5", Some("Old"))],
    );
    build(
        dir.path(),
        "1_",
        &[("2", Some("Two")), ("5", Some("Five")), ("6", Some("Six"))],
    );

    let outcome = merge_into(dir.path(), "0_", "1_", "out_");

    assert_eq!(outcome.written, 5);
    assert_eq!(outcome.superseded, 1);
    assert_eq!(
        read_all(dir.path(), "out_"),
        vec![
            ("1".to_string(), Some("One".to_string())),
            ("2".to_string(), Some("Two".to_string())),
            ("3".to_string(), Some("Three".to_string())),
            ("5".to_string(), Some("Five".to_string())),
            ("6".to_string(), Some("Six".to_string())),
        ]
    );
}

#[test]
fn test_newer_tombstone_shadows_older_value() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", &[("a", Some("1")), ("b", Some("2"))]);
    build(dir.path(), "1_", &[("a", None)]);

    merge_into(dir.path(), "0_", "1_", "out_");

    let mut reader = SSTableReader::open(dir.path(), "out_").unwrap();
    assert_eq!(reader.get(b"a").unwrap(), Some(MemTableEntry::Tombstone));
    assert_eq!(
        reader.get(b"b").unwrap(),
        Some(MemTableEntry::Value(b"2".to_vec()))
    );
}

#[test]
fn test_output_strictly_ascending_interleaved() {
    let dir = TempDir::new().unwrap();
    let evens: Vec<String> = (0..50).map(|i| format!("{:03}", i * 2)).collect();
    let thirds: Vec<String> = (0..34).map(|i| format!("{:03}", i * 3)).collect();
    let older: Vec<(&str, Option<&str>)> = evens.iter().map(|k| (k.as_str(), Some("old"))).collect();
    let newer: Vec<(&str, Option<&str>)> = thirds.iter().map(|k| (k.as_str(), Some("new"))).collect();
    build(dir.path(), "0_", &older);
    build(dir.path(), "1_", &newer);

    merge_into(dir.path(), "0_", "1_", "out_");

    let merged = read_all(dir.path(), "out_");
    assert!(merged.windows(2).all(|w| w[0].0 < w[1].0));
    for (k, v) in &merged {
        let n: u32 = k.parse().unwrap();
        let expected = if n % 3 == 0 { "new" } else { "old" };
        assert_eq!(v.as_deref(), Some(expected), "key {}", k);
    }
}

#[test]
fn test_merge_with_empty_input() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "0_", &[]);
    build(dir.path(), "1_", &[("x", Some("1")), ("y", None)]);

    let outcome = merge_into(dir.path(), "0_", "1_", "out_");

    assert_eq!(outcome.written, 2);
    assert_eq!(read_all(dir.path(), "out_").len(), 2);
}

// =============================================================================
// Generation Merge Tests
// =============================================================================

#[test]
fn test_merge_generations_replaces_files() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), &generation_prefix(3), &[("k", Some("old")), ("z", Some("z"))]);
    build(dir.path(), &generation_prefix(4), &[("k", Some("new"))]);

    let table = merge_generations(dir.path(), 3, 4, 2).unwrap();

    assert_eq!(table.paths, TablePaths::new(dir.path(), "4_"));
    assert_eq!(table.entry_count(), 2);
    assert!(!TablePaths::new(dir.path(), "3_").any_exists());
    assert!(!TablePaths::new(dir.path(), &merge_prefix(4)).any_exists());
    assert!(TablePaths::new(dir.path(), "4_").exists());

    let mut reader = SSTableReader::open(dir.path(), "4_").unwrap();
    assert_eq!(
        reader.get(b"k").unwrap(),
        Some(MemTableEntry::Value(b"new".to_vec()))
    );
    assert_eq!(
        reader.get(b"z").unwrap(),
        Some(MemTableEntry::Value(b"z".to_vec()))
    );
}

#[test]
fn test_merge_generations_missing_source_fails() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), "1_", &[("k", Some("v"))]);

    assert!(merge_generations(dir.path(), 0, 1, 2).is_err());
    // The surviving run is untouched
    assert!(TablePaths::new(dir.path(), "1_").exists());
}
