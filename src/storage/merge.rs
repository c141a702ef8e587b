//! Two-way merge of sorted runs
//!
//! Compaction reads the data files of two adjacent generations in step and
//! writes one new run. On equal keys the newer generation wins and the older
//! record is dropped, so a tombstone in the newer run keeps shadowing an
//! older value.

use std::cmp::Ordering;
use std::path::Path;

use crate::error::Result;

use super::sstable::{DataFileIterator, SSTable, SSTableBuilder, TablePaths};
use super::{generation_prefix, merge_prefix};

/// Counters from a finished merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Records written to the output
    pub written: u64,
    /// Older records dropped because the newer run had the same key
    pub superseded: u64,
}

/// Merge `older` and `newer` into `out`.
///
/// Each input keeps one buffered record and is advanced only once that
/// record has been consumed. Output keys are strictly ascending.
pub fn merge(
    older: &mut DataFileIterator,
    newer: &mut DataFileIterator,
    out: &mut SSTableBuilder,
) -> Result<MergeOutcome> {
    let mut outcome = MergeOutcome::default();

    loop {
        let order = match (older.current(), newer.current()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.key.cmp(&b.key),
        };

        let record = match order {
            Ordering::Less => older.advance()?,
            Ordering::Greater => newer.advance()?,
            Ordering::Equal => {
                older.advance()?;
                outcome.superseded += 1;
                newer.advance()?
            }
        };

        if let Some(record) = record {
            out.add_value(&record.key, record.value.as_deref())?;
            outcome.written += 1;
        }
    }

    Ok(outcome)
}

/// Compact generations `older` and `newer` into a single run that takes
/// over the `newer` id.
///
/// Steps, each of which may be interrupted by a crash:
/// 1. write and fsync `merge_{newer}_*`
/// 2. delete the `older` files, then the `newer` files
/// 3. rename `merge_{newer}_*` to `{newer}_*`
///
/// `StorageManager::open` knows how to finish or roll back each step.
pub fn merge_generations(
    dir: &Path,
    older: i64,
    newer: i64,
    sparse_key_distance: usize,
) -> Result<SSTable> {
    let older_paths = TablePaths::new(dir, &generation_prefix(older));
    let newer_paths = TablePaths::new(dir, &generation_prefix(newer));
    let output_prefix = merge_prefix(newer);

    let table = {
        let mut older_iter = DataFileIterator::open(&older_paths.data)?;
        let mut newer_iter = DataFileIterator::open(&newer_paths.data)?;
        let mut builder = SSTableBuilder::create(dir, &output_prefix, sparse_key_distance)?;

        let outcome = merge(&mut older_iter, &mut newer_iter, &mut builder)?;
        let table = builder.finish()?;

        tracing::debug!(
            "Merged generations {} and {}: {} records written, {} superseded",
            older,
            newer,
            outcome.written,
            outcome.superseded
        );
        table
        // Both inputs are closed here, before their files are deleted
    };

    older_paths.remove()?;
    newer_paths.remove()?;
    table.paths.rename_to(&newer_paths)?;

    Ok(SSTable {
        paths: newer_paths,
        ..table
    })
}
