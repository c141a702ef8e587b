//! Storage Module
//!
//! Persistent storage layer: immutable sorted runs, their compaction and
//! the generation metadata that says which runs are live.
//!
//! ## Responsibilities
//! - Write memtable flushes as new sorted runs
//! - Point lookups through a two-level sparse index
//! - Merge the two oldest runs into one (newest wins)
//! - Track live generations and repair interrupted merges on startup
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── wal.dat
//!   ├── metadata.dat                 [live runs: i64 BE][newest id: i64 BE]
//!   ├── {N}_data.dat                 records in key order
//!   ├── {N}_index.dat                key → offset into data file
//!   ├── {N}_sparseindex.dat          every k-th key → offset into index file
//!   └── merge_{N}_*.dat              merge output, renamed to {N}_* when done
//! ```

mod manager;
mod merge;
mod metadata;
mod sstable;

pub use manager::StorageManager;
pub use merge::{merge, merge_generations, MergeOutcome};
pub use metadata::{Metadata, METADATA_FILENAME, METADATA_SIZE};
pub use sstable::{
    DataFileIterator, SSTable, SSTableBuilder, SSTableReader, SearchRange, TablePaths,
    DATA_FILE_SUFFIX, INDEX_FILE_SUFFIX, SPARSE_INDEX_FILE_SUFFIX,
};

/// Prefix of merge output files
pub const MERGE_PREFIX: &str = "merge_";

/// File name prefix of a live generation: `"{id}_"`
pub fn generation_prefix(generation: i64) -> String {
    format!("{}_", generation)
}

/// File name prefix of a merge writing into `generation`: `"merge_{id}_"`
pub fn merge_prefix(generation: i64) -> String {
    format!("{}{}_", MERGE_PREFIX, generation)
}
