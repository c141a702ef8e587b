//! Flush and compaction policy
//!
//! The engine consults a policy after every mutation. Flush and merge run
//! synchronously on the writing thread; a policy only decides *when*.

use crate::config::Config;

/// Decides when the engine flushes the memtable and merges runs
pub trait CompactionPolicy: Send + Sync {
    /// Flush once the memtable holds this many distinct keys
    fn should_flush(&self, memtable_keys: usize) -> bool;

    /// Merge the two oldest runs while this many runs are live
    fn should_merge(&self, live_runs: usize) -> bool;
}

/// Flush at a key count, merge above a run count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    pub memtable_threshold: usize,
    pub merge_threshold: usize,
}

impl ThresholdPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            memtable_threshold: config.memtable_threshold,
            merge_threshold: config.merge_threshold,
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl CompactionPolicy for ThresholdPolicy {
    fn should_flush(&self, memtable_keys: usize) -> bool {
        memtable_keys >= self.memtable_threshold
    }

    fn should_merge(&self, live_runs: usize) -> bool {
        live_runs > self.merge_threshold
    }
}

/// Never flushes or merges on its own; callers use `Engine::flush` and
/// `Engine::compact`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualPolicy;

impl CompactionPolicy for ManualPolicy {
    fn should_flush(&self, _memtable_keys: usize) -> bool {
        false
    }

    fn should_merge(&self, _live_runs: usize) -> bool {
        false
    }
}
