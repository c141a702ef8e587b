//! # sparsekv
//!
//! An embedded, ordered key-value store built on the LSM pattern:
//! - Write-Ahead Logging (WAL) for durability
//! - Skip list (or binary tree) memtable
//! - Immutable sorted runs with a two-level sparse index
//! - Two-way compaction with newest-wins conflict resolution
//!
//! ## Architecture Overview
//!
//! ```text
//!                  put / delete                 get
//!                       │                        │
//! ┌─────────────────────▼────────────────────────▼──────────────┐
//! │                        Engine                               │
//! │            (Single Writer / Multi Reader)                   │
//! └───────┬──────────────────┬──────────────────────┬───────────┘
//!         │ 1. append+sync   │ 2. upsert            │ 3. flush / merge
//!         ▼                  ▼                      ▼
//!   ┌─────────────┐   ┌─────────────┐      ┌──────────────────┐
//!   │     WAL     │   │  MemTable   │─────►│  StorageManager  │
//!   │  (wal.dat)  │   │ (skip list) │      │ runs + metadata  │
//!   └─────────────┘   └─────────────┘      └────────┬─────────┘
//!                                                   │
//!                         ┌─────────────────────────┼───────────────┐
//!                         ▼                         ▼               ▼
//!                   {N}_data.dat             {N}_index.dat  {N}_sparseindex.dat
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod config;
pub mod error;

pub mod engine;
pub mod memtable;
pub mod policy;
pub mod storage;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::Engine;
pub use error::{LsmError, Result};
pub use memtable::MemTableEntry;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of sparsekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
