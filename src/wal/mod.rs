//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append every accepted write before the memtable is touched
//! - Sync to disk according to the configured strategy
//! - Replay into a fresh memtable on startup
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Record 1                                      │
//! │ ┌──────────┬───────┬──────────┬─────────────┐ │
//! │ │KeyLen (8)│  Key  │ValLen (8)│    Value    │ │
//! │ └──────────┴───────┴──────────┴─────────────┘ │
//! ├───────────────────────────────────────────────┤
//! │ Record 2 ...                                  │
//! └───────────────────────────────────────────────┘
//! ```
//! Records use the shared codec; `ValLen = 0` is a delete.

mod reader;
mod writer;

pub use reader::{WalIterator, WalReader};
pub use writer::WalWriter;
