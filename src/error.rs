//! Error types for sparsekv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LsmError
pub type Result<T> = std::result::Result<T, LsmError>;

/// Unified error type for sparsekv operations
#[derive(Debug, Error)]
pub enum LsmError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Decoding Errors
    // -------------------------------------------------------------------------
    /// A record header was present but its payload ended early
    #[error("Truncated record: expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Metadata serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    // -------------------------------------------------------------------------
    // Startup Errors
    // -------------------------------------------------------------------------
    /// The store could not be opened; the engine is unusable
    #[error("Failed to open store: {context}: {source}")]
    Construction {
        context: String,
        #[source]
        source: Box<LsmError>,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LsmError {
    /// Wrap an error raised while opening the store
    pub fn construction(context: impl Into<String>, source: LsmError) -> Self {
        LsmError::Construction {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// True for a record cut short inside its declared length
    pub fn is_truncation(&self) -> bool {
        match self {
            LsmError::Truncated { .. } => true,
            LsmError::Construction { source, .. } => source.is_truncation(),
            _ => false,
        }
    }
}
