//! Storage Error Types
//!
//! This module defines error types for the persistence layer, covering file
//! I/O, (de)serialization of stored documents and integrity of loaded trees.

use crate::models::TreeError;
use std::path::PathBuf;
use thiserror::Error;

/// Persistence errors
///
/// Raised by [`TreeStore`](super::TreeStore) and
/// [`ViewStateStore`](super::ViewStateStore) implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing a storage file failed
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stored document could not be encoded or decoded
    #[error("Failed to serialize {context}: {source}")]
    Serialization {
        context: String,
        source: serde_json::Error,
    },

    /// A loaded tree violates the parent/child bookkeeping
    #[error("Stored tree for site '{site_id}' is corrupt: {source}")]
    CorruptTree { site_id: String, source: TreeError },

    /// Site id cannot be mapped to a storage location
    #[error("Invalid site id: '{0}'")]
    InvalidSiteId(String),

    /// The backend refused the write
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// An internal lock was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Create an I/O error with the affected path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create a corrupt tree error
    pub fn corrupt_tree(site_id: impl Into<String>, source: TreeError) -> Self {
        Self::CorruptTree {
            site_id: site_id.into(),
            source,
        }
    }

    /// Create a write failed error
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }
}
