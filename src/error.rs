//! Error types for blockfile
//!
//! Provides a unified error type for all operations.
//!
//! Errors fall into two groups:
//! - **startup** errors (`Config`, `MissingLogDirectory`, `CreateDirectory`,
//!   `Startup`):
//!   the database directories are unusable and the process must not start.
//! - **operation** errors (everything else): a single block operation failed
//!   and the caller decides what to do. Nothing is retried at this layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::file::BlockId;

/// Result type alias using BlockFileError
pub type Result<T> = std::result::Result<T, BlockFileError>;

/// Unified error type for blockfile operations
#[derive(Debug, Error)]
pub enum BlockFileError {
    // -------------------------------------------------------------------------
    // Configuration Errors (fatal at startup)
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Log directory {0} for the existing database is missing")]
    MissingLogDirectory(PathBuf),

    #[error("Cannot create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot prepare directory {path}: {source}")]
    Startup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read block {block}: {source}")]
    Read {
        block: BlockId,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write block {block}: {source}")]
    Write {
        block: BlockId,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot append to {file_name}: {source}")]
    Append {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot access {file_name}: {source}")]
    Size {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Channel for {0} is closed")]
    ChannelClosed(PathBuf),

    // -------------------------------------------------------------------------
    // Addressing Errors
    // -------------------------------------------------------------------------
    #[error("Invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    #[error("Block {0} is beyond the addressable range")]
    BlockOutOfRange(BlockId),

    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("Page access out of bounds: offset {offset} + {len} exceeds {capacity}")]
    PageOverflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },
}

impl BlockFileError {
    /// True for errors that mean the database cannot be started at all.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            BlockFileError::Config(_)
                | BlockFileError::MissingLogDirectory(_)
                | BlockFileError::CreateDirectory { .. }
                | BlockFileError::Startup { .. }
        )
    }
}
