//! # blockfile
//!
//! The block-level physical file manager of a disk-based database storage
//! engine:
//! - Every table, index and log file is a sequence of fixed-size blocks
//! - Blocks are addressed by (file name, block number)
//! - One lazily opened channel per file, shared by all threads
//! - Race-free appends under a single coarse lock
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │        Buffer Manager / Log Manager / Recovery               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ read / write / append / size
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    FileManager                               │
//! │              (coarse Mutex over block ops)                   │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!   ┌─────────────────┐           ┌──────────────────┐
//!   │ ChannelRegistry │           │  DbDirectories   │
//!   │    (RwLock)     │           │ (startup layout) │
//!   └────────┬────────┘           └──────────────────┘
//!            │
//!            ▼
//!   ┌─────────────────┐
//!   │   IoChannel     │
//!   │ (positioned IO) │
//!   └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod file;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BlockFileError, Result};
pub use config::Config;
pub use file::{BlockId, FileManager, Page};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blockfile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
