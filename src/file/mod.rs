//! File Module
//!
//! Block-level physical file management.
//!
//! ## Responsibilities
//! - Address every table, index and log file as a sequence of fixed-size blocks
//! - Lazily open and cache one channel per file name
//! - Positioned block read / write / append
//! - Database directory lifecycle (fresh detection, temp purge, log reset)
//!
//! ## File Layout
//! ```text
//! {home_dir}/{db_name}/              {log_base_dir}/{db_name}/
//! ┌──────────────────────────┐       ┌──────────────────────────┐
//! │ student.tbl              │       │ storage.log              │
//! │ ┌───────┬───────┬──────┐ │       │ ┌───────┬───────┬──────┐ │
//! │ │ blk 0 │ blk 1 │ ...  │ │       │ │ blk 0 │ blk 1 │ ...  │ │
//! │ └───────┴───────┴──────┘ │       │ └───────┴───────┴──────┘ │
//! │ _temp3.tbl  (purged)     │       └──────────────────────────┘
//! └──────────────────────────┘
//! ```
//! Block `n` of a file lives at byte offset `n * block_size`. The two
//! directories may be the same.

use std::ffi::OsStr;
use std::path::{Component, Path};

mod block_id;
mod channel;
mod directory;
mod manager;
mod page;
mod registry;

pub use block_id::BlockId;
pub use channel::IoChannel;
pub use directory::DbDirectories;
pub use manager::FileManager;
pub use page::Page;
pub use registry::ChannelRegistry;

/// Default block size in bytes (4KB)
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Default name of the write-ahead log file
pub const DEFAULT_LOG_FILE_NAME: &str = "storage.log";

/// Files in the data directory starting with this prefix are transient and
/// are deleted on every startup
pub const TEMP_FILE_PREFIX: &str = "_temp";

/// Extension shared by every log file in the log directory
pub const LOG_FILE_EXTENSION: &str = "log";

/// A name that is exactly one ordinary path component, with nothing
/// (such as a trailing separator or `.`) normalized away
pub(crate) fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => part == OsStr::new(name),
        _ => false,
    }
}
