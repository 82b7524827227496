//! Block identifier
//!
//! A reference to one disk block. It does not hold the block's contents;
//! that is the job of a [`Page`](super::Page).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a block by file name and block number.
///
/// Equality, hashing and ordering are by value over `(file_name, number)`,
/// so a `BlockId` can key buffer-pool and lock tables upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId {
    file_name: String,
    number: u64,
}

impl BlockId {
    /// Create an identifier for block `number` of `file_name`
    pub fn new(file_name: impl Into<String>, number: u64) -> Self {
        Self {
            file_name: file_name.into(),
            number,
        }
    }

    /// Name of the file where the block lives
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Position of the block within the file
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Byte offset of the block for the given block size.
    /// `None` if the offset does not fit in a `u64`.
    pub fn byte_offset(&self, block_size: usize) -> Option<u64> {
        self.number.checked_mul(block_size as u64)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}
