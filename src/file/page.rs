//! Page
//!
//! A block-sized byte buffer. It moves its contents to and from disk through
//! a [`FileManager`] and offers big-endian typed accessors for the layers
//! that lay out records in it.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{BlockFileError, Result};

use super::{BlockId, FileManager};

const INT_SIZE: usize = 4;
const LONG_SIZE: usize = 8;

/// Contents of one block held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    contents: BytesMut,
}

impl Page {
    /// A zeroed page of `block_size` bytes
    pub fn new(block_size: usize) -> Self {
        Self {
            contents: BytesMut::zeroed(block_size),
        }
    }

    /// Load the contents of `block`
    pub fn read(&mut self, block: &BlockId, fm: &FileManager) -> Result<()> {
        fm.read(block, &mut self.contents)
    }

    /// Store the contents into `block`
    pub fn write(&self, block: &BlockId, fm: &FileManager) -> Result<()> {
        fm.write(block, &self.contents)
    }

    /// Store the contents as a new block at the end of `file_name`
    pub fn append(&self, file_name: &str, fm: &FileManager) -> Result<BlockId> {
        fm.append(file_name, &self.contents)
    }

    pub fn get_i32(&self, offset: usize) -> Result<i32> {
        Ok(self.slice(offset, INT_SIZE)?.get_i32())
    }

    pub fn set_i32(&mut self, offset: usize, value: i32) -> Result<()> {
        self.slice_mut(offset, INT_SIZE)?.put_i32(value);
        Ok(())
    }

    pub fn get_i64(&self, offset: usize) -> Result<i64> {
        Ok(self.slice(offset, LONG_SIZE)?.get_i64())
    }

    pub fn set_i64(&mut self, offset: usize, value: i64) -> Result<()> {
        self.slice_mut(offset, LONG_SIZE)?.put_i64(value);
        Ok(())
    }

    /// Read a byte string stored as a 4-byte length followed by the bytes
    pub fn get_bytes(&self, offset: usize) -> Result<Vec<u8>> {
        let len = self.slice(offset, INT_SIZE)?.get_u32() as usize;
        Ok(self.slice(offset + INT_SIZE, len)?.to_vec())
    }

    /// Store `value` as a 4-byte length followed by the bytes
    pub fn set_bytes(&mut self, offset: usize, value: &[u8]) -> Result<()> {
        let len = u32::try_from(value.len()).map_err(|_| BlockFileError::PageOverflow {
            offset,
            len: value.len(),
            capacity: self.contents.len(),
        })?;

        let mut dst = self.slice_mut(offset, INT_SIZE + value.len())?;
        dst.put_u32(len);
        dst.put_slice(value);
        Ok(())
    }

    /// Bytes needed to store a byte string of `len` with `set_bytes`
    pub fn max_bytes_len(len: usize) -> usize {
        INT_SIZE + len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.contents
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = self.end_of(offset, len)?;
        Ok(&self.contents[offset..end])
    }

    fn slice_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let end = self.end_of(offset, len)?;
        Ok(&mut self.contents[offset..end])
    }

    fn end_of(&self, offset: usize, len: usize) -> Result<usize> {
        offset
            .checked_add(len)
            .filter(|&end| end <= self.contents.len())
            .ok_or(BlockFileError::PageOverflow {
                offset,
                len,
                capacity: self.contents.len(),
            })
    }
}
