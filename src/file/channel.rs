//! I/O Channel
//!
//! An open physical file supporting positioned read, positioned write,
//! size query, sync and close.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

use parking_lot::RwLock;

use crate::error::{BlockFileError, Result};

/// Open handle to one file.
///
/// Positioned I/O does not move a shared cursor, so readers and writers only
/// need the read side of `file`. `close` takes the write side and leaves the
/// channel permanently closed; any later call fails with
/// [`BlockFileError::ChannelClosed`].
#[derive(Debug)]
pub struct IoChannel {
    path: PathBuf,
    file: RwLock<Option<File>>,
}

impl IoChannel {
    /// Open `path` for reading and writing, creating it if absent.
    /// Existing contents are kept.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(Some(file)),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fill `buf` from `offset`.
    ///
    /// Bytes past the end of the file are zero-filled. Returns the number of
    /// bytes that actually came from the file.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let guard = self.file.read();
        let file = self.opened(&guard)?;

        let mut filled = 0;
        while filled < buf.len() {
            match Self::pread(file, &mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        buf[filled..].fill(0);
        Ok(filled)
    }

    /// Write all of `buf` at `offset`, extending the file if needed
    pub fn write_at(&self, buf: &[u8], offset: u64) -> Result<()> {
        let guard = self.file.read();
        let file = self.opened(&guard)?;

        let mut written = 0;
        while written < buf.len() {
            match Self::pwrite(file, &buf[written..], offset + written as u64) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("wrote 0 bytes to {}", self.path.display()),
                    )
                    .into())
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Current file length in bytes
    pub fn size(&self) -> Result<u64> {
        let guard = self.file.read();
        Ok(self.opened(&guard)?.metadata()?.len())
    }

    /// Flush file contents and metadata to disk
    pub fn sync(&self) -> Result<()> {
        let guard = self.file.read();
        self.opened(&guard)?.sync_all()?;
        Ok(())
    }

    /// Sync and release the file handle. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.file.write();
        if let Some(file) = guard.take() {
            file.sync_all()?;
            tracing::debug!("Closed channel {}", self.path.display());
        }
        Ok(())
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.file.read().is_none()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn opened<'a>(&self, slot: &'a Option<File>) -> Result<&'a File> {
        slot.as_ref()
            .ok_or_else(|| BlockFileError::ChannelClosed(self.path.clone()))
    }

    #[inline]
    fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        #[cfg(unix)]
        {
            file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_read(buf, offset)
        }
    }

    #[inline]
    fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
        #[cfg(unix)]
        {
            file.write_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_write(buf, offset)
        }
    }
}
