//! File Manager
//!
//! The database stores its data as files within a directory. The file manager
//! reads a block into a caller's buffer, writes a buffer into a block, and
//! appends a buffer to the end of a file.
//!
//! ## Responsibilities
//! - Prepare the data and log directories on startup
//! - Route block operations to the right channel
//! - Keep appends race-free across threads
//! - Reset the write-ahead log on request

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{BlockFileError, Result};

use super::directory::remove_logged;
use super::{BlockId, ChannelRegistry, DbDirectories, IoChannel};

/// Block-level access to every file of one database
///
/// ## Concurrency:
/// - `io_lock`: one coarse mutex serializing read, write, append, size, sync,
///   log rebuild and close. Append reads the file size and then writes at
///   that position; holding the lock across both steps is what keeps two
///   appends to the same file from picking the same block number.
/// - `channels`: internally synchronized, safe to use without `io_lock`
/// - All methods use `&self`; share the manager between threads with `Arc`
///
/// ## Failure policy:
/// Every I/O failure is returned to the caller, including from `append`.
/// Nothing is retried here.
#[derive(Debug)]
pub struct FileManager {
    dirs: DbDirectories,

    /// Open channels, one per file name, kept until rebuild or close
    channels: ChannelRegistry,

    block_size: usize,

    sync_on_write: bool,

    io_lock: Mutex<()>,
}

impl FileManager {
    /// Open the database described by `config`
    ///
    /// Creates the directories for a fresh database and purges leftover temp
    /// files. Fails with a startup error (see
    /// [`BlockFileError::is_startup_error`]) if the layout is unusable.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let dirs = DbDirectories::prepare(&config)?;
        let channels = ChannelRegistry::new(
            dirs.data_dir(),
            dirs.log_dir(),
            config.log_file_name.as_str(),
        );

        tracing::info!(
            "File manager ready: data_dir={}, log_dir={}, block_size={}, new={}",
            dirs.data_dir().display(),
            dirs.log_dir().display(),
            config.block_size,
            dirs.is_new()
        );

        Ok(Self {
            dirs,
            channels,
            block_size: config.block_size,
            sync_on_write: config.sync_on_write,
            io_lock: Mutex::new(()),
        })
    }

    /// Open with a home directory and database name (convenience method)
    ///
    /// Uses default config otherwise
    pub fn open_in(home_dir: &Path, db_name: &str) -> Result<Self> {
        let config = Config::builder()
            .home_dir(home_dir)
            .db_name(db_name)
            .build();
        Self::open(config)
    }

    /// Read the contents of `block` into `dest`
    ///
    /// `dest` must be exactly one block long. Any part of the block lying at
    /// or beyond the end of the file reads as zeros.
    pub fn read(&self, block: &BlockId, dest: &mut [u8]) -> Result<()> {
        self.check_buffer(dest.len())?;
        let offset = self.offset_of(block)?;

        let _guard = self.io_lock.lock();
        let channel = self.channels.get_or_open(block.file_name())?;

        channel
            .read_at(dest, offset)
            .map_err(|e| {
                let e = with_io_context(e, |source| BlockFileError::Read {
                    block: block.clone(),
                    source,
                });
                tracing::error!("{}", e);
                e
            })?;

        Ok(())
    }

    /// Write `src` into `block`
    ///
    /// `src` must be exactly one block long. Writing past the end of the file
    /// extends it.
    pub fn write(&self, block: &BlockId, src: &[u8]) -> Result<()> {
        self.check_buffer(src.len())?;
        let offset = self.offset_of(block)?;

        let _guard = self.io_lock.lock();
        let channel = self.channels.get_or_open(block.file_name())?;

        let written = channel.write_at(src, offset).and_then(|()| {
            if self.sync_on_write {
                channel.sync()
            } else {
                Ok(())
            }
        });

        written
            .map_err(|e| {
                let e = with_io_context(e, |source| BlockFileError::Write {
                    block: block.clone(),
                    source,
                });
                tracing::error!("{}", e);
                e
            })
    }

    /// Append `src` as a new block at the end of `file_name`
    ///
    /// The new block number is the file's size in blocks at the time of the
    /// call. A trailing partial block, if any, is overwritten.
    pub fn append(&self, file_name: &str, src: &[u8]) -> Result<BlockId> {
        self.check_buffer(src.len())?;

        let _guard = self.io_lock.lock();
        let channel = self.channels.get_or_open(file_name)?;

        let append_err = |e: BlockFileError| {
            let e = with_io_context(e, |source| BlockFileError::Append {
                file_name: file_name.to_string(),
                source,
            });
            tracing::error!("{}", e);
            e
        };

        let size = channel.size().map_err(append_err)?;
        let block = BlockId::new(file_name, size / self.block_size as u64);
        let offset = self.offset_of(&block)?;

        channel.write_at(src, offset).map_err(append_err)?;
        if self.sync_on_write {
            channel.sync().map_err(append_err)?;
        }

        Ok(block)
    }

    /// Number of whole blocks in `file_name`. Creates the file if absent.
    pub fn size(&self, file_name: &str) -> Result<u64> {
        let _guard = self.io_lock.lock();
        self.size_locked(file_name)
    }

    /// Whether the data directory had to be created on this startup
    pub fn is_new(&self) -> bool {
        self.dirs.is_new()
    }

    /// Delete every log file in the log directory and start a new, empty one
    ///
    /// Channels open on the deleted files are closed first. The channel
    /// registered under the reserved log file name is always replaced, even
    /// if its file already vanished from disk.
    pub fn rebuild_log_file(&self) -> Result<()> {
        let _guard = self.io_lock.lock();

        for name in self.dirs.log_files()? {
            let path = self.dirs.log_dir().join(&name);

            // Only a registered name that resolves into the log directory
            // refers to this file
            if self.channels.contains(&name) && self.channels.resolve(&name)? == path {
                self.channels.remove(&name)?;
            }
            remove_logged(&path);
        }

        let log_file_name = self.channels.log_file_name();
        self.channels.remove(log_file_name)?;
        self.channels.get_or_open(log_file_name)?;

        tracing::info!(
            "Rebuilt log file {}",
            self.dirs.log_dir().join(log_file_name).display()
        );
        Ok(())
    }

    /// Flush one file to disk
    pub fn sync(&self, file_name: &str) -> Result<()> {
        let _guard = self.io_lock.lock();
        let channel = self.channels.get_or_open(file_name)?;
        channel.sync()?;
        Ok(())
    }

    /// Flush every open file to disk
    pub fn sync_all(&self) -> Result<()> {
        let _guard = self.io_lock.lock();
        for channel in self.channels.channels() {
            channel.sync()?;
        }
        Ok(())
    }

    /// Sync and close every open channel (shutdown)
    ///
    /// Later operations reopen files on demand.
    pub fn close(&self) -> Result<()> {
        let _guard = self.io_lock.lock();
        self.channels.close_all()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The channel currently serving `file_name`, opening it if needed
    pub fn channel(&self, file_name: &str) -> Result<Arc<IoChannel>> {
        self.channels.get_or_open(file_name)
    }

    /// Number of open channels
    pub fn open_channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn data_dir(&self) -> &Path {
        self.dirs.data_dir()
    }

    pub fn log_dir(&self) -> &Path {
        self.dirs.log_dir()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn log_file_name(&self) -> &str {
        self.channels.log_file_name()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn size_locked(&self, file_name: &str) -> Result<u64> {
        let channel = self.channels.get_or_open(file_name)?;
        let len = channel.size().map_err(|e| {
            with_io_context(e, |source| BlockFileError::Size {
                file_name: file_name.to_string(),
                source,
            })
        })?;
        Ok(len / self.block_size as u64)
    }

    fn check_buffer(&self, len: usize) -> Result<()> {
        if len != self.block_size {
            return Err(BlockFileError::InvalidBufferSize {
                expected: self.block_size,
                actual: len,
            });
        }
        Ok(())
    }

    /// Start offset of `block`; the whole block must be addressable
    fn offset_of(&self, block: &BlockId) -> Result<u64> {
        block
            .byte_offset(self.block_size)
            .filter(|offset| offset.checked_add(self.block_size as u64).is_some())
            .ok_or_else(|| BlockFileError::BlockOutOfRange(block.clone()))
    }
}

/// Attach operation context to a raw I/O failure; other errors pass through
fn with_io_context(
    err: BlockFileError,
    wrap: impl FnOnce(std::io::Error) -> BlockFileError,
) -> BlockFileError {
    match err {
        BlockFileError::Io(source) => wrap(source),
        other => other,
    }
}
