//! Channel Registry
//!
//! Maps file names to open channels.
//!
//! ## Concurrency:
//! - `channels`: RwLock over a HashMap
//! - Lookups take the read lock; a miss re-checks under the write lock before
//!   opening, so concurrent first access to one name opens exactly one file
//!   and every caller gets the same `Arc`
//! - Independent of the file manager's coarse lock

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{BlockFileError, Result};

use super::{is_plain_name, IoChannel};

/// Lazily opened channels, at most one per file name
#[derive(Debug)]
pub struct ChannelRegistry {
    /// Directory holding table and index files
    data_dir: PathBuf,

    /// Directory holding the log file
    log_dir: PathBuf,

    /// Name routed to `log_dir`
    log_file_name: String,

    channels: RwLock<HashMap<String, Arc<IoChannel>>>,
}

impl ChannelRegistry {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
        log_file_name: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_dir: log_dir.into(),
            log_file_name: log_file_name.into(),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Return the channel for `file_name`, opening (and creating) the file on
    /// first use
    pub fn get_or_open(&self, file_name: &str) -> Result<Arc<IoChannel>> {
        // Fast path
        if let Some(channel) = self.channels.read().get(file_name) {
            return Ok(Arc::clone(channel));
        }

        let mut channels = self.channels.write();

        // Another thread may have opened it while we waited
        if let Some(channel) = channels.get(file_name) {
            return Ok(Arc::clone(channel));
        }

        let path = self.resolve(file_name)?;
        let channel = Arc::new(IoChannel::open(&path)?);
        tracing::debug!("Opened channel {}", path.display());

        channels.insert(file_name.to_string(), Arc::clone(&channel));
        Ok(channel)
    }

    /// Close and evict the channel for `file_name`.
    /// Returns whether a channel was registered.
    pub fn remove(&self, file_name: &str) -> Result<bool> {
        let removed = self.channels.write().remove(file_name);

        match removed {
            Some(channel) => {
                channel.close()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Close and evict every channel. Every channel is attempted; the first
    /// failure is returned.
    pub fn close_all(&self) -> Result<()> {
        let drained: Vec<_> = self.channels.write().drain().collect();

        let mut first_err = None;
        for (name, channel) in drained {
            if let Err(e) = channel.close() {
                tracing::warn!("Failed to close {}: {}", name, e);
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Snapshot of the currently registered channels
    pub fn channels(&self) -> Vec<Arc<IoChannel>> {
        self.channels.read().values().cloned().collect()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.channels.read().contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }

    /// Reserved log file name
    pub fn log_file_name(&self) -> &str {
        &self.log_file_name
    }

    /// Path a file name maps to: the log directory for the log file, the
    /// data directory for everything else
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        if !is_plain_name(file_name) {
            return Err(BlockFileError::InvalidFileName(file_name.to_string()));
        }

        let dir = if file_name == self.log_file_name {
            &self.log_dir
        } else {
            &self.data_dir
        };
        Ok(dir.join(file_name))
    }
}
