//! Configuration for blockfile
//!
//! Centralized configuration with sensible defaults. A `Config` value is
//! handed to [`FileManager::open`](crate::FileManager::open); nothing is read
//! from process-wide state.

use std::path::{Path, PathBuf};

use crate::error::{BlockFileError, Result};
use crate::file::{is_plain_name, DEFAULT_BLOCK_SIZE, DEFAULT_LOG_FILE_NAME, LOG_FILE_EXTENSION};

/// Main configuration for a file manager instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Directory Configuration
    // -------------------------------------------------------------------------
    /// Parent of the data directory.
    /// Internal structure:
    ///   {home_dir}/
    ///     └── {db_name}/       (table and index files)
    pub home_dir: PathBuf,

    /// Name of the database; used as the directory name under both
    /// `home_dir` and the log base directory
    pub db_name: String,

    /// Parent of the log directory. `None` places logs under `home_dir`,
    /// i.e. in the data directory itself.
    pub log_base_dir: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Block Configuration
    // -------------------------------------------------------------------------
    /// Fixed block length in bytes used for all offset arithmetic
    pub block_size: usize,

    /// Reserved file name routed to the log directory
    pub log_file_name: String,

    /// fsync the channel after every write and append
    pub sync_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_dir: PathBuf::from("."),
            db_name: "blockfile_db".to_string(),
            log_base_dir: None,
            block_size: DEFAULT_BLOCK_SIZE,
            log_file_name: DEFAULT_LOG_FILE_NAME.to_string(),
            sync_on_write: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `{home_dir}/{db_name}`
    pub fn data_dir(&self) -> PathBuf {
        self.home_dir.join(&self.db_name)
    }

    /// `{log_base_dir}/{db_name}`, falling back to the data directory
    pub fn log_dir(&self) -> PathBuf {
        self.log_base_dir
            .as_deref()
            .unwrap_or(self.home_dir.as_path())
            .join(&self.db_name)
    }

    /// Reject configurations that cannot describe a usable database layout
    pub fn validate(&self) -> Result<()> {
        if !is_plain_name(&self.db_name) {
            return Err(BlockFileError::Config(format!(
                "database name {:?} must be a single directory name",
                self.db_name
            )));
        }

        if self.block_size == 0 {
            return Err(BlockFileError::Config(
                "block size must be greater than zero".to_string(),
            ));
        }

        let log_path = Path::new(&self.log_file_name);
        if !is_plain_name(&self.log_file_name)
            || log_path.extension().and_then(|e| e.to_str()) != Some(LOG_FILE_EXTENSION)
        {
            return Err(BlockFileError::Config(format!(
                "log file name {:?} must be a plain file name ending in .{}",
                self.log_file_name, LOG_FILE_EXTENSION
            )));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the home directory (parent of the data directory)
    pub fn home_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.home_dir = path.into();
        self
    }

    /// Set the database name
    pub fn db_name(mut self, name: impl Into<String>) -> Self {
        self.config.db_name = name.into();
        self
    }

    /// Set a separate base directory for log files
    pub fn log_base_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.config.log_base_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    /// Set the reserved log file name
    pub fn log_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.log_file_name = name.into();
        self
    }

    /// Enable or disable fsync after every write
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.config.sync_on_write = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
