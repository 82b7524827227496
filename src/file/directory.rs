//! Database directories
//!
//! Resolves the data and log directories for one database and brings them
//! into a consistent state at startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{BlockFileError, Result};

use super::{LOG_FILE_EXTENSION, TEMP_FILE_PREFIX};

/// Data and log directory of one database
#[derive(Debug, Clone)]
pub struct DbDirectories {
    data_dir: PathBuf,
    log_dir: PathBuf,

    /// The data directory did not exist before this startup
    is_new: bool,
}

impl DbDirectories {
    /// Resolve and prepare the directories described by `config`
    ///
    /// On startup:
    /// 1. A missing data directory means a fresh database
    /// 2. Fresh database with a separate log directory: clear old log files
    ///    from it, or create it
    /// 3. Existing database without its log directory: refuse to start
    /// 4. Fresh database: create the data directory
    /// 5. Always: delete leftover temp files from the data directory
    pub fn prepare(config: &Config) -> Result<Self> {
        let data_dir = config.data_dir();
        let log_dir = config.log_dir();
        let is_new = !data_dir.exists();

        let dirs = Self {
            data_dir,
            log_dir,
            is_new,
        };

        if dirs.is_new && !dirs.shares_log_dir() {
            if dirs.log_dir.exists() {
                let stale = dirs
                    .scan_log_files()
                    .map_err(|source| startup_error(&dirs.log_dir, source))?;
                for name in stale {
                    remove_logged(&dirs.log_dir.join(name));
                }
            } else {
                create_dir(&dirs.log_dir)?;
            }
        }

        if !dirs.is_new && !dirs.log_dir.exists() {
            return Err(BlockFileError::MissingLogDirectory(dirs.log_dir));
        }

        if dirs.is_new {
            create_dir(&dirs.data_dir)?;
        }

        let purged = dirs
            .purge()
            .map_err(|source| startup_error(&dirs.data_dir, source))?;
        if purged > 0 {
            tracing::info!("Removed {} leftover temp files", purged);
        }

        Ok(dirs)
    }

    /// Delete every file in the data directory whose name starts with the
    /// temp prefix. Returns how many were removed.
    ///
    /// A temp file that cannot be deleted is logged at `warn` and left in
    /// place; it does not fail startup. Only a failure to list the directory
    /// is an error.
    pub fn purge_temp_files(&self) -> Result<usize> {
        Ok(self.purge()?)
    }

    /// Names of the log files currently in the log directory, sorted
    pub fn log_files(&self) -> Result<Vec<String>> {
        Ok(self.scan_log_files()?)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether logs live in the data directory itself
    pub fn shares_log_dir(&self) -> bool {
        self.data_dir == self.log_dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn purge(&self) -> io::Result<usize> {
        let mut removed = 0;

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let is_temp = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(TEMP_FILE_PREFIX));

            if is_temp && remove_logged(&entry.path()) {
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn scan_log_files(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.log_dir)? {
            let entry = entry?;
            let path = entry.path();

            if !entry.file_type()?.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_FILE_EXTENSION) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

fn startup_error(path: &Path, source: io::Error) -> BlockFileError {
    BlockFileError::Startup {
        path: path.to_path_buf(),
        source,
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| BlockFileError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Created directory {}", path.display());
    Ok(())
}

/// Remove a file, logging instead of failing. Returns whether it is gone.
pub(crate) fn remove_logged(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Deleted {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!("Cannot delete {}: {}", path.display(), e);
            false
        }
    }
}
