//! Per-version archive cache.
//!
//! Archives are stored as `{root}/{version}/{archive}` where the root is a
//! fixed sub-path of the host's cache directory. Entries are only ever
//! created whole (after a verified download) or deleted whole (after a
//! failed verification).

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Path of the archive cache below the host cache directory.
pub const CACHE_SUBDIR: [&str; 3] = ["files", "lbaey-chromedriver", "downloaded-bin"];

/// Archive cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    enabled: bool,
}

impl CacheStore {
    /// Create a store below the host cache directory.
    #[must_use]
    pub fn new(cache_dir: &Path, enabled: bool) -> Self {
        let root = CACHE_SUBDIR
            .iter()
            .fold(cache_dir.to_path_buf(), |path, part| path.join(part));
        Self { root, enabled }
    }

    /// Get the cache root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether cached archives may be reused.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Get the path of `filename` for `version`, creating the version
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidVersion` if `version` is not a single plain
    /// path component, and `Error::Filesystem` if the directory cannot be
    /// created.
    pub fn path(&self, version: &str, filename: &str) -> Result<PathBuf> {
        let mut components = Path::new(version).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(Error::InvalidVersion(version.to_string()));
        }

        let dir = self.root.join(version);
        fs::create_dir_all(&dir).map_err(|e| Error::fs(&dir, e))?;
        Ok(dir.join(filename))
    }

    /// Whether a cached file exists.
    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Delete a cached file. A file that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::Filesystem` if the file exists but cannot be removed.
    pub fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                log::debug!("Removed cached archive {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::fs(path, e)),
        }
    }
}
