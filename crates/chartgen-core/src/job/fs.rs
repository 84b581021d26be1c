//! Filesystem access used by generation jobs

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// The file operations a job needs. Jobs never touch `std::fs` directly,
/// so a shell can route them through its own storage layer.
pub trait ChartFs: Send + Sync {
    /// Regular files directly inside `dir` (not recursive)
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Whole-file read
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create or truncate `path` with `contents`
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Rename `from` to `to`
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Check whether `path` exists
    fn exists(&self, path: &Path) -> bool;
}

/// [`ChartFs`] over the local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ChartFs for LocalFs {
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        Ok(fs::write(path, contents)?)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        Ok(fs::rename(from, to)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
