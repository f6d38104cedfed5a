//! Indexes stored in local filesystem directories.

use super::StorageOpener;
use crate::core::error::{DocSearchError, Result};
use crate::core::types::StorageKind;
use std::fs;
use std::path::{Path, PathBuf};
use tantivy::directory::{Directory, MmapDirectory};
use walkdir::WalkDir;

/// Memory-mapped directories under an index root
#[derive(Debug, Clone)]
pub struct LocalFilesystemOpener {
    index_root: PathBuf,
}

impl LocalFilesystemOpener {
    pub fn new(index_root: PathBuf) -> Self {
        Self { index_root }
    }

    pub fn index_root(&self) -> &Path {
        &self.index_root
    }

    /// Absolute locations are kept, relative ones resolve under the root
    ///
    /// Relative locations are case-folded so every spelling of one index
    /// identity lands in the same directory.
    pub fn resolve(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.index_root.join(location.to_lowercase())
        }
    }
}

impl StorageOpener for LocalFilesystemOpener {
    fn kind(&self) -> StorageKind {
        StorageKind::LocalFilesystem
    }

    fn directory(
        &self,
        location: &str,
        create_if_missing: bool,
    ) -> Result<Option<Box<dyn Directory>>> {
        if location.trim().is_empty() {
            return Err(DocSearchError::IndexUnavailable(
                "index location is empty".to_string(),
            ));
        }

        let path = self.resolve(location);
        if !path.exists() {
            if !create_if_missing {
                return Ok(None);
            }
            fs::create_dir_all(&path).map_err(|e| {
                DocSearchError::IndexUnavailable(format!(
                    "Failed to create index directory {}: {e}",
                    path.display()
                ))
            })?;
        }

        let directory = MmapDirectory::open(&path).map_err(|e| {
            DocSearchError::IndexUnavailable(format!(
                "Failed to open index directory {}: {e}",
                path.display()
            ))
        })?;

        Ok(Some(Box::new(directory)))
    }

    fn size_bytes(&self, location: &str) -> Option<u64> {
        let path = self.resolve(location);
        if !path.exists() {
            return None;
        }

        let total = WalkDir::new(&path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|metadata| metadata.len())
            .sum();

        Some(total)
    }
}
