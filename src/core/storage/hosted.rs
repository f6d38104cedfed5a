//! Indexes hosted in process memory.

use super::StorageOpener;
use crate::core::error::{DocSearchError, Result};
use crate::core::types::StorageKind;
use dashmap::DashMap;
use std::sync::Arc;
use tantivy::directory::{Directory, RamDirectory};

/// In-process directory host keyed by case-insensitive location
///
/// Clones share the hosted directories, and a directory outlives the
/// writer handles that use it.
#[derive(Debug, Clone, Default)]
pub struct HostedDirectoryOpener {
    directories: Arc<DashMap<String, RamDirectory>>,
}

impl HostedDirectoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a hosted directory; returns whether it existed
    pub fn remove(&self, location: &str) -> bool {
        self.directories.remove(&location.to_lowercase()).is_some()
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

impl StorageOpener for HostedDirectoryOpener {
    fn kind(&self) -> StorageKind {
        StorageKind::HostedDirectory
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

        let key = location.to_lowercase();
        let directory = if create_if_missing {
            Some(self.directories.entry(key).or_default().clone())
        } else {
            self.directories.get(&key).map(|entry| entry.clone())
        };

        Ok(directory.map(|d| Box::new(d) as Box<dyn Directory>))
    }

    fn size_bytes(&self, location: &str) -> Option<u64> {
        self.directories
            .get(&location.to_lowercase())
            .map(|directory| directory.total_mem_usage() as u64)
    }
}
