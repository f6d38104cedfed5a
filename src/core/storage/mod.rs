//! Storage backends for indexes.
//!
//! Every [`StorageKind`] is served by one [`StorageOpener`], which turns
//! an index location into a Tantivy `Directory`. The registry picks the
//! opener by the identity's kind; a kind with no registered opener is
//! rejected with `UnsupportedStorageKind`.
//!
//! # Local filesystem layout
//!
//! ```text
//! {index_root}/
//! ├── {relative-location, lowercased}/
//! │   ├── meta.json
//! │   ├── .managed.json
//! │   └── [segment files]
//! ```
//!
//! Absolute locations are used as given.

mod hosted;
mod local;

pub use hosted::HostedDirectoryOpener;
pub use local::LocalFilesystemOpener;

use crate::core::error::{DocSearchError, Result};
use crate::core::types::StorageKind;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tantivy::directory::Directory;

/// Opens Tantivy directories for one storage kind
pub trait StorageOpener: Send + Sync {
    /// Kind served by this opener
    fn kind(&self) -> StorageKind;

    /// Directory for `location`
    ///
    /// Returns `None` when the location does not exist and
    /// `create_if_missing` is false.
    fn directory(&self, location: &str, create_if_missing: bool)
        -> Result<Option<Box<dyn Directory>>>;

    /// Bytes used by the location, when the backend can tell
    fn size_bytes(&self, _location: &str) -> Option<u64> {
        None
    }
}

/// Registered openers keyed by storage kind
#[derive(Clone, Default)]
pub struct StorageOpeners {
    openers: HashMap<StorageKind, Arc<dyn StorageOpener>>,
}

impl std::fmt::Debug for StorageOpeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageOpeners")
            .field("kinds", &self.openers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StorageOpeners {
    /// Empty set; every kind is unsupported until registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Local filesystem rooted at `index_root` plus an in-process host
    pub fn standard(index_root: PathBuf) -> Self {
        Self::new()
            .with(LocalFilesystemOpener::new(index_root))
            .with(HostedDirectoryOpener::new())
    }

    /// Register an opener, replacing any opener of the same kind
    pub fn with(mut self, opener: impl StorageOpener + 'static) -> Self {
        self.register(Arc::new(opener));
        self
    }

    pub fn register(&mut self, opener: Arc<dyn StorageOpener>) {
        self.openers.insert(opener.kind(), opener);
    }

    /// Opener for `kind`
    pub fn get(&self, kind: StorageKind) -> Result<&Arc<dyn StorageOpener>> {
        self.openers
            .get(&kind)
            .ok_or_else(|| DocSearchError::UnsupportedStorageKind(kind.to_string()))
    }

    pub fn kinds(&self) -> Vec<StorageKind> {
        self.openers.keys().copied().collect()
    }
}
