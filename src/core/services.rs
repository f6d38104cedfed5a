//! Unified service container for docsearch
//!
//! Provides shared access to all core services. Every service shares one
//! writer registry.

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::mutation::MutationService;
use crate::core::registry::WriterRegistry;
use crate::core::search::QueryService;
use crate::core::shutdown::{ShutdownCoordinator, ShutdownReport};
use crate::core::storage::StorageOpeners;
use std::sync::Arc;

/// Unified services container
#[derive(Clone)]
pub struct Services {
    /// Writer handles shared by every service
    pub registry: Arc<WriterRegistry>,

    /// Add, update, delete and commit
    pub mutation: Arc<MutationService>,

    /// Plain and structured queries
    pub query: Arc<QueryService>,

    /// Closes every writer on the way out
    pub shutdown: Arc<ShutdownCoordinator>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl Services {
    /// Create services from configuration with the standard storage openers
    pub fn new(config: Config) -> Self {
        let openers = StorageOpeners::standard(config.storage.index_root.clone());
        Self::with_openers(config, openers)
    }

    /// Create services over a custom set of storage openers
    pub fn with_openers(config: Config, openers: StorageOpeners) -> Self {
        let registry = Arc::new(WriterRegistry::new(openers, config.writer_settings()));

        let mutation = Arc::new(MutationService::new(Arc::clone(&registry)));
        let query = Arc::new(QueryService::new(Arc::clone(&registry), &config.search));
        let shutdown = Arc::new(ShutdownCoordinator::new(Arc::clone(&registry)));

        Self {
            registry,
            mutation,
            query,
            shutdown,
            config: Arc::new(config),
        }
    }

    /// Close every writer handle; see [`ShutdownCoordinator::shutdown`]
    pub fn shutdown(&self) -> Result<ShutdownReport> {
        self.shutdown.shutdown()
    }
}
