//! Shutdown coordinator.
//!
//! Stops the registry from handing out new writers, then closes every
//! cached handle, waiting for pending merges.

use crate::core::error::Result;
use crate::core::registry::WriterRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of a shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownReport {
    /// Handles closed by this call
    pub handles_closed: usize,
}

pub struct ShutdownCoordinator {
    registry: Arc<WriterRegistry>,
    done: AtomicBool,
}

impl ShutdownCoordinator {
    pub fn new(registry: Arc<WriterRegistry>) -> Self {
        Self {
            registry,
            done: AtomicBool::new(false),
        }
    }

    /// Close every writer handle
    ///
    /// Only the first call does any work; later calls report zero
    /// handles. Every handle is attempted even if one fails to close.
    pub fn shutdown(&self) -> Result<ShutdownReport> {
        if self.done.swap(true, Ordering::SeqCst) {
            return Ok(ShutdownReport::default());
        }

        self.registry.close();
        let handles_closed = self.registry.evict_all(true)?;

        tracing::info!(handles_closed, "Shutdown complete");
        Ok(ShutdownReport { handles_closed })
    }

    pub fn is_shut_down(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}
