//! Writer registry.
//!
//! Caches one [`WriterHandle`] per index identity. The map holds a
//! once-cell slot per identity; the slot is inserted under the map's
//! shard lock and the blocking open runs inside the slot initializer,
//! outside any map lock. Concurrent first callers for one identity wait
//! on the same slot and receive the same `Arc`.

use crate::core::engine::{WriterHandle, WriterSettings};
use crate::core::error::{DocSearchError, Result};
use crate::core::storage::StorageOpeners;
use crate::core::types::IndexIdentity;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Slot = Arc<OnceCell<Arc<WriterHandle>>>;

/// Owner of all live writer handles
pub struct WriterRegistry {
    openers: StorageOpeners,
    settings: WriterSettings,
    writers: DashMap<IndexIdentity, Slot>,
    closed: AtomicBool,
}

impl std::fmt::Debug for WriterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterRegistry")
            .field("openers", &self.openers)
            .field("handles", &self.writers.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl WriterRegistry {
    pub fn new(openers: StorageOpeners, settings: WriterSettings) -> Self {
        Self {
            openers,
            settings,
            writers: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn openers(&self) -> &StorageOpeners {
        &self.openers
    }

    /// Cached handle for `identity`, opening it on first use
    ///
    /// Failures leave no cache entry behind.
    pub fn get_or_create_writer(
        &self,
        identity: &IndexIdentity,
        create_if_missing: bool,
    ) -> Result<Arc<WriterHandle>> {
        loop {
            if self.is_closed() {
                return Err(refused(identity));
            }

            let slot: Slot = self
                .writers
                .entry(identity.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone();

            let handle = match slot.get_or_try_init(|| self.open(identity, create_if_missing)) {
                Ok(handle) => Arc::clone(handle),
                Err(e) => {
                    self.writers
                        .remove_if(identity, |_, current| Arc::ptr_eq(current, &slot));
                    tracing::warn!(index = %identity, "Failed to open writer handle: {e}");
                    return Err(e);
                }
            };

            // A shutdown that started after the first check may have
            // snapshotted the map before this slot was inserted.
            if self.is_closed() {
                self.writers
                    .remove_if(identity, |_, current| Arc::ptr_eq(current, &slot));
                handle.close(true)?;
                return Err(refused(identity));
            }

            let still_cached = self
                .writers
                .get(identity)
                .is_some_and(|current| Arc::ptr_eq(current.value(), &slot));

            if still_cached && !handle.is_closed() {
                return Ok(handle);
            }

            // Evicted while opening, or closed under us: make sure the
            // stale handle is released and try again with a fresh slot.
            if still_cached {
                self.writers
                    .remove_if(identity, |_, current| Arc::ptr_eq(current, &slot));
            }
            handle.close(false)?;
        }
    }

    fn open(&self, identity: &IndexIdentity, create_if_missing: bool) -> Result<Arc<WriterHandle>> {
        let opener = self.openers.get(identity.kind)?;
        let directory = opener.directory(&identity.location, create_if_missing)?;
        let handle =
            WriterHandle::open(identity.clone(), directory, create_if_missing, self.settings)?;
        Ok(Arc::new(handle))
    }

    /// Cached handle without opening
    pub fn get(&self, identity: &IndexIdentity) -> Option<Arc<WriterHandle>> {
        self.writers
            .get(identity)
            .and_then(|slot| slot.get().cloned())
    }

    /// Remove and close the handle of `identity`
    ///
    /// Returns whether a handle was closed. With `wait_for_pending_work`
    /// false, uncommitted work is discarded.
    pub fn evict(&self, identity: &IndexIdentity, wait_for_pending_work: bool) -> Result<bool> {
        let Some((_, slot)) = self.writers.remove(identity) else {
            return Ok(false);
        };
        let Some(handle) = slot.get() else {
            return Ok(false);
        };

        tracing::info!(
            index = %identity,
            wait = wait_for_pending_work,
            "Evicting writer handle"
        );
        handle.close(wait_for_pending_work)?;
        Ok(true)
    }

    /// Remove and close `handle`, but only while it is the cached handle
    /// of `identity`
    ///
    /// A handle that was already replaced is closed without touching its
    /// successor. Returns whether the cache entry was removed.
    pub fn evict_handle(
        &self,
        identity: &IndexIdentity,
        handle: &Arc<WriterHandle>,
        wait_for_pending_work: bool,
    ) -> Result<bool> {
        let removed = self
            .writers
            .remove_if(identity, |_, slot| {
                slot.get().is_some_and(|current| Arc::ptr_eq(current, handle))
            })
            .is_some();

        tracing::info!(
            index = %identity,
            wait = wait_for_pending_work,
            cached = removed,
            "Evicting writer handle"
        );
        handle.close(wait_for_pending_work)?;
        Ok(removed)
    }

    /// Evict `handle` after the engine ran out of resources
    ///
    /// Pending work on the handle is discarded. Eviction failures are only
    /// logged; the caller still reports the exhaustion.
    pub fn evict_exhausted(&self, identity: &IndexIdentity, handle: &Arc<WriterHandle>) {
        if let Err(e) = self.evict_handle(identity, handle, false) {
            tracing::error!(index = %identity, "Failed to evict exhausted writer handle: {e}");
        }
    }

    /// Evict every cached handle
    ///
    /// All identities are attempted; the first failure is returned after
    /// the rest have been closed. On success returns the number of handles
    /// closed.
    pub fn evict_all(&self, wait_for_pending_work: bool) -> Result<usize> {
        let mut closed = 0;
        let mut first_error = None;

        for identity in self.identities() {
            match self.evict(&identity, wait_for_pending_work) {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(index = %identity, "Failed to close writer handle: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(closed),
        }
    }

    /// Identities with a cached slot
    pub fn identities(&self) -> Vec<IndexIdentity> {
        self.writers.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Refuse new handles from now on
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn refused(identity: &IndexIdentity) -> DocSearchError {
    DocSearchError::IndexUnavailable(format!("registry is shut down; cannot open {identity}"))
}
