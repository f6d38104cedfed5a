//! Mutation service.
//!
//! Add, update, delete, clear and commit against a named index. Every
//! operation gets its writer through the registry with
//! `create_if_missing = true`. When the engine runs out of resources the
//! handle is evicted without waiting and the caller receives
//! `ResourceExhausted`; the next request opens a fresh handle.

use crate::core::engine::document::{to_native_document, to_native_term, validate_document};
use crate::core::engine::WriterHandle;
use crate::core::error::{DocSearchError, Result};
use crate::core::registry::WriterRegistry;
use crate::core::types::{Document, IndexIdentity, Term};
use std::sync::Arc;

/// Mutation service
pub struct MutationService {
    registry: Arc<WriterRegistry>,
}

impl MutationService {
    pub fn new(registry: Arc<WriterRegistry>) -> Self {
        Self { registry }
    }

    /// Add a document; no deduplication
    pub fn add_document(&self, identity: &IndexIdentity, document: &Document) -> Result<()> {
        validate_document(document)?;
        self.with_handle(identity, |handle| {
            let native = to_native_document(document, handle.fields())?;
            handle.add(native)
        })
    }

    /// Add several documents
    ///
    /// Every document is validated before any of them reaches the engine.
    pub fn add_documents(&self, identity: &IndexIdentity, documents: &[Document]) -> Result<()> {
        documents.iter().try_for_each(validate_document)?;
        self.with_handle(identity, |handle| {
            let natives = documents
                .iter()
                .map(|document| to_native_document(document, handle.fields()))
                .collect::<Result<Vec<_>>>()?;
            handle.add_all(natives)
        })
    }

    /// Replace every document matching `term` with `document`
    ///
    /// Inserts when nothing matches.
    pub fn update_document(
        &self,
        identity: &IndexIdentity,
        term: &Term,
        document: &Document,
    ) -> Result<()> {
        validate_term(term)?;
        validate_document(document)?;
        self.with_handle(identity, |handle| {
            let native = to_native_document(document, handle.fields())?;
            handle.update(to_native_term(term, handle.fields()), native)
        })
    }

    /// Delete every document matching `term`; zero matches is fine
    pub fn delete_documents(&self, identity: &IndexIdentity, term: &Term) -> Result<()> {
        validate_term(term)?;
        self.with_handle(identity, |handle| {
            handle.delete(to_native_term(term, handle.fields()))
        })
    }

    /// Delete every document
    pub fn clear_index(&self, identity: &IndexIdentity) -> Result<()> {
        self.with_handle(identity, |handle| handle.delete_all())
    }

    /// Persist pending work; queries see it once this returns
    pub fn commit(&self, identity: &IndexIdentity) -> Result<()> {
        self.with_handle(identity, |handle| handle.commit())
    }

    /// Run `op` against the writer of `identity`
    ///
    /// A handle closed by a concurrent eviction is re-acquired once.
    /// Exhaustion evicts the handle without waiting for pending work.
    fn with_handle(
        &self,
        identity: &IndexIdentity,
        op: impl Fn(&WriterHandle) -> Result<()>,
    ) -> Result<()> {
        let mut retried = false;
        loop {
            let handle = self.registry.get_or_create_writer(identity, true)?;

            match op(&handle) {
                Ok(()) => return Ok(()),
                Err(DocSearchError::IndexUnavailable(_)) if handle.is_closed() && !retried => {
                    tracing::debug!(index = %identity, "Writer handle closed concurrently, retrying");
                    retried = true;
                }
                Err(e @ DocSearchError::ResourceExhausted(_)) => {
                    tracing::warn!(
                        index = %identity,
                        "Resource exhaustion, evicting writer handle: {e}"
                    );
                    self.registry.evict_exhausted(identity, &handle);
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn validate_term(term: &Term) -> Result<()> {
    if term.field_name.trim().is_empty() {
        return Err(DocSearchError::InvalidDocument(
            "term field name is empty".to_string(),
        ));
    }
    Ok(())
}
