//! Per-index writer handle.
//!
//! A handle owns the Tantivy index, its single `IndexWriter` and a
//! manually reloaded reader. Mutations share the writer through the
//! read side of an `RwLock`; commit and close take the write side, so
//! a close waits for in-flight mutations and nothing can slip between a
//! delete and the add of an update.

use crate::core::engine::classify;
use crate::core::engine::schema::{create_schema, EngineFields};
use crate::core::error::{DocSearchError, Result};
use crate::core::types::{IndexIdentity, IndexStats};
use parking_lot::RwLock;
use tantivy::directory::Directory;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};

#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

/// Memory and thread budget of each `IndexWriter`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterSettings {
    pub heap_size_bytes: usize,
    pub num_threads: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            heap_size_bytes: 50_000_000,
            num_threads: 1,
        }
    }
}

/// Writer handle for one index identity
pub struct WriterHandle {
    identity: IndexIdentity,
    index: Index,
    fields: EngineFields,
    writer: RwLock<Option<IndexWriter>>,
    reader: IndexReader,
    #[cfg(test)]
    exhaust_next: AtomicBool,
}

impl std::fmt::Debug for WriterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterHandle")
            .field("identity", &self.identity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl WriterHandle {
    /// Open the index held by `directory`
    ///
    /// With `create_if_missing` an absent index is created and an existing
    /// one is appended to. Without it an absent index fails with
    /// `IndexNotFound`. A directory of `None` means the storage location
    /// itself does not exist.
    pub fn open(
        identity: IndexIdentity,
        directory: Option<Box<dyn Directory>>,
        create_if_missing: bool,
        settings: WriterSettings,
    ) -> Result<Self> {
        let not_found = || DocSearchError::IndexNotFound(identity.to_string());

        let directory = directory.ok_or_else(not_found)?;
        let exists = Index::exists(&*directory).map_err(|e| {
            DocSearchError::IndexUnavailable(format!("Failed to inspect {identity}: {e}"))
        })?;

        let index = match (exists, create_if_missing) {
            (true, _) => Index::open(directory),
            (false, true) => Index::create(
                directory,
                create_schema(),
                tantivy::IndexSettings::default(),
            ),
            (false, false) => return Err(not_found()),
        }
        .map_err(|e| classify(&format!("Failed to open index {identity}"), e))?;

        let fields = EngineFields::resolve(&index.schema())?;

        let writer = index
            .writer_with_num_threads(settings.num_threads, settings.heap_size_bytes)
            .map_err(|e| classify(&format!("Failed to create writer for {identity}"), e))?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| classify(&format!("Failed to create reader for {identity}"), e))?;

        tracing::info!(
            index = %identity,
            created = !exists,
            "Opened writer handle"
        );

        Ok(Self {
            identity,
            index,
            fields,
            writer: RwLock::new(Some(writer)),
            reader,
            #[cfg(test)]
            exhaust_next: AtomicBool::new(false),
        })
    }

    pub fn identity(&self) -> &IndexIdentity {
        &self.identity
    }

    pub fn fields(&self) -> &EngineFields {
        &self.fields
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// True once the handle has been closed
    pub fn is_closed(&self) -> bool {
        self.writer.read().is_none()
    }

    fn closed_error(&self) -> DocSearchError {
        DocSearchError::IndexUnavailable(format!("writer for {} is closed", self.identity))
    }

    /// Run a document operation under the shared side of the lock
    fn with_writer<T>(&self, op: impl FnOnce(&IndexWriter) -> Result<T>) -> Result<T> {
        let guard = self.writer.read();
        let writer = guard.as_ref().ok_or_else(|| self.closed_error())?;

        self.check_injected_exhaustion()?;

        op(writer)
    }

    /// Add one document
    pub fn add(&self, document: TantivyDocument) -> Result<()> {
        self.with_writer(|writer| {
            writer
                .add_document(document)
                .map(|_| ())
                .map_err(|e| classify("Failed to add document", e))
        })
    }

    /// Add several documents under one lock acquisition
    pub fn add_all(&self, documents: Vec<TantivyDocument>) -> Result<()> {
        self.with_writer(|writer| {
            documents.into_iter().try_for_each(|document| {
                writer
                    .add_document(document)
                    .map(|_| ())
                    .map_err(|e| classify("Failed to add document", e))
            })
        })
    }

    /// Delete every document matching `term`, then add `document`
    pub fn update(&self, term: Term, document: TantivyDocument) -> Result<()> {
        self.with_writer(|writer| {
            writer.delete_term(term);
            writer
                .add_document(document)
                .map(|_| ())
                .map_err(|e| classify("Failed to add document", e))
        })
    }

    /// Delete every document matching `term`
    pub fn delete(&self, term: Term) -> Result<()> {
        self.with_writer(|writer| {
            writer.delete_term(term);
            Ok(())
        })
    }

    /// Delete every document
    pub fn delete_all(&self) -> Result<()> {
        self.with_writer(|writer| {
            writer
                .delete_all_documents()
                .map(|_| ())
                .map_err(|e| classify("Failed to delete all documents", e))
        })
    }

    /// Persist pending work and refresh the reader
    pub fn commit(&self) -> Result<()> {
        let mut guard = self.writer.write();
        let writer = guard.as_mut().ok_or_else(|| self.closed_error())?;

        self.check_injected_exhaustion()?;

        writer
            .commit()
            .map_err(|e| classify(&format!("Failed to commit {}", self.identity), e))?;

        self.reader
            .reload()
            .map_err(|e| classify(&format!("Failed to reload reader for {}", self.identity), e))
    }

    /// Close the writer; later operations fail with `IndexUnavailable`
    ///
    /// With `wait_for_pending_work` pending work is committed and merge
    /// threads are joined. Without it uncommitted work is discarded.
    /// Closing a closed handle does nothing.
    pub fn close(&self, wait_for_pending_work: bool) -> Result<()> {
        let Some(mut writer) = self.writer.write().take() else {
            return Ok(());
        };

        if !wait_for_pending_work {
            drop(writer);
            tracing::warn!(index = %self.identity, "Writer handle dropped without commit");
            return Ok(());
        }

        writer
            .commit()
            .map_err(|e| classify(&format!("Failed to commit {} on close", self.identity), e))?;
        writer
            .wait_merging_threads()
            .map_err(|e| classify(&format!("Failed to join merges of {}", self.identity), e))?;

        // Reload errors after a successful close only affect readers of a
        // handle that is about to go away.
        if let Err(e) = self.reader.reload() {
            tracing::debug!(index = %self.identity, "Reader reload after close failed: {e}");
        }

        tracing::info!(index = %self.identity, "Writer handle closed");
        Ok(())
    }

    /// Searcher over the last committed state
    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    /// Searcher for a query request
    ///
    /// Fails with `ResourceExhausted` under the same conditions as a
    /// mutation on this handle.
    pub fn query_searcher(&self) -> Result<Searcher> {
        self.check_injected_exhaustion()?;
        Ok(self.searcher())
    }

    /// Document and segment counts of the last committed state
    pub fn stats(&self) -> IndexStats {
        let searcher = self.searcher();
        IndexStats {
            num_docs: searcher.num_docs(),
            num_segments: searcher.segment_readers().len(),
        }
    }

    /// Make the next writer or query operation fail as if the engine ran
    /// out of resources
    #[cfg(test)]
    pub(crate) fn inject_exhaustion(&self) {
        self.exhaust_next.store(true, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn check_injected_exhaustion(&self) -> Result<()> {
        if self.exhaust_next.swap(false, Ordering::SeqCst) {
            return Err(DocSearchError::ResourceExhausted(format!(
                "simulated exhaustion on {}",
                self.identity
            )));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[inline]
    fn check_injected_exhaustion(&self) -> Result<()> {
        Ok(())
    }
}
