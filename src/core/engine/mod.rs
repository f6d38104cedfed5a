//! Tantivy adapter.
//!
//! - **schema**: fixed native schema and token encoding
//! - **document**: caller document <-> native document conversion
//! - **query_string**: Lucene-style query grammar producing native queries
//! - **handle**: per-index writer handle

pub mod document;
pub mod handle;
pub mod query_string;
pub mod schema;

pub use handle::{WriterHandle, WriterSettings};
pub use schema::EngineFields;

use crate::core::error::DocSearchError;
use tantivy::TantivyError;

/// Map a native error onto the service taxonomy
///
/// Lock failures and corruption make the index unavailable. Out-of-memory
/// I/O, poisoned locks and dead indexing threads mean the writer can no
/// longer be trusted and must be evicted.
pub fn classify(context: &str, err: TantivyError) -> DocSearchError {
    match &err {
        TantivyError::LockFailure(..) | TantivyError::DataCorruption(_) => {
            DocSearchError::IndexUnavailable(format!("{context}: {err}"))
        }
        TantivyError::IoError(io) if io.kind() == std::io::ErrorKind::OutOfMemory => {
            DocSearchError::ResourceExhausted(format!("{context}: {err}"))
        }
        TantivyError::Poisoned | TantivyError::ErrorInThread(_) => {
            DocSearchError::ResourceExhausted(format!("{context}: {err}"))
        }
        TantivyError::OpenDirectoryError(_)
        | TantivyError::OpenReadError(_)
        | TantivyError::IncompatibleIndex(_) => {
            DocSearchError::IndexUnavailable(format!("{context}: {err}"))
        }
        _ => DocSearchError::Engine(format!("{context}: {err}")),
    }
}
