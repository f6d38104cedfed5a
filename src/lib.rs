//! docsearch - embeddable indexed-document search
//!
//! Named full-text indexes over Tantivy, each backed by a local
//! directory or an in-process hosted directory. Callers add, update and
//! delete documents through a mutation service and run Lucene-style
//! query strings through a query service. Writer handles are opened
//! lazily, shared per index, evicted on resource exhaustion and closed
//! together at shutdown.
//!
//! # Architecture
//!
//! - **core**: Domain logic
//!   - config, error, types
//!   - engine (schema, document conversion, query strings, writer handles)
//!   - storage, registry
//!   - mutation, search, shutdown
//!   - services (unified service container)
//!
//! - **cli**: Command-line adapter (depends on core)

// Core domain logic
pub mod core;

// Command-line adapter
pub mod cli;

// Re-export commonly used types for convenience
pub use core::config::Config;
pub use core::error::{DocSearchError, Result};
pub use core::services::Services;
pub use core::types::*;
