//! Core domain logic (transport-agnostic)
//!
//! # Architecture
//!
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **types**: Document model, identities, queries and hits
//! - **engine**: Tantivy schema, document conversion, query parsing, writer handles
//! - **storage**: Directory openers per storage kind
//! - **registry**: One cached writer handle per index identity
//! - **mutation**: Add, update, delete, clear and commit
//! - **search**: Query translation and execution
//! - **shutdown**: Closes every writer handle
//! - **services**: Unified service container

pub mod config;
pub mod engine;
pub mod error;
pub mod mutation;
pub mod registry;
pub mod search;
pub mod services;
pub mod shutdown;
pub mod storage;
pub mod types;

// Re-export key types for convenience
pub use config::Config;
pub use error::{DocSearchError, Result};
pub use services::Services;
