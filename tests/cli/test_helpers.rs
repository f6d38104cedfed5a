//! CLI test helpers
//!
//! Provides Arc<Services> wrappers matching CLI execute() signatures and
//! an index pre-filled through the add command.

use docsearch::cli::commands::mutate::{execute_add, AddArgs};
use docsearch::cli::commands::DocumentInput;
use docsearch::cli::OutputFormat;
use docsearch::core::services::Services;
use docsearch::core::types::StorageKind;
use std::sync::Arc;
use tempfile::TempDir;

pub const KIND: StorageKind = StorageKind::LocalFilesystem;

/// Create test services wrapped in Arc (matching CLI execute() signatures)
pub fn create_cli_test_services() -> (Arc<Services>, TempDir) {
    let (services, temp_dir) = crate::common::create_test_services();
    (Arc::new(services), temp_dir)
}

/// Inline JSON input
pub fn json_input(json: &str) -> DocumentInput {
    DocumentInput {
        file: None,
        json: Some(json.to_string()),
    }
}

/// Standard documents for search and query tests
pub fn library_json() -> &'static str {
    r#"[
        {"@id": "1", "@type": "book", "title": "Rust in Action", "body": "systems programming with rust", "year": 2021},
        {"@id": "2", "@type": "book", "title": "Programming Rust", "body": "fast safe systems development", "year": 2017},
        {"@id": "3", "@type": "talk", "title": "Async Rust", "body": "futures and executors", "year": 2023}
    ]"#
}

/// Add the standard documents to `index`
pub async fn setup_library(services: &Arc<Services>, index: &str) {
    let args = AddArgs {
        index: index.to_string(),
        input: json_input(library_json()),
    };
    execute_add(args, services, KIND, OutputFormat::Json)
        .await
        .expect("Failed to add library documents");
}
