// Test helper functions

use docsearch::core::config::Config;
use docsearch::core::services::Services;
use docsearch::core::storage::{HostedDirectoryOpener, StorageOpeners};
use docsearch::core::types::{Document, Field, Hit, IndexIdentity, StructuredQuery};
use tempfile::TempDir;

fn test_config(index_root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.storage.index_root = index_root.to_path_buf();
    config.writer.heap_size_mb = 20;
    config
}

/// Services over a temporary index root (keep the TempDir alive)
#[allow(dead_code)]
pub fn create_test_services() -> (Services, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let services = Services::new(test_config(temp_dir.path()));
    (services, temp_dir)
}

/// Services that only know the hosted (in-memory) storage kind
#[allow(dead_code)]
pub fn create_hosted_services() -> Services {
    let openers = StorageOpeners::new().with(HostedDirectoryOpener::new());
    Services::with_openers(test_config(std::path::Path::new(".")), openers)
}

/// Document with an identifier, a title and a body
#[allow(dead_code)]
pub fn article(id: &str, title: &str, body: &str) -> Document {
    Document::new()
        .with_field(Field::keyword("@id", id))
        .with_field(Field::string("title", title))
        .with_field(Field::string("body", body))
}

/// Add and commit documents
#[allow(dead_code)]
pub fn index_documents(services: &Services, identity: &IndexIdentity, documents: &[Document]) {
    services
        .mutation
        .add_documents(identity, documents)
        .expect("Failed to add documents");
    services
        .mutation
        .commit(identity)
        .expect("Failed to commit");
}

/// Every document of the index
#[allow(dead_code)]
pub fn match_all(services: &Services, identity: &IndexIdentity) -> Vec<Hit> {
    services
        .query
        .search_structured(
            identity,
            "body",
            &StructuredQuery {
                take: 100,
                ..Default::default()
            },
        )
        .expect("Match-all query failed")
}

/// `@id` values of the hits, in hit order
#[allow(dead_code)]
pub fn stored_ids(hits: &[Hit]) -> Vec<String> {
    hits.iter()
        .filter_map(|hit| hit.document.as_ref()?.get_text("@id"))
        .collect()
}
