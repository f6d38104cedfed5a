// Integration tests for the writer registry and shutdown

use crate::common::{article, create_test_services, index_documents, match_all};
use docsearch::core::error::DocSearchError;
use docsearch::core::types::{IndexIdentity, StorageKind};
use std::sync::Arc;

#[test]
fn test_concurrent_first_access_creates_one_handle() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("concurrent");

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&services.registry);
            let identity = identity.clone();
            std::thread::spawn(move || {
                registry
                    .get_or_create_writer(&identity, true)
                    .expect("Failed to open writer")
            })
        })
        .collect();

    let handles: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
    for handle in &handles[1..] {
        assert!(Arc::ptr_eq(&handles[0], handle));
    }
    assert_eq!(services.registry.len(), 1);
}

#[test]
fn test_identity_is_case_insensitive() {
    let (services, _temp) = create_test_services();
    let lower = IndexIdentity::new(StorageKind::LocalFilesystem, "Test");
    let upper = IndexIdentity::new(StorageKind::LocalFilesystem, "TEST");

    index_documents(&services, &lower, &[article("A", "t", "hello")]);
    assert_eq!(match_all(&services, &upper).len(), 1);
    assert_eq!(services.registry.len(), 1);
}

#[test]
fn test_identity_case_survives_eviction() {
    let (services, temp) = create_test_services();
    let mixed = IndexIdentity::local("Docs");
    let lower = IndexIdentity::local("docs");

    index_documents(&services, &mixed, &[article("A", "t", "hello")]);
    assert!(services.registry.evict(&mixed, true).unwrap());

    assert_eq!(match_all(&services, &lower).len(), 1);
    assert!(temp.path().join("docs").is_dir());

    // A fresh container over the same root resolves the same directory
    services.shutdown().unwrap();
    let reopened = docsearch::core::services::Services::new((*services.config).clone());
    assert_eq!(match_all(&reopened, &IndexIdentity::local("DOCS")).len(), 1);
}

#[test]
fn test_search_on_missing_index_is_not_found() {
    let (services, _temp) = create_test_services();
    let result = services
        .query
        .search(&IndexIdentity::local("never-created"), "body", "x", 10);

    assert!(matches!(result, Err(DocSearchError::IndexNotFound(_))));
    assert!(services.registry.is_empty());
}

#[test]
fn test_committed_data_survives_eviction() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("persist");

    index_documents(&services, &identity, &[article("A", "t", "hello")]);
    assert!(services.registry.evict(&identity, true).unwrap());

    assert_eq!(match_all(&services, &identity).len(), 1);
}

#[test]
fn test_shutdown_waits_for_committed_state() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("shutdown");
    index_documents(&services, &identity, &[article("A", "t", "hello")]);

    let report = services.shutdown().unwrap();
    assert_eq!(report.handles_closed, 1);
    assert!(services.registry.is_empty());

    // A second container over the same root sees the data
    let reopened = docsearch::core::services::Services::new((*services.config).clone());
    assert_eq!(match_all(&reopened, &identity).len(), 1);
}

#[test]
fn test_mutations_fail_after_shutdown() {
    let (services, _temp) = create_test_services();
    services.shutdown().unwrap();

    let result = services
        .mutation
        .add_document(&IndexIdentity::local("late"), &article("A", "t", "x"));
    assert!(matches!(result, Err(DocSearchError::IndexUnavailable(_))));
}
