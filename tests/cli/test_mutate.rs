//! Tests for the add, update, delete and clear commands

use crate::cli::test_helpers::{create_cli_test_services, json_input, setup_library, KIND};
use crate::common::{match_all, stored_ids};
use docsearch::cli::commands::mutate::{
    execute_add, execute_clear, execute_delete, execute_update, AddArgs, ClearArgs, DeleteArgs,
    UpdateArgs,
};
use docsearch::cli::commands::DocumentInput;
use docsearch::cli::OutputFormat;
use docsearch::core::types::{IndexIdentity, Term};

#[tokio::test]
async fn test_add_commits_documents() {
    let (services, _temp) = create_cli_test_services();
    setup_library(&services, "library").await;

    let hits = match_all(&services, &IndexIdentity::local("library"));
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn test_add_from_file() {
    let (services, temp) = create_cli_test_services();
    let path = temp.path().join("docs.json");
    std::fs::write(&path, r#"{"@id": "f1", "body": "from a file"}"#).unwrap();

    let args = AddArgs {
        index: "files".to_string(),
        input: DocumentInput {
            file: Some(path),
            json: None,
        },
    };
    execute_add(args, &services, KIND, OutputFormat::Human)
        .await
        .unwrap();

    let hits = match_all(&services, &IndexIdentity::local("files"));
    assert_eq!(stored_ids(&hits), vec!["f1"]);
}

#[tokio::test]
async fn test_add_rejects_nested_values() {
    let (services, _temp) = create_cli_test_services();
    let args = AddArgs {
        index: "bad".to_string(),
        input: json_input(r#"{"@id": "x", "meta": {"nested": true}}"#),
    };

    let result = execute_add(args, &services, KIND, OutputFormat::Human).await;
    assert!(result.is_err());
    assert!(services.registry.is_empty());
}

#[tokio::test]
async fn test_update_replaces_document() {
    let (services, _temp) = create_cli_test_services();
    setup_library(&services, "library").await;

    let args = UpdateArgs {
        index: "library".to_string(),
        term: Term::new("@id", "2"),
        input: json_input(r#"{"@id": "2", "title": "Programming Rust, 2nd Edition"}"#),
    };
    execute_update(args, &services, KIND, OutputFormat::Human)
        .await
        .unwrap();

    let hits = match_all(&services, &IndexIdentity::local("library"));
    assert_eq!(hits.len(), 3);
    let updated = hits
        .iter()
        .filter_map(|h| h.document.as_ref())
        .find(|d| d.get_text("@id").as_deref() == Some("2"))
        .unwrap();
    assert_eq!(
        updated.get_text("title").as_deref(),
        Some("Programming Rust, 2nd Edition")
    );
}

#[tokio::test]
async fn test_update_requires_single_document() {
    let (services, _temp) = create_cli_test_services();
    let args = UpdateArgs {
        index: "library".to_string(),
        term: Term::new("@id", "1"),
        input: json_input(r#"[{"@id": "1"}, {"@id": "2"}]"#),
    };

    let result = execute_update(args, &services, KIND, OutputFormat::Human).await;
    assert!(result.unwrap_err().to_string().contains("exactly one"));
}

#[tokio::test]
async fn test_delete_and_clear() {
    let (services, _temp) = create_cli_test_services();
    setup_library(&services, "library").await;
    let identity = IndexIdentity::local("library");

    let args = DeleteArgs {
        index: "library".to_string(),
        term: "@id=3".parse().unwrap(),
    };
    execute_delete(args, &services, KIND, OutputFormat::Json)
        .await
        .unwrap();
    assert_eq!(match_all(&services, &identity).len(), 2);

    let args = ClearArgs {
        index: "library".to_string(),
    };
    execute_clear(args, &services, KIND, OutputFormat::Human)
        .await
        .unwrap();
    assert!(match_all(&services, &identity).is_empty());
}
