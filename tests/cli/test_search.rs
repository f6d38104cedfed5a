//! Tests for the search command

use crate::cli::test_helpers::{create_cli_test_services, setup_library, KIND};
use docsearch::cli::commands::search::{execute, SearchArgs};
use docsearch::cli::OutputFormat;

fn args(query: &str) -> SearchArgs {
    SearchArgs {
        index: "library".to_string(),
        query: query.to_string(),
        field: "body".to_string(),
        limit: None,
        literal: false,
    }
}

#[tokio::test]
async fn test_search_human_and_json() {
    let (services, _temp) = create_cli_test_services();
    setup_library(&services, "library").await;

    let result = execute(args("systems"), &services, KIND, OutputFormat::Human).await;
    assert!(result.is_ok(), "Search should succeed: {:?}", result.err());

    let result = execute(args("title:rust"), &services, KIND, OutputFormat::Json).await;
    assert!(result.is_ok(), "JSON search should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_search_empty_results() {
    let (services, _temp) = create_cli_test_services();
    setup_library(&services, "library").await;

    let result = execute(args("nonexistent"), &services, KIND, OutputFormat::Human).await;
    assert!(result.is_ok(), "Search with no results should succeed");
}

#[tokio::test]
async fn test_search_index_not_found() {
    let (services, _temp) = create_cli_test_services();

    let result = execute(args("anything"), &services, KIND, OutputFormat::Human).await;
    let err_msg = result.unwrap_err().to_string();
    assert!(
        err_msg.contains("not found"),
        "Error should mention 'not found': {err_msg}"
    );
}

#[tokio::test]
async fn test_search_malformed_query() {
    let (services, _temp) = create_cli_test_services();
    setup_library(&services, "library").await;

    let result = execute(args("title:(rust"), &services, KIND, OutputFormat::Human).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_search_literal_escapes_syntax() {
    let (services, _temp) = create_cli_test_services();
    setup_library(&services, "library").await;

    let mut literal = args("title:(rust");
    literal.literal = true;
    let result = execute(literal, &services, KIND, OutputFormat::Human).await;
    assert!(result.is_ok(), "Literal search should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_search_limit() {
    let (services, _temp) = create_cli_test_services();
    setup_library(&services, "library").await;

    let mut limited = args("rust");
    limited.limit = Some(500);
    assert!(execute(limited, &services, KIND, OutputFormat::Json)
        .await
        .is_ok());

    let mut zero = args("rust");
    zero.limit = Some(0);
    assert!(execute(zero, &services, KIND, OutputFormat::Human)
        .await
        .is_ok());
}
