// Integration tests for the query service

use crate::common::{article, create_test_services, index_documents, stored_ids};
use chrono::{TimeZone, Utc};
use docsearch::core::error::DocSearchError;
use docsearch::core::services::Services;
use docsearch::core::types::{
    Document, Field, IndexIdentity, IndexOption, NumericValue, SortSpec, StructuredQuery,
};

fn search(services: &Services, identity: &IndexIdentity, query: &str) -> Vec<String> {
    let hits = services
        .query
        .search(identity, "body", query, 100)
        .unwrap_or_else(|e| panic!("query '{query}' failed: {e}"));
    let mut ids = stored_ids(&hits);
    ids.sort();
    ids
}

fn product(id: &str, kind: &str, price: f64, published_day: u32) -> Document {
    Document::new()
        .with_field(Field::keyword("@id", id))
        .with_field(Field::keyword("@type", kind))
        .with_field(Field::string("body", format!("product {id} description")))
        .with_field(Field::numeric("price", NumericValue::Double(price)))
        .with_field(Field::date(
            "published",
            Utc.with_ymd_and_hms(2024, 1, published_day, 0, 0, 0).unwrap(),
        ))
}

fn catalog(services: &Services) -> IndexIdentity {
    let identity = IndexIdentity::local("catalog");
    index_documents(
        services,
        &identity,
        &[
            product("P1", "book", 12.5, 3),
            product("P2", "game", 59.0, 1),
            product("P3", "book", 7.0, 2),
            product("P4", "music", -1.0, 4),
        ],
    );
    identity
}

#[test]
fn test_two_documents_ordered_by_descending_score() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("Test");
    let doc = |id: &str| {
        Document::new()
            .with_field(Field::keyword("@id", id))
            .with_field(Field::string("hello", "world"))
    };
    index_documents(&services, &identity, &[doc("A"), doc("B")]);

    let hits = services
        .query
        .search(&identity, "body", "hello:world", 10)
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert!(hits[0].score >= hits[1].score);
    assert!(hits[1].score > 0.0);
}

#[test]
fn test_better_match_scores_higher() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("relevance");
    index_documents(
        &services,
        &identity,
        &[
            article("weak", "t", "rust is a language with many other words in it"),
            article("strong", "t", "rust rust rust"),
        ],
    );

    let hits = services.query.search(&identity, "body", "rust", 10).unwrap();
    assert_eq!(stored_ids(&hits), vec!["strong", "weak"]);
}

#[test]
fn test_field_boost_raises_score() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("boost");
    index_documents(
        &services,
        &identity,
        &[
            Document::new()
                .with_field(Field::keyword("@id", "plain"))
                .with_field(Field::string("body", "shared words")),
            Document::new()
                .with_field(Field::keyword("@id", "boosted"))
                .with_field(Field::string("body", "shared words").with_boost(4.0)),
        ],
    );

    let hits = services.query.search(&identity, "body", "shared", 10).unwrap();
    assert_eq!(stored_ids(&hits), vec!["boosted", "plain"]);
    assert!(hits[0].score > hits[1].score * 3.0);
}

#[test]
fn test_query_string_syntax() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("syntax");
    index_documents(
        &services,
        &identity,
        &[
            article("A", "Rust Guide", "ownership and borrowing explained"),
            article("B", "Go Guide", "goroutines and channels explained"),
            article("C", "Rust Cookbook", "error handling recipes"),
        ],
    );

    assert_eq!(search(&services, &identity, "explained"), vec!["A", "B"]);
    assert_eq!(search(&services, &identity, "title:rust"), vec!["A", "C"]);
    assert_eq!(
        search(&services, &identity, "title:rust AND explained"),
        vec!["A"]
    );
    assert_eq!(
        search(&services, &identity, "title:rust -recipes"),
        vec!["A"]
    );
    assert_eq!(
        search(&services, &identity, "\"error handling\""),
        vec!["C"]
    );
    assert!(search(&services, &identity, "\"handling error\"").is_empty());
    assert_eq!(search(&services, &identity, "borrow*"), vec!["A"]);
    assert_eq!(search(&services, &identity, "@id:B"), vec!["B"]);
    assert_eq!(search(&services, &identity, "NOT title:rust"), vec!["B"]);
    assert_eq!(
        search(&services, &identity, "(goroutines OR recipes) AND title:guide"),
        vec!["B"]
    );
}

#[test]
fn test_ranges_and_exists() {
    let (services, _temp) = create_test_services();
    let identity = catalog(&services);

    assert_eq!(
        search(&services, &identity, "price:[7 TO 12.5]"),
        vec!["P1", "P3"]
    );
    assert_eq!(search(&services, &identity, "price:{7 TO 12.5]"), vec!["P1"]);
    assert_eq!(search(&services, &identity, "price:[* TO 0]"), vec!["P4"]);
    assert_eq!(
        search(
            &services,
            &identity,
            "published:[2024-01-02T00:00:00Z TO 2024-01-03T00:00:00Z]"
        ),
        vec!["P1", "P3"]
    );
    assert_eq!(search(&services, &identity, "price:*").len(), 4);
    assert!(search(&services, &identity, "missing:*").is_empty());
}

#[test]
fn test_malformed_queries() {
    let (services, _temp) = create_test_services();
    let identity = catalog(&services);

    for query in ["(unclosed", "price:[1 TO", "rust~", "title:"] {
        let result = services.query.search(&identity, "body", query, 10);
        assert!(
            matches!(result, Err(DocSearchError::MalformedQuery(_))),
            "expected '{query}' to be rejected, got {result:?}"
        );
    }

    let long = "a ".repeat(400);
    let result = services.query.search(&identity, "body", &long, 10);
    assert!(matches!(result, Err(DocSearchError::MalformedQuery(_))));
}

#[test]
fn test_max_results_is_clamped() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("clamp");
    let documents: Vec<Document> = (0..120)
        .map(|i| article(&format!("d{i}"), "t", "common"))
        .collect();
    index_documents(&services, &identity, &documents);

    let hits = services.query.search(&identity, "body", "common", 500).unwrap();
    assert_eq!(hits.len(), 100);

    let none = services.query.search(&identity, "body", "common", 0).unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_skip_and_take_return_second_in_sort_order() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("paging");
    index_documents(
        &services,
        &identity,
        &[
            article("c", "t", "x"),
            article("a", "t", "x"),
            article("b", "t", "x"),
        ],
    );

    let hits = services
        .query
        .search_structured(
            &identity,
            "body",
            &StructuredQuery {
                sort: vec![SortSpec::new("@id")],
                skip: 1,
                take: 1,
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(stored_ids(&hits), vec!["b"]);
}

#[test]
fn test_structured_filter_and_numeric_sort() {
    let (services, _temp) = create_test_services();
    let identity = catalog(&services);

    let query = StructuredQuery {
        free_text: None,
        filter: Some("@type:book OR @type:music".to_string()),
        sort: vec![SortSpec::new("price").descending().with_type_hint(7)],
        skip: 0,
        take: 10,
    };
    let hits = services
        .query
        .search_structured(&identity, "body", &query)
        .unwrap();
    assert_eq!(stored_ids(&hits), vec!["P1", "P3", "P4"]);

    let ascending = StructuredQuery {
        sort: vec![SortSpec::new("published").with_type_hint(6)],
        ..query
    };
    let hits = services
        .query
        .search_structured(&identity, "body", &ascending)
        .unwrap();
    assert_eq!(stored_ids(&hits), vec!["P3", "P1", "P4"]);
}

#[test]
fn test_filter_does_not_change_scores() {
    let (services, _temp) = create_test_services();
    let identity = catalog(&services);

    let unfiltered = StructuredQuery {
        free_text: Some("product".to_string()),
        take: 10,
        ..Default::default()
    };
    let filtered = StructuredQuery {
        filter: Some("@type:game".to_string()),
        ..unfiltered.clone()
    };

    let all = services
        .query
        .search_structured(&identity, "body", &unfiltered)
        .unwrap();
    let games = services
        .query
        .search_structured(&identity, "body", &filtered)
        .unwrap();

    assert_eq!(stored_ids(&games), vec!["P2"]);
    let original = all
        .iter()
        .find(|h| h.document_id == games[0].document_id)
        .unwrap();
    assert!((original.score - games[0].score).abs() < 1e-6);
}

#[test]
fn test_sort_by_id_uses_document_order() {
    let (services, _temp) = create_test_services();
    let identity = catalog(&services);

    let query = StructuredQuery {
        sort: vec![SortSpec::new("id").descending()],
        take: 10,
        ..Default::default()
    };
    let hits = services
        .query
        .search_structured(&identity, "body", &query)
        .unwrap();

    assert_eq!(stored_ids(&hits), vec!["P4", "P3", "P2", "P1"]);
}

#[test]
fn test_invalid_sort_direction_is_rejected() {
    let (services, _temp) = create_test_services();
    let identity = catalog(&services);

    let query = StructuredQuery {
        sort: vec!["price sideways".parse().unwrap()],
        take: 10,
        ..Default::default()
    };
    let result = services.query.search_structured(&identity, "body", &query);
    assert!(matches!(result, Err(DocSearchError::MalformedQuery(_))));
}

#[test]
fn test_take_zero_and_negative_window() {
    let (services, _temp) = create_test_services();
    let identity = catalog(&services);

    let query = StructuredQuery {
        skip: -5,
        take: 0,
        ..Default::default()
    };
    assert!(services
        .query
        .search_structured(&identity, "body", &query)
        .unwrap()
        .is_empty());

    let skip_past_end = StructuredQuery {
        skip: 10,
        take: 10,
        ..Default::default()
    };
    assert!(services
        .query
        .search_structured(&identity, "body", &skip_past_end)
        .unwrap()
        .is_empty());
}

#[test]
fn test_not_analyzed_field_matches_whole_value() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("keywords");
    index_documents(
        &services,
        &identity,
        &[Document::new()
            .with_field(Field::keyword("@id", "A"))
            .with_field(Field::string("code", "AB-12").with_index(IndexOption::NotAnalyzed))],
    );

    assert_eq!(search(&services, &identity, "code:\"AB-12\""), vec!["A"]);
    assert!(search(&services, &identity, "code:ab").is_empty());
}

#[test]
fn test_stats() {
    let (services, _temp) = create_test_services();
    let identity = catalog(&services);

    let stats = services.query.stats(&identity).unwrap();
    assert_eq!(stats.num_docs, 4);
    assert!(stats.num_segments >= 1);
}
