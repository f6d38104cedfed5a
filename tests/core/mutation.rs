// Integration tests for the mutation service

use crate::common::{
    article, create_hosted_services, create_test_services, index_documents, match_all,
    stored_ids,
};
use chrono::{TimeZone, Utc};
use docsearch::core::error::DocSearchError;
use docsearch::core::types::{Document, Field, IndexIdentity, NumericValue, StorageOption, Term};

#[test]
fn test_round_trip_preserves_field_values() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("round-trip");

    let document = Document::new()
        .with_field(Field::keyword("@id", "A"))
        .with_field(Field::string("title", "Hello World"))
        .with_field(Field::string("tag", "first"))
        .with_field(Field::string("tag", "second"))
        .with_field(Field::numeric("count", NumericValue::Int(42)))
        .with_field(Field::numeric("ratio", NumericValue::Double(0.25)))
        .with_field(Field::date(
            "published",
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        ));

    services.mutation.add_document(&identity, &document).unwrap();
    services.mutation.commit(&identity).unwrap();

    let hits = match_all(&services, &identity);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.as_ref(), Some(&document));
}

#[test]
fn test_unstored_fields_are_searchable_but_not_returned() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("unstored");

    let document = Document::new()
        .with_field(Field::keyword("@id", "A"))
        .with_field(Field::string("secret", "hidden words").with_storage(StorageOption::NotStored));
    index_documents(&services, &identity, &[document]);

    let hits = services
        .query
        .search(&identity, "body", "secret:hidden", 10)
        .unwrap();
    assert_eq!(hits.len(), 1);

    let returned = hits[0].document.as_ref().unwrap();
    assert!(returned.get("secret").is_none());
    assert_eq!(returned.get_text("@id").as_deref(), Some("A"));
}

#[test]
fn test_double_commit_is_idempotent() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("double-commit");
    index_documents(&services, &identity, &[article("A", "t", "hello")]);

    let before = stored_ids(&match_all(&services, &identity));
    services.mutation.commit(&identity).unwrap();
    services.mutation.commit(&identity).unwrap();
    let after = stored_ids(&match_all(&services, &identity));

    assert_eq!(before, after);
}

#[test]
fn test_uncommitted_work_is_invisible() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("uncommitted");
    index_documents(&services, &identity, &[article("A", "t", "hello")]);

    services
        .mutation
        .add_document(&identity, &article("B", "t", "hello"))
        .unwrap();
    assert_eq!(match_all(&services, &identity).len(), 1);

    services.mutation.commit(&identity).unwrap();
    assert_eq!(match_all(&services, &identity).len(), 2);
}

#[test]
fn test_delete_by_term() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("delete");
    index_documents(
        &services,
        &identity,
        &[article("D1", "t", "one"), article("D2", "t", "two")],
    );

    services
        .mutation
        .delete_documents(&identity, &Term::new("@id", "D1"))
        .unwrap();
    services.mutation.commit(&identity).unwrap();

    assert_eq!(stored_ids(&match_all(&services, &identity)), vec!["D2"]);
}

#[test]
fn test_delete_matching_nothing_succeeds() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("delete-none");
    index_documents(&services, &identity, &[article("A", "t", "one")]);

    services
        .mutation
        .delete_documents(&identity, &Term::new("@id", "missing"))
        .unwrap();
    services.mutation.commit(&identity).unwrap();

    assert_eq!(match_all(&services, &identity).len(), 1);
}

#[test]
fn test_update_is_upsert() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("upsert");

    services
        .mutation
        .update_document(&identity, &Term::new("@id", "X"), &article("X", "new", "fresh"))
        .unwrap();
    services.mutation.commit(&identity).unwrap();

    let hits = match_all(&services, &identity);
    assert_eq!(stored_ids(&hits), vec!["X"]);
}

#[test]
fn test_update_replaces_every_match() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("replace");
    index_documents(
        &services,
        &identity,
        &[
            article("A", "old", "first copy"),
            article("A", "old", "second copy"),
            article("B", "other", "untouched"),
        ],
    );

    services
        .mutation
        .update_document(&identity, &Term::new("@id", "A"), &article("A", "new", "replaced"))
        .unwrap();
    services.mutation.commit(&identity).unwrap();

    let hits = match_all(&services, &identity);
    assert_eq!(hits.len(), 2);

    let titles: Vec<String> = hits
        .iter()
        .filter_map(|h| h.document.as_ref()?.get_text("title"))
        .collect();
    assert!(titles.contains(&"new".to_string()));
    assert!(!titles.contains(&"old".to_string()));
}

#[test]
fn test_term_matches_numeric_fields_exactly() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("numeric-term");
    let doc = |n: i64| {
        Document::new()
            .with_field(Field::keyword("@id", format!("n{n}")))
            .with_field(Field::numeric("version", NumericValue::Long(n)))
    };
    index_documents(&services, &identity, &[doc(1), doc(2)]);

    services
        .mutation
        .delete_documents(&identity, &Term::new("version", "2"))
        .unwrap();
    services.mutation.commit(&identity).unwrap();

    assert_eq!(stored_ids(&match_all(&services, &identity)), vec!["n1"]);
}

#[test]
fn test_clear_index() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("Test");
    index_documents(
        &services,
        &identity,
        &[article("A", "t", "one"), article("B", "t", "two")],
    );

    services.mutation.clear_index(&identity).unwrap();
    services.mutation.commit(&identity).unwrap();

    assert!(match_all(&services, &identity).is_empty());
}

#[test]
fn test_invalid_documents_are_rejected() {
    let (services, _temp) = create_test_services();
    let identity = IndexIdentity::local("invalid");

    let empty = services.mutation.add_document(&identity, &Document::new());
    assert!(matches!(empty, Err(DocSearchError::InvalidDocument(_))));

    let nan = Document::new().with_field(Field::numeric("x", NumericValue::Double(f64::NAN)));
    let result = services.mutation.add_document(&identity, &nan);
    assert!(matches!(result, Err(DocSearchError::InvalidDocument(_))));

    assert!(services.registry.is_empty());
}

#[test]
fn test_unsupported_storage_kind() {
    let services = create_hosted_services();
    let result = services
        .mutation
        .add_document(&IndexIdentity::local("x"), &article("A", "t", "x"));

    assert!(matches!(
        result,
        Err(DocSearchError::UnsupportedStorageKind(_))
    ));
    assert!(!result.unwrap_err().is_transient());
}

#[test]
fn test_hosted_indexes_are_independent() {
    let services = create_hosted_services();
    let first = IndexIdentity::hosted("first");
    let second = IndexIdentity::hosted("second");

    index_documents(&services, &first, &[article("A", "t", "one")]);
    index_documents(
        &services,
        &second,
        &[article("B", "t", "two"), article("C", "t", "three")],
    );

    assert_eq!(match_all(&services, &first).len(), 1);
    assert_eq!(match_all(&services, &second).len(), 2);
}
