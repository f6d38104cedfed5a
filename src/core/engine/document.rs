//! Conversion between caller documents and native Tantivy documents.

use crate::core::engine::schema::{
    encode_sortable, sortable_token, text_token, EngineFields, SORTABLE_SEPARATOR,
    TEXT_SEPARATOR,
};
use crate::core::error::{DocSearchError, Result};
use crate::core::types::{Document, Field, FieldValue, IndexOption, Term};
use tantivy::schema::Value;
use tantivy::tokenizer::{
    LowerCaser, PreTokenizedString, RemoveLongFilter, SimpleTokenizer, TextAnalyzer, Token,
    TokenStream,
};
use tantivy::{TantivyDocument, Term as NativeTerm};

/// Tokens longer than this are dropped by the analyzer
const MAX_TOKEN_LENGTH: usize = 40;

fn analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
        .filter(LowerCaser)
        .build()
}

/// Split text into lowercased alphanumeric tokens
pub fn analyze(text: &str) -> Vec<String> {
    analyze_tokens(text).into_iter().map(|t| t.text).collect()
}

fn analyze_tokens(text: &str) -> Vec<Token> {
    let mut analyzer = analyzer();
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        tokens.push(stream.token().clone());
    }
    tokens
}

/// Check a document before it reaches the engine
pub fn validate_document(document: &Document) -> Result<()> {
    if document.is_empty() {
        return Err(DocSearchError::InvalidDocument(
            "document has no fields".to_string(),
        ));
    }
    document.fields().iter().try_for_each(validate_field)
}

fn validate_field(field: &Field) -> Result<()> {
    let invalid = |reason: String| Err(DocSearchError::InvalidDocument(reason));

    if field.name.trim().is_empty() {
        return invalid("field name is empty".to_string());
    }
    if field.name.contains([TEXT_SEPARATOR, SORTABLE_SEPARATOR]) {
        return invalid(format!(
            "field name '{}' contains a control character",
            field.name.escape_debug()
        ));
    }
    if !field.index.is_indexed() && !field.is_stored() {
        return invalid(format!(
            "field '{}' is neither indexed nor stored",
            field.name
        ));
    }
    if !field.boost.is_finite() || field.boost < 0.0 {
        return invalid(format!(
            "field '{}' has invalid boost {}",
            field.name, field.boost
        ));
    }
    if let FieldValue::Numeric {
        value,
        precision_step,
    } = &field.value
    {
        if value.is_nan() {
            return invalid(format!("field '{}' is NaN", field.name));
        }
        if *precision_step == 0 {
            return invalid(format!(
                "field '{}' has a zero precision step",
                field.name
            ));
        }
    }
    Ok(())
}

/// Build the native document for a caller document
///
/// Validates first; nothing is produced for an invalid document.
pub fn to_native_document(document: &Document, fields: &EngineFields) -> Result<TantivyDocument> {
    validate_document(document)?;

    let mut native = TantivyDocument::default();
    let mut boost = 1.0f64;

    for field in document.fields() {
        if !field.index.is_indexed() {
            continue;
        }
        boost *= f64::from(field.boost);

        let (text, scored) = scored_tokens(field);
        let target = if field.index.omits_norms() {
            fields.terms_no_norms
        } else {
            fields.terms
        };

        let mut keys = scored.clone();
        if let Some(encoded) = sortable_value(&field.value) {
            keys.push(single_token(
                sortable_token(&field.name, &encoded),
                keys.len(),
                text.len(),
            ));
        }

        native.add_pre_tokenized_text(
            target,
            PreTokenizedString {
                text: text.clone(),
                tokens: scored,
            },
        );
        native.add_pre_tokenized_text(fields.keys, PreTokenizedString { text, tokens: keys });
    }

    let stored: Vec<&Field> = document.fields().iter().filter(|f| f.is_stored()).collect();
    native.add_text(fields.source, serde_json::to_string(&stored)?);
    native.add_f64(fields.boost, boost);

    Ok(native)
}

/// Text of the value plus its prefixed scored tokens
fn scored_tokens(field: &Field) -> (String, Vec<Token>) {
    let text = field.value.to_text();
    let analyzed = field.index.is_analyzed() && matches!(field.value, FieldValue::String { .. });

    let tokens = if analyzed {
        analyze_tokens(&text)
            .into_iter()
            .map(|mut token| {
                token.text = text_token(&field.name, &token.text);
                token
            })
            .collect()
    } else {
        vec![single_token(text_token(&field.name, &text), 0, text.len())]
    };

    (text, tokens)
}

fn single_token(text: String, position: usize, len: usize) -> Token {
    Token {
        offset_from: 0,
        offset_to: len,
        position,
        text,
        position_length: 1,
    }
}

/// Order-preserving encoding of numeric and date values
pub fn sortable_value(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Numeric { value, .. } => Some(encode_sortable(value.as_f64())),
        FieldValue::Date { value } => Some(encode_sortable(value.timestamp_millis() as f64)),
        FieldValue::String { .. } => None,
    }
}

/// Native key term for an exact-match term
pub fn to_native_term(term: &Term, fields: &EngineFields) -> NativeTerm {
    NativeTerm::from_field_text(fields.keys, &text_token(&term.field_name, &term.value))
}

/// Rebuild the stored fields of a native document
///
/// Returns `None` when the document stored no fields.
pub fn from_native_document(
    native: &TantivyDocument,
    fields: &EngineFields,
) -> Result<Option<Document>> {
    let Some(source) = native.get_first(fields.source).and_then(|v| v.as_str()) else {
        return Ok(None);
    };

    let stored: Vec<Field> = serde_json::from_str(source).map_err(|e| {
        DocSearchError::IndexUnavailable(format!("stored document source is corrupt: {e}"))
    })?;

    if stored.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Document { fields: stored }))
    }
}
