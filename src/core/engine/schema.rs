//! Fixed Tantivy schema shared by every index.
//!
//! Caller documents carry arbitrary field names, so the native schema
//! does not mirror them. Instead every indexed value becomes a token
//! prefixed with its field name, and the token lands in one of a small
//! set of engine fields chosen by its index option.

use crate::core::error::{DocSearchError, Result};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, STORED,
};

/// Scored tokens of fields that keep norms
pub const TERMS_FIELD: &str = "_terms";

/// Scored tokens of fields indexed without norms
pub const TERMS_NO_NORMS_FIELD: &str = "_terms_nonorms";

/// Exact keys: every indexed token plus sortable numeric tokens
pub const KEYS_FIELD: &str = "_keys";

/// JSON of the stored caller fields
pub const SOURCE_FIELD: &str = "_source";

/// Document-level boost applied to relevance scores
pub const BOOST_FIELD: &str = "_boost";

/// Separates a field name from a text token
pub const TEXT_SEPARATOR: char = '\u{1f}';

/// Separates a field name from a sortable numeric token
pub const SORTABLE_SEPARATOR: char = '\u{1e}';

/// Tokens are pre-tokenized by the document converter; the raw
/// tokenizer is only registered so the fields are valid.
const PRE_TOKENIZED: &str = "raw";

/// Create the Tantivy schema for caller documents
///
/// Fields:
/// - _terms: scored tokens, positions and norms (pre-tokenized)
/// - _terms_nonorms: scored tokens, positions, no norms (pre-tokenized)
/// - _keys: exact keys for term deletes, ranges and wildcards
/// - _source: stored JSON of the caller's stored fields
/// - _boost: f64 fast field
pub fn create_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field(TERMS_FIELD, scored_options(true));
    builder.add_text_field(TERMS_NO_NORMS_FIELD, scored_options(false));

    let keys = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(PRE_TOKENIZED)
            .set_index_option(IndexRecordOption::Basic)
            .set_fieldnorms(false),
    );
    builder.add_text_field(KEYS_FIELD, keys);

    builder.add_text_field(SOURCE_FIELD, STORED);
    builder.add_f64_field(BOOST_FIELD, FAST);

    builder.build()
}

fn scored_options(fieldnorms: bool) -> TextOptions {
    TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(PRE_TOKENIZED)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions)
            .set_fieldnorms(fieldnorms),
    )
}

/// Resolved handles of the engine fields
#[derive(Debug, Clone, Copy)]
pub struct EngineFields {
    pub terms: Field,
    pub terms_no_norms: Field,
    pub keys: Field,
    pub source: Field,
    pub boost: Field,
}

impl EngineFields {
    /// Resolve field handles from a schema, failing on a foreign layout
    pub fn resolve(schema: &Schema) -> Result<Self> {
        let get = |name: &str| {
            schema.get_field(name).map_err(|e| {
                DocSearchError::IndexUnavailable(format!(
                    "index schema is missing field '{name}': {e}"
                ))
            })
        };

        Ok(Self {
            terms: get(TERMS_FIELD)?,
            terms_no_norms: get(TERMS_NO_NORMS_FIELD)?,
            keys: get(KEYS_FIELD)?,
            source: get(SOURCE_FIELD)?,
            boost: get(BOOST_FIELD)?,
        })
    }

    /// Both scored fields, norms first
    pub fn scored(&self) -> [Field; 2] {
        [self.terms, self.terms_no_norms]
    }
}

/// Token text for a field name and a text value
pub fn text_token(field_name: &str, value: &str) -> String {
    format!("{field_name}{TEXT_SEPARATOR}{value}")
}

/// Token text for a field name and an already encoded sortable value
pub fn sortable_token(field_name: &str, encoded: &str) -> String {
    format!("{field_name}{SORTABLE_SEPARATOR}{encoded}")
}

/// Encode a number so that lexicographic order matches numeric order
pub fn encode_sortable(value: f64) -> String {
    let bits = value.to_bits();
    let sortable = if value.is_sign_negative() {
        !bits
    } else {
        bits ^ (1 << 63)
    };
    format!("{sortable:016x}")
}
