//! Lucene-style query string parser
//!
//! Supports syntax like:
//! - `hello:world`
//! - `title:rust AND -status:draft`
//! - `body:"exact phrase"~2`
//! - `price:[10 TO 20}` and `created:[2024-01-01T00:00:00Z TO *]`
//! - `title:prog*`, `tag:*`, `*:*`
//!
//! Values are matched against the tokens written by the document
//! converter, so a term matches both not-analyzed fields (verbatim) and
//! analyzed fields (lowercased words).

pub mod lexer;
pub mod parser;

pub use lexer::{Lexer, Token};
pub use parser::QueryStringParser;

use crate::core::engine::schema::EngineFields;
use crate::core::error::Result;
use tantivy::query::Query;

/// Parse `input` against `default_field` into a native query
pub fn parse(input: &str, default_field: &str, fields: &EngineFields) -> Result<Box<dyn Query>> {
    QueryStringParser::new(input, default_field, fields)?.parse()
}
