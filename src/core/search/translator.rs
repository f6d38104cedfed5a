//! Structured query translation.
//!
//! Turns a [`StructuredQuery`] into native query, filter, sort order and
//! result window. Everything here is pure: no index access, no state.

use crate::core::engine::query_string;
use crate::core::engine::EngineFields;
use crate::core::error::{DocSearchError, Result};
use crate::core::types::{SortSpec, StructuredQuery};
use tantivy::query::{AllQuery, Query};

/// Sort field that orders by engine-internal document ordinal
pub const DOC_ORDER_FIELD: &str = "id";

/// Value type a sort key is compared as
///
/// Codes follow the classic Lucene `SortField` type numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortType {
    Score,
    Doc,
    String,
    Int,
    Float,
    Long,
    Double,
    Short,
    Byte,
    StringValue,
}

impl SortType {
    /// Map a type hint; unknown or absent hints compare as strings
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => SortType::Score,
            Some(1) => SortType::Doc,
            Some(4) => SortType::Int,
            Some(5) => SortType::Float,
            Some(6) => SortType::Long,
            Some(7) => SortType::Double,
            Some(8) => SortType::Short,
            Some(10) => SortType::Byte,
            Some(11) => SortType::StringValue,
            _ => SortType::String,
        }
    }

    /// Whether sorting needs the stored field value
    pub fn reads_field(self) -> bool {
        !matches!(self, SortType::Score | SortType::Doc)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            SortType::Int
                | SortType::Float
                | SortType::Long
                | SortType::Double
                | SortType::Short
                | SortType::Byte
        )
    }
}

/// One translated sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub kind: SortType,
    /// Reverse the natural order of `kind`
    pub reverse: bool,
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    /// Descending score, ties in document order
    Relevance,
    Fields(Vec<SortKey>),
}

/// Skip/take window over the sorted matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultWindow {
    pub skip: usize,
    pub take: usize,
}

impl ResultWindow {
    /// Clamp `skip` and `take` to `>= 0` and `take` to `max_results`
    pub fn new(skip: i64, take: i64, max_results: usize) -> Self {
        let clamp = |v: i64| usize::try_from(v.max(0)).unwrap_or(usize::MAX);
        Self {
            skip: clamp(skip),
            take: clamp(take).min(max_results),
        }
    }

    /// Number of top matches needed to fill the window
    pub fn end(&self) -> usize {
        self.skip.saturating_add(self.take)
    }

    pub fn is_empty(&self) -> bool {
        self.take == 0
    }
}

/// Native form of a structured query
pub struct TranslatedQuery {
    pub query: Box<dyn Query>,
    /// Applied as a required, non-scoring clause
    pub filter: Option<Box<dyn Query>>,
    pub sort: SortOrder,
    pub window: ResultWindow,
}

impl std::fmt::Debug for TranslatedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatedQuery")
            .field("query", &self.query)
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("window", &self.window)
            .finish()
    }
}

/// Translate a structured query
pub fn translate(
    query: &StructuredQuery,
    default_field: &str,
    fields: &EngineFields,
    max_results: usize,
) -> Result<TranslatedQuery> {
    let native = parse_text(query.free_text.as_deref(), default_field, fields)?;

    let filter = match query.filter.as_deref() {
        Some(filter) if !filter.trim().is_empty() => {
            Some(query_string::parse(filter, default_field, fields)?)
        }
        _ => None,
    };

    Ok(TranslatedQuery {
        query: native,
        filter,
        sort: translate_sort(&query.sort)?,
        window: ResultWindow::new(query.skip, query.take, max_results),
    })
}

/// Parse query text; missing or blank text matches every document
pub fn parse_text(
    text: Option<&str>,
    default_field: &str,
    fields: &EngineFields,
) -> Result<Box<dyn Query>> {
    match text {
        Some(text) if !text.trim().is_empty() => query_string::parse(text, default_field, fields),
        _ => Ok(Box::new(AllQuery)),
    }
}

/// Translate sort specs; an empty list sorts by relevance
pub fn translate_sort(specs: &[SortSpec]) -> Result<SortOrder> {
    if specs.is_empty() {
        return Ok(SortOrder::Relevance);
    }

    specs
        .iter()
        .map(|spec| {
            if spec.field_name.trim().is_empty() {
                return Err(DocSearchError::MalformedQuery(
                    "sort field name is empty".to_string(),
                ));
            }

            let kind = if spec.field_name.eq_ignore_ascii_case(DOC_ORDER_FIELD) {
                SortType::Doc
            } else {
                SortType::from_code(spec.type_hint)
            };

            Ok(SortKey {
                field: spec.field_name.clone(),
                kind,
                reverse: parse_direction(spec.direction.as_deref())?,
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(SortOrder::Fields)
}

/// `asc` or absent is ascending, `desc` descending; anything else fails
pub fn parse_direction(direction: Option<&str>) -> Result<bool> {
    match direction.map(str::trim) {
        None => Ok(false),
        Some(d) if d.eq_ignore_ascii_case("asc") => Ok(false),
        Some(d) if d.eq_ignore_ascii_case("desc") => Ok(true),
        Some(other) => Err(DocSearchError::MalformedQuery(format!(
            "sort direction must be 'asc' or 'desc', got '{other}'"
        ))),
    }
}

/// Escape every query syntax character so `text` is matched literally.
///
/// Characters escaped: `: { } [ ] ( ) " \ + - ! ^ ~ * ? & |`
pub fn escape_query(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        match ch {
            ':' | '{' | '}' | '[' | ']' | '(' | ')' | '"' | '\\' | '+' | '-' | '!' | '^'
            | '~' | '*' | '?' | '&' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            _ => result.push(ch),
        }
    }
    result
}
