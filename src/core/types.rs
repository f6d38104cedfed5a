//! Core data types for the docsearch service.
//!
//! This module defines the caller-facing document model (documents,
//! typed fields, terms), index identities, query requests and results.
//! All of these are per-request values; the only long-lived object is
//! the writer handle owned by the registry.

use crate::core::error::{DocSearchError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Default precision step for numeric fields
pub const DEFAULT_PRECISION_STEP: u32 = 4;

/// Storage backend an index lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    /// Directory on the local filesystem
    LocalFilesystem,
    /// Directory hosted by the service process
    HostedDirectory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::LocalFilesystem => write!(f, "LocalFilesystem"),
            StorageKind::HostedDirectory => write!(f, "HostedDirectory"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = DocSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "localfilesystem" | "filesystem" => Ok(StorageKind::LocalFilesystem),
            "hosted" | "hosteddirectory" => Ok(StorageKind::HostedDirectory),
            other => Err(DocSearchError::UnsupportedStorageKind(other.to_string())),
        }
    }
}

/// Identifies one logical index.
///
/// Two identities are equal when their kinds match and their locations
/// match case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexIdentity {
    pub kind: StorageKind,
    pub location: String,
}

impl IndexIdentity {
    pub fn new(kind: StorageKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
        }
    }

    pub fn local(location: impl Into<String>) -> Self {
        Self::new(StorageKind::LocalFilesystem, location)
    }

    pub fn hosted(location: impl Into<String>) -> Self {
        Self::new(StorageKind::HostedDirectory, location)
    }

    /// Location folded for comparison
    pub fn normalized_location(&self) -> String {
        self.location.to_lowercase()
    }
}

impl PartialEq for IndexIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.normalized_location() == other.normalized_location()
    }
}

impl Eq for IndexIdentity {}

impl Hash for IndexIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.normalized_location().hash(state);
    }
}

impl fmt::Display for IndexIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.location)
    }
}

/// How a field's value is indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOption {
    NotIndexed,
    Analyzed,
    AnalyzedNoNorms,
    NotAnalyzed,
    NotAnalyzedNoNorms,
}

impl IndexOption {
    pub fn is_indexed(self) -> bool {
        !matches!(self, IndexOption::NotIndexed)
    }

    pub fn is_analyzed(self) -> bool {
        matches!(self, IndexOption::Analyzed | IndexOption::AnalyzedNoNorms)
    }

    pub fn omits_norms(self) -> bool {
        matches!(
            self,
            IndexOption::AnalyzedNoNorms | IndexOption::NotAnalyzedNoNorms
        )
    }
}

/// Whether a field's value is kept for retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageOption {
    Stored,
    NotStored,
}

/// Term vector recording requested for a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermVectorOption {
    #[default]
    No,
    Yes,
    WithPositions,
    WithOffsets,
    WithPositionsOffsets,
}

/// Numeric payload of a numeric field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl NumericValue {
    pub fn as_f64(self) -> f64 {
        match self {
            NumericValue::Int(v) => f64::from(v),
            NumericValue::Long(v) => v as f64,
            NumericValue::Float(v) => f64::from(v),
            NumericValue::Double(v) => v,
        }
    }

    pub fn is_nan(self) -> bool {
        self.as_f64().is_nan()
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Int(v) => write!(f, "{v}"),
            NumericValue::Long(v) => write!(f, "{v}"),
            NumericValue::Float(v) => write!(f, "{v}"),
            NumericValue::Double(v) => write!(f, "{v}"),
        }
    }
}

/// Typed value of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldValue {
    Date {
        value: DateTime<Utc>,
    },
    String {
        value: String,
    },
    Numeric {
        value: NumericValue,
        precision_step: u32,
    },
}

impl FieldValue {
    /// Text form used for exact-match terms and display
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Date { value } => format_date(value),
            FieldValue::String { value } => value.clone(),
            FieldValue::Numeric { value, .. } => value.to_string(),
        }
    }
}

/// Canonical text form of a date value
pub fn format_date(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One named, typed value of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub index: IndexOption,
    pub storage: StorageOption,
    #[serde(default)]
    pub term_vector: TermVectorOption,
    #[serde(default = "default_boost")]
    pub boost: f32,
}

fn default_boost() -> f32 {
    1.0
}

impl Field {
    fn with_value(name: impl Into<String>, value: FieldValue, index: IndexOption) -> Self {
        Self {
            name: name.into(),
            value,
            index,
            storage: StorageOption::Stored,
            term_vector: TermVectorOption::No,
            boost: default_boost(),
        }
    }

    /// Analyzed, stored string field
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_value(
            name,
            FieldValue::String {
                value: value.into(),
            },
            IndexOption::Analyzed,
        )
    }

    /// Not-analyzed, stored string field (identifiers, keys)
    pub fn keyword(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::string(name, value).with_index(IndexOption::NotAnalyzed)
    }

    /// Not-analyzed, stored date field
    pub fn date(name: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::with_value(name, FieldValue::Date { value }, IndexOption::NotAnalyzed)
    }

    /// Stored numeric field with the default precision step
    pub fn numeric(name: impl Into<String>, value: NumericValue) -> Self {
        Self::with_value(
            name,
            FieldValue::Numeric {
                value,
                precision_step: DEFAULT_PRECISION_STEP,
            },
            IndexOption::NotAnalyzed,
        )
    }

    pub fn with_index(mut self, index: IndexOption) -> Self {
        self.index = index;
        self
    }

    pub fn with_storage(mut self, storage: StorageOption) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_term_vector(mut self, term_vector: TermVectorOption) -> Self {
        self.term_vector = term_vector;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Override the precision step; no effect on non-numeric fields
    pub fn with_precision_step(mut self, step: u32) -> Self {
        if let FieldValue::Numeric { precision_step, .. } = &mut self.value {
            *precision_step = step;
        }
        self
    }

    pub fn is_stored(&self) -> bool {
        self.storage == StorageOption::Stored
    }
}

/// An indexable unit: an ordered collection of fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// First field with the given name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Text form of the first field with the given name
    pub fn get_text(&self, name: &str) -> Option<String> {
        self.get(name).map(|f| f.value.to_text())
    }

    /// Build a document from a flat JSON object.
    ///
    /// Strings become analyzed fields, except keys starting with `@`
    /// which become not-analyzed identifier fields. Integers become
    /// `Long`, other numbers `Double`, booleans not-analyzed strings.
    /// Arrays of scalars produce one field per element.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            DocSearchError::InvalidDocument("document must be a JSON object".to_string())
        })?;

        let mut document = Document::new();
        for (name, value) in object {
            match value {
                serde_json::Value::Array(items) => {
                    for item in items {
                        document.push(json_scalar_field(name, item)?);
                    }
                }
                scalar => document.push(json_scalar_field(name, scalar)?),
            }
        }
        Ok(document)
    }

    /// Flat JSON view of the document; repeated names become arrays
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for field in &self.fields {
            let value = match &field.value {
                FieldValue::String { value } => serde_json::Value::from(value.as_str()),
                FieldValue::Date { value } => serde_json::Value::from(format_date(value)),
                FieldValue::Numeric { value, .. } => match value {
                    NumericValue::Int(v) => serde_json::Value::from(*v),
                    NumericValue::Long(v) => serde_json::Value::from(*v),
                    NumericValue::Float(v) => serde_json::Value::from(f64::from(*v)),
                    NumericValue::Double(v) => serde_json::Value::from(*v),
                },
            };
            match object.get_mut(&field.name) {
                Some(serde_json::Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = serde_json::Value::Array(vec![first, value]);
                }
                None => {
                    object.insert(field.name.clone(), value);
                }
            }
        }
        serde_json::Value::Object(object)
    }
}

fn json_scalar_field(name: &str, value: &serde_json::Value) -> Result<Field> {
    let field = match value {
        serde_json::Value::String(s) if name.starts_with('@') => Field::keyword(name, s.as_str()),
        serde_json::Value::String(s) => Field::string(name, s.as_str()),
        serde_json::Value::Bool(b) => Field::keyword(name, b.to_string()),
        serde_json::Value::Number(n) => {
            let numeric = match n.as_i64() {
                Some(v) => NumericValue::Long(v),
                None => NumericValue::Double(n.as_f64().ok_or_else(|| {
                    DocSearchError::InvalidDocument(format!("field '{name}': unsupported number {n}"))
                })?),
            };
            Field::numeric(name, numeric)
        }
        serde_json::Value::Null => {
            return Err(DocSearchError::InvalidDocument(format!(
                "field '{name}' is null"
            )))
        }
        _ => {
            return Err(DocSearchError::InvalidDocument(format!(
                "field '{name}' must be a scalar or an array of scalars"
            )))
        }
    };
    Ok(field)
}

/// Exact-match key used for update and delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub field_name: String,
    pub value: String,
}

impl Term {
    pub fn new(field_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
        }
    }
}

impl FromStr for Term {
    type Err = DocSearchError;

    /// Parse `field=value`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((field, value)) if !field.trim().is_empty() => {
                Ok(Term::new(field.trim(), value))
            }
            _ => Err(DocSearchError::MalformedQuery(format!(
                "term must look like field=value, got '{s}'"
            ))),
        }
    }
}

/// A single ranked match
///
/// `document_id` is the engine-internal ordinal of the matching document.
/// It is only meaningful within the reader snapshot that produced it and
/// must not be persisted as an external key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub score: f32,
    pub document_id: u64,
    pub document: Option<Document>,
}

impl Hit {
    pub fn into_search_result(self) -> Option<SearchResult> {
        let score = self.score;
        self.document
            .map(|document| SearchResult { score, document })
    }
}

/// Caller-facing search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub score: f32,
    pub document: Document,
}

/// One requested sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field_name: String,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub type_hint: Option<i32>,
}

impl SortSpec {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            direction: None,
            type_hint: None,
        }
    }

    pub fn descending(mut self) -> Self {
        self.direction = Some("desc".to_string());
        self
    }

    pub fn with_type_hint(mut self, hint: i32) -> Self {
        self.type_hint = Some(hint);
        self
    }
}

impl FromStr for SortSpec {
    type Err = DocSearchError;

    /// Parse `"<field> [<direction>] [<type-hint>]"`.
    ///
    /// A type-hint token that is not an integer is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let mut tokens = s.split_whitespace();
        let field_name = tokens
            .next()
            .ok_or_else(|| DocSearchError::MalformedQuery("empty sort clause".to_string()))?;
        let direction = tokens.next().map(str::to_string);
        let type_hint = tokens.next().and_then(|t| t.parse::<i32>().ok());

        if let Some(extra) = tokens.next() {
            return Err(DocSearchError::MalformedQuery(format!(
                "unexpected token '{extra}' in sort clause '{s}'"
            )));
        }

        Ok(SortSpec {
            field_name: field_name.to_string(),
            direction,
            type_hint,
        })
    }
}

/// Free text plus filter, sort and paging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    #[serde(default)]
    pub free_text: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub sort: Vec<SortSpec>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub take: i64,
}

/// Point-in-time statistics of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub num_docs: u64,
    pub num_segments: usize,
}
