//! Query service.
//!
//! Executes plain and structured queries against a named index through
//! the writer handle's reader. Reads never create an index: an identity
//! with no cached handle is opened with `create_if_missing = false`.

use crate::core::config::SearchConfig;
use crate::core::engine::document::from_native_document;
use crate::core::engine::schema::BOOST_FIELD;
use crate::core::engine::{classify, WriterHandle};
use crate::core::error::{DocSearchError, Result};
use crate::core::registry::WriterRegistry;
use crate::core::search::translator::{
    parse_text, translate, ResultWindow, SortKey, SortOrder, SortType,
};
use crate::core::types::{Document, FieldValue, Hit, IndexIdentity, IndexStats, StructuredQuery};
use std::cmp::Ordering;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query};
use tantivy::{DocAddress, DocId, Score, Searcher, SegmentReader, TantivyDocument};

/// Query service
pub struct QueryService {
    registry: Arc<WriterRegistry>,
    max_results: usize,
    max_query_length: usize,
}

/// A match with the values it sorts by
///
/// `values` runs parallel to the sort keys; score and document-order keys
/// leave their slot empty.
struct Candidate {
    score: Score,
    ordinal: u64,
    address: DocAddress,
    values: Vec<Option<SortValue>>,
}

impl QueryService {
    pub fn new(registry: Arc<WriterRegistry>, config: &SearchConfig) -> Self {
        Self {
            registry,
            max_results: config.max_results,
            max_query_length: config.max_query_length,
        }
    }

    /// Hits for `query` by descending score, at most `max_results`
    pub fn search(
        &self,
        identity: &IndexIdentity,
        default_field: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Hit>> {
        self.check_length(query)?;
        let limit = max_results.min(self.max_results);

        self.with_handle(identity, |handle| {
            let native = parse_text(Some(query), default_field, handle.fields())?;
            let searcher = handle.query_searcher()?;

            let bases = segment_bases(&searcher);
            let top = top_matches(&searcher, &*native, limit)?;
            top.into_iter()
                .map(|(score, address)| load_hit(&searcher, handle, &bases, score, address))
                .collect()
        })
    }

    /// Hits for a structured query: filter, sort, then the skip/take window
    pub fn search_structured(
        &self,
        identity: &IndexIdentity,
        default_field: &str,
        query: &StructuredQuery,
    ) -> Result<Vec<Hit>> {
        for text in [&query.free_text, &query.filter].into_iter().flatten() {
            self.check_length(text)?;
        }

        self.with_handle(identity, |handle| {
            let translated = translate(query, default_field, handle.fields(), self.max_results)?;
            if translated.window.is_empty() {
                return Ok(Vec::new());
            }

            let native: Box<dyn Query> = match translated.filter {
                Some(filter) => Box::new(BooleanQuery::new(vec![
                    (Occur::Must, translated.query),
                    (Occur::Must, Box::new(BoostQuery::new(filter, 0.0))),
                ])),
                None => translated.query,
            };

            let searcher = handle.query_searcher()?;
            match translated.sort {
                SortOrder::Relevance => {
                    let bases = segment_bases(&searcher);
                    let top = top_matches(&searcher, &*native, translated.window.end())?;
                    top.into_iter()
                        .skip(translated.window.skip)
                        .map(|(score, address)| {
                            load_hit(&searcher, handle, &bases, score, address)
                        })
                        .collect()
                }
                SortOrder::Fields(keys) => {
                    sorted_hits(&searcher, handle, &*native, &keys, translated.window)
                }
            }
        })
    }

    /// Document and segment counts of the last commit
    pub fn stats(&self, identity: &IndexIdentity) -> Result<IndexStats> {
        self.with_handle(identity, |handle| Ok(handle.stats()))
    }

    /// Run `op` against the handle of `identity` without creating the index
    ///
    /// Exhaustion evicts the handle before the error reaches the caller.
    fn with_handle<T>(
        &self,
        identity: &IndexIdentity,
        op: impl FnOnce(&WriterHandle) -> Result<T>,
    ) -> Result<T> {
        let handle = self.registry.get_or_create_writer(identity, false)?;

        match op(&handle) {
            Err(e @ DocSearchError::ResourceExhausted(_)) => {
                tracing::warn!(
                    index = %identity,
                    "Resource exhaustion during query, evicting writer handle: {e}"
                );
                self.registry.evict_exhausted(identity, &handle);
                Err(e)
            }
            result => result,
        }
    }

    fn check_length(&self, text: &str) -> Result<()> {
        if text.len() > self.max_query_length {
            return Err(DocSearchError::MalformedQuery(format!(
                "query is {} bytes, limit is {}",
                text.len(),
                self.max_query_length
            )));
        }
        Ok(())
    }
}

/// Top `limit` matches with document boosts applied to their scores
fn top_matches(
    searcher: &Searcher,
    query: &dyn Query,
    limit: usize,
) -> Result<Vec<(Score, DocAddress)>> {
    let limit = limit.min(searcher.num_docs() as usize);
    if limit == 0 {
        return Ok(Vec::new());
    }

    let collector = TopDocs::with_limit(limit).tweak_score(|segment_reader: &SegmentReader| {
        let boosts = segment_reader.fast_fields().f64(BOOST_FIELD).ok();
        move |doc: DocId, score: Score| {
            let boost = boosts
                .as_ref()
                .and_then(|column| column.first(doc))
                .unwrap_or(1.0);
            score * boost as Score
        }
    });

    searcher
        .search(query, &collector)
        .map_err(|e| classify("Search failed", e))
}

/// First document ordinal of every segment
fn segment_bases(searcher: &Searcher) -> Vec<u64> {
    searcher
        .segment_readers()
        .iter()
        .scan(0u64, |next, reader| {
            let base = *next;
            *next += u64::from(reader.max_doc());
            Some(base)
        })
        .collect()
}

fn ordinal(bases: &[u64], address: DocAddress) -> u64 {
    bases
        .get(address.segment_ord as usize)
        .copied()
        .unwrap_or_default()
        + u64::from(address.doc_id)
}

fn load_document(
    searcher: &Searcher,
    handle: &WriterHandle,
    address: DocAddress,
) -> Result<Option<Document>> {
    let native: TantivyDocument = searcher
        .doc(address)
        .map_err(|e| classify("Failed to retrieve document", e))?;
    from_native_document(&native, handle.fields())
}

fn load_hit(
    searcher: &Searcher,
    handle: &WriterHandle,
    bases: &[u64],
    score: Score,
    address: DocAddress,
) -> Result<Hit> {
    Ok(Hit {
        score,
        document_id: ordinal(bases, address),
        document: load_document(searcher, handle, address)?,
    })
}

/// Matches sorted by `keys`, then windowed
///
/// Sort values come from the stored document, so a field that was not
/// stored sorts as missing. Only the hits inside the window are loaded
/// in full.
fn sorted_hits(
    searcher: &Searcher,
    handle: &WriterHandle,
    query: &dyn Query,
    keys: &[SortKey],
    window: ResultWindow,
) -> Result<Vec<Hit>> {
    let bases = segment_bases(searcher);
    let matches = top_matches(searcher, query, usize::MAX)?;
    let reads_fields = keys.iter().any(|key| key.kind.reads_field());

    let candidates = matches
        .into_iter()
        .map(|(score, address)| {
            let document = if reads_fields {
                load_document(searcher, handle, address)?
            } else {
                None
            };
            Ok(Candidate {
                score,
                ordinal: ordinal(&bases, address),
                address,
                values: keys
                    .iter()
                    .map(|key| sort_value(document.as_ref(), key))
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    select_window(candidates, keys, window)
        .into_iter()
        .map(|c| load_hit(searcher, handle, &bases, c.score, c.address))
        .collect()
}

/// Candidates inside `window`, in sort order
///
/// Ties keep document order. Only the first `window.end()` candidates are
/// fully sorted.
fn select_window(
    mut candidates: Vec<Candidate>,
    keys: &[SortKey],
    window: ResultWindow,
) -> Vec<Candidate> {
    let compare = |a: &Candidate, b: &Candidate| {
        compare_candidates(a, b, keys).then_with(|| a.ordinal.cmp(&b.ordinal))
    };

    let end = window.end().min(candidates.len());
    if end <= window.skip {
        return Vec::new();
    }
    if end < candidates.len() {
        candidates.select_nth_unstable_by(end - 1, compare);
        candidates.truncate(end);
    }
    candidates.sort_by(compare);
    candidates.drain(window.skip..).collect()
}

fn compare_candidates(a: &Candidate, b: &Candidate, keys: &[SortKey]) -> Ordering {
    keys.iter()
        .zip(a.values.iter().zip(&b.values))
        .map(|(key, (x, y))| {
            let natural = match key.kind {
                // Relevance is naturally best-first
                SortType::Score => b.score.total_cmp(&a.score),
                SortType::Doc => a.ordinal.cmp(&b.ordinal),
                _ => compare_values(x, y),
            };
            if key.reverse {
                natural.reverse()
            } else {
                natural
            }
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Number(f64),
    Text(String),
}

fn sort_value(document: Option<&Document>, key: &SortKey) -> Option<SortValue> {
    if !key.kind.reads_field() {
        return None;
    }
    let value = &document?.get(&key.field)?.value;

    if !key.kind.is_numeric() {
        return Some(SortValue::Text(value.to_text()));
    }

    match value {
        FieldValue::Numeric { value, .. } => Some(SortValue::Number(value.as_f64())),
        FieldValue::Date { value } => Some(SortValue::Number(value.timestamp_millis() as f64)),
        FieldValue::String { value } => value.trim().parse::<f64>().ok().map(SortValue::Number),
    }
}

/// Missing values sort first
fn compare_values(a: &Option<SortValue>, b: &Option<SortValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(SortValue::Number(x)), Some(SortValue::Number(y))) => x.total_cmp(y),
        (Some(SortValue::Text(x)), Some(SortValue::Text(y))) => x.cmp(y),
        (Some(SortValue::Number(_)), Some(SortValue::Text(_))) => Ordering::Less,
        (Some(SortValue::Text(_)), Some(SortValue::Number(_))) => Ordering::Greater,
    }
}
