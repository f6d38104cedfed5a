//! Recursive descent parser for query strings
//!
//! # Grammar
//!
//! ```text
//! query    := clause*
//! clause   := (AND | OR)? (NOT | '+' | '-')? primary ('^' boost)?
//! primary  := '(' query ')' | TERM ':' value | value
//! value    := TERM | PHRASE ('~' slop)? | range | '*'
//! range    := ('[' | '{') bound TO bound (']' | '}')
//! ```
//!
//! Clause occurrence follows the classic Lucene rules: a plain clause is
//! optional, `+` and `AND` make it required and `-` and `NOT` prohibit it.
//! `a AND b` also makes the clause before the conjunction required.

use super::lexer::{Lexer, Token};
use crate::core::engine::document::analyze;
use crate::core::engine::schema::{
    encode_sortable, sortable_token, text_token, EngineFields, KEYS_FIELD, SORTABLE_SEPARATOR,
    TEXT_SEPARATOR,
};
use crate::core::error::{DocSearchError, Result};
use chrono::DateTime;
use std::ops::Bound;
use tantivy::query::{
    AllQuery, BooleanQuery, BoostQuery, EmptyQuery, Occur, PhraseQuery, Query, RangeQuery,
    RegexQuery, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

/// Deepest allowed nesting of parenthesised groups
const MAX_DEPTH: usize = 32;

type Clause = (Occur, Box<dyn Query>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    None,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Required,
    Prohibited,
}

/// Parser for Lucene-style query strings
pub struct QueryStringParser<'a> {
    lexer: Lexer,
    current_token: Token,
    /// Field for unqualified terms
    default_field: String,
    fields: &'a EngineFields,
    depth: usize,
}

impl<'a> QueryStringParser<'a> {
    /// Create a new parser for the given query string
    pub fn new(input: &str, default_field: &str, fields: &'a EngineFields) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;

        Ok(Self {
            lexer,
            current_token,
            default_field: default_field.to_string(),
            fields,
            depth: 0,
        })
    }

    /// Parse the whole input into a native query
    pub fn parse(&mut self) -> Result<Box<dyn Query>> {
        let field = self.default_field.clone();
        let clauses = self.parse_clauses(&field)?;

        if self.current_token != Token::Eof {
            return Err(DocSearchError::MalformedQuery(format!(
                "unexpected {:?} before '{}'",
                self.current_token,
                self.lexer.remaining()
            )));
        }

        Ok(combine(clauses))
    }

    fn advance(&mut self) -> Result<()> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if self.current_token != expected {
            return Err(DocSearchError::MalformedQuery(format!(
                "expected {expected:?}, found {:?}",
                self.current_token
            )));
        }
        self.advance()
    }

    fn parse_clauses(&mut self, field: &str) -> Result<Vec<Clause>> {
        let mut clauses: Vec<Clause> = Vec::new();

        while !matches!(self.current_token, Token::Eof | Token::RightParen) {
            let conjunction = match self.current_token {
                Token::And => Conjunction::And,
                Token::Or => Conjunction::Or,
                _ => Conjunction::None,
            };
            if conjunction != Conjunction::None {
                if clauses.is_empty() {
                    return Err(DocSearchError::MalformedQuery(
                        "query cannot start with a conjunction".to_string(),
                    ));
                }
                self.advance()?;
            }

            let modifier = match self.current_token {
                Token::Plus => Modifier::Required,
                Token::Minus | Token::Not => Modifier::Prohibited,
                _ => Modifier::None,
            };
            if modifier != Modifier::None {
                self.advance()?;
            }

            let query = self.parse_primary(field)?;
            let query = self.parse_boost(query)?;
            add_clause(&mut clauses, conjunction, modifier, query);
        }

        Ok(clauses)
    }

    fn parse_primary(&mut self, field: &str) -> Result<Box<dyn Query>> {
        match self.current_token.clone() {
            Token::LeftParen => self.parse_group(field),
            Token::Phrase(text) => {
                self.advance()?;
                let slop = self.parse_slop()?;
                Ok(self.phrase_query(field, &text, slop))
            }
            Token::LeftBracket | Token::LeftBrace => self.parse_range(field),
            Token::Term { text, wildcard } => {
                self.advance()?;
                if self.current_token == Token::Colon {
                    self.advance()?;
                    return self.parse_field_value(&text);
                }
                if text == "*" && wildcard.is_some() {
                    return Ok(Box::new(AllQuery));
                }
                self.reject_fuzzy()?;
                self.term_query(field, &text, wildcard.as_deref())
            }
            other => Err(DocSearchError::MalformedQuery(format!(
                "expected a term, found {other:?}"
            ))),
        }
    }

    fn parse_field_value(&mut self, name: &str) -> Result<Box<dyn Query>> {
        if name == "*" {
            if !self.current_token.is_star() {
                return Err(DocSearchError::MalformedQuery(
                    "'*' may only be used as a field in '*:*'".to_string(),
                ));
            }
            self.advance()?;
            return Ok(Box::new(AllQuery));
        }

        match self.current_token.clone() {
            Token::LeftParen => self.parse_group(name),
            Token::Phrase(text) => {
                self.advance()?;
                let slop = self.parse_slop()?;
                Ok(self.phrase_query(name, &text, slop))
            }
            Token::LeftBracket | Token::LeftBrace => self.parse_range(name),
            Token::Term { text, wildcard } => {
                self.advance()?;
                if text == "*" && wildcard.is_some() {
                    return self.exists_query(name);
                }
                self.reject_fuzzy()?;
                self.term_query(name, &text, wildcard.as_deref())
            }
            other => Err(DocSearchError::MalformedQuery(format!(
                "expected a value for field '{name}', found {other:?}"
            ))),
        }
    }

    fn parse_group(&mut self, field: &str) -> Result<Box<dyn Query>> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(DocSearchError::MalformedQuery(format!(
                "groups nested deeper than {MAX_DEPTH}"
            )));
        }

        self.expect(Token::LeftParen)?;
        let clauses = self.parse_clauses(field)?;
        self.expect(Token::RightParen)?;

        self.depth -= 1;
        Ok(combine(clauses))
    }

    fn parse_boost(&mut self, query: Box<dyn Query>) -> Result<Box<dyn Query>> {
        if self.current_token != Token::Caret {
            return Ok(query);
        }
        self.advance()?;

        let boost = match &self.current_token {
            Token::Term {
                text,
                wildcard: None,
            } => text.parse::<f32>().ok().filter(|b| b.is_finite() && *b >= 0.0),
            _ => None,
        }
        .ok_or_else(|| {
            DocSearchError::MalformedQuery(format!(
                "expected a boost after '^', found {:?}",
                self.current_token
            ))
        })?;
        self.advance()?;

        Ok(Box::new(BoostQuery::new(query, boost)))
    }

    fn parse_slop(&mut self) -> Result<u32> {
        if self.current_token != Token::Tilde {
            return Ok(0);
        }
        self.advance()?;

        let slop = match &self.current_token {
            Token::Term {
                text,
                wildcard: None,
            } => text.parse::<u32>().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            DocSearchError::MalformedQuery(format!(
                "expected a phrase slop after '~', found {:?}",
                self.current_token
            ))
        })?;
        self.advance()?;

        Ok(slop)
    }

    fn reject_fuzzy(&self) -> Result<()> {
        if self.current_token == Token::Tilde {
            return Err(DocSearchError::MalformedQuery(
                "fuzzy term queries are not supported".to_string(),
            ));
        }
        Ok(())
    }

    fn parse_range(&mut self, field: &str) -> Result<Box<dyn Query>> {
        let lower_inclusive = self.current_token == Token::LeftBracket;
        self.advance()?;

        let lower = self.parse_bound()?;
        match &self.current_token {
            Token::Term { text, .. } if text == "TO" => self.advance()?,
            other => {
                return Err(DocSearchError::MalformedQuery(format!(
                    "expected TO in range, found {other:?}"
                )))
            }
        }
        let upper = self.parse_bound()?;

        let upper_inclusive = match self.current_token {
            Token::RightBracket => true,
            Token::RightBrace => false,
            ref other => {
                return Err(DocSearchError::MalformedQuery(format!(
                    "expected ']' or '}}' to close range, found {other:?}"
                )))
            }
        };
        self.advance()?;

        self.range_query(field, (lower, lower_inclusive), (upper, upper_inclusive))
    }

    /// A range bound; `None` for an open `*`
    fn parse_bound(&mut self) -> Result<Option<String>> {
        let bound = match self.current_token.clone() {
            Token::Term {
                text,
                wildcard: Some(_),
            } if text == "*" => None,
            Token::Term { text, .. } => Some(text),
            Token::Phrase(text) => Some(text),
            other => {
                return Err(DocSearchError::MalformedQuery(format!(
                    "expected a range bound, found {other:?}"
                )))
            }
        };
        self.advance()?;
        Ok(bound)
    }

    fn scored_term_queries(&self, token: &str) -> Vec<Box<dyn Query>> {
        self.fields
            .scored()
            .into_iter()
            .map(|field| {
                Box::new(TermQuery::new(
                    Term::from_field_text(field, token),
                    IndexRecordOption::WithFreqs,
                )) as Box<dyn Query>
            })
            .collect()
    }

    fn scored_phrase_queries(&self, tokens: &[String], slop: u32) -> Vec<Box<dyn Query>> {
        self.fields
            .scored()
            .into_iter()
            .map(|field: Field| {
                let terms = tokens
                    .iter()
                    .map(|token| Term::from_field_text(field, token))
                    .collect();
                let mut phrase = PhraseQuery::new(terms);
                phrase.set_slop(slop);
                Box::new(phrase) as Box<dyn Query>
            })
            .collect()
    }

    /// Verbatim token plus the analyzed form as a term or phrase
    fn text_queries(&self, field: &str, text: &str, slop: u32) -> Vec<Box<dyn Query>> {
        let verbatim = text_token(field, text);
        let mut queries = self.scored_term_queries(&verbatim);

        let analyzed: Vec<String> = analyze(text)
            .into_iter()
            .map(|token| text_token(field, &token))
            .collect();

        match analyzed.as_slice() {
            [] => {}
            [single] if *single == verbatim => {}
            [single] => queries.extend(self.scored_term_queries(single)),
            tokens => queries.extend(self.scored_phrase_queries(tokens, slop)),
        }
        queries
    }

    fn term_query(
        &self,
        field: &str,
        text: &str,
        wildcard: Option<&str>,
    ) -> Result<Box<dyn Query>> {
        let queries = match wildcard {
            Some(pattern) => self.wildcard_queries(field, pattern)?,
            None => self.text_queries(field, text, 0),
        };
        Ok(any_of(queries))
    }

    fn phrase_query(&self, field: &str, text: &str, slop: u32) -> Box<dyn Query> {
        any_of(self.text_queries(field, text, slop))
    }

    fn wildcard_queries(&self, field: &str, pattern: &str) -> Result<Vec<Box<dyn Query>>> {
        let prefix = format!("{}\\x1f", regex::escape(field));
        let lowered = pattern.to_lowercase();

        let mut patterns = vec![format!("{prefix}{pattern}")];
        if lowered != pattern {
            patterns.push(format!("{prefix}{lowered}"));
        }

        patterns
            .iter()
            .map(|p| {
                RegexQuery::from_pattern(p, self.fields.keys)
                    .map(|q| Box::new(q) as Box<dyn Query>)
                    .map_err(|e| {
                        DocSearchError::MalformedQuery(format!("invalid wildcard '{pattern}': {e}"))
                    })
            })
            .collect()
    }

    /// Documents carrying any indexed value for the field
    fn exists_query(&self, field: &str) -> Result<Box<dyn Query>> {
        let pattern = format!("{}[\\x1e\\x1f].*", regex::escape(field));
        let query = RegexQuery::from_pattern(&pattern, self.fields.keys).map_err(|e| {
            DocSearchError::MalformedQuery(format!("invalid field name '{field}': {e}"))
        })?;
        Ok(Box::new(query))
    }

    fn range_query(
        &self,
        field: &str,
        lower: (Option<String>, bool),
        upper: (Option<String>, bool),
    ) -> Result<Box<dyn Query>> {
        if lower.0.is_none() && upper.0.is_none() {
            return self.exists_query(field);
        }

        let sortable = [&lower.0, &upper.0]
            .into_iter()
            .flatten()
            .map(|bound| parse_sortable(bound))
            .collect::<Option<Vec<f64>>>();

        let (lower, upper) = match sortable {
            Some(_) => (
                sortable_bound(field, lower, true),
                sortable_bound(field, upper, false),
            ),
            None => (
                text_bound(field, lower, true),
                text_bound(field, upper, false),
            ),
        };

        Ok(Box::new(RangeQuery::new_str_bounds(
            KEYS_FIELD.to_string(),
            lower.as_ref().map(String::as_str),
            upper.as_ref().map(String::as_str),
        )))
    }
}

/// Number or RFC 3339 date as a sortable number (dates in millis)
fn parse_sortable(bound: &str) -> Option<f64> {
    if let Ok(number) = bound.parse::<f64>() {
        return number.is_finite().then_some(number);
    }
    DateTime::parse_from_rfc3339(bound)
        .ok()
        .map(|date| date.timestamp_millis() as f64)
}

fn sortable_bound(field: &str, bound: (Option<String>, bool), lower: bool) -> Bound<String> {
    let encoded = bound
        .0
        .as_deref()
        .and_then(parse_sortable)
        .map(|value| sortable_token(field, &encode_sortable(value)));
    keyed_bound(encoded, bound.1, lower, field, SORTABLE_SEPARATOR)
}

fn text_bound(field: &str, bound: (Option<String>, bool), lower: bool) -> Bound<String> {
    let token = bound.0.map(|value| text_token(field, &value));
    keyed_bound(token, bound.1, lower, field, TEXT_SEPARATOR)
}

/// Open bounds stay within the tokens of `field` that use `separator`
fn keyed_bound(
    token: Option<String>,
    inclusive: bool,
    lower: bool,
    field: &str,
    separator: char,
) -> Bound<String> {
    match token {
        Some(token) if inclusive => Bound::Included(token),
        Some(token) => Bound::Excluded(token),
        None if lower => Bound::Included(format!("{field}{separator}")),
        None => {
            let next = char::from_u32(separator as u32 + 1).unwrap_or(separator);
            Bound::Excluded(format!("{field}{next}"))
        }
    }
}

fn add_clause(
    clauses: &mut Vec<Clause>,
    conjunction: Conjunction,
    modifier: Modifier,
    query: Box<dyn Query>,
) {
    if conjunction == Conjunction::And {
        if let Some(last) = clauses.last_mut() {
            if last.0 != Occur::MustNot {
                last.0 = Occur::Must;
            }
        }
    }

    let occur = match modifier {
        Modifier::Prohibited => Occur::MustNot,
        Modifier::Required => Occur::Must,
        Modifier::None if conjunction == Conjunction::And => Occur::Must,
        Modifier::None => Occur::Should,
    };
    clauses.push((occur, query));
}

fn any_of(mut queries: Vec<Box<dyn Query>>) -> Box<dyn Query> {
    match queries.len() {
        0 => Box::new(EmptyQuery),
        1 => queries.remove(0),
        _ => Box::new(BooleanQuery::new(
            queries.into_iter().map(|q| (Occur::Should, q)).collect(),
        )),
    }
}

/// Fold parsed clauses into one query
///
/// A purely negative query matches everything except its prohibited
/// clauses.
pub fn combine(mut clauses: Vec<Clause>) -> Box<dyn Query> {
    if clauses.is_empty() {
        return Box::new(EmptyQuery);
    }
    if clauses.len() == 1 && clauses[0].0 != Occur::MustNot {
        return clauses.remove(0).1;
    }
    if clauses.iter().all(|(occur, _)| *occur == Occur::MustNot) {
        clauses.push((Occur::Must, Box::new(AllQuery)));
    }
    Box::new(BooleanQuery::new(clauses))
}
