//! Lexer for query string syntax
//!
//! Tokenizes Lucene-style query strings into a stream of tokens.

use crate::core::error::{DocSearchError, Result};

/// Token types for query string parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word, unescaped
    Term {
        text: String,
        /// Regex pattern when the word holds unescaped `*` or `?`
        wildcard: Option<String>,
    },
    /// A quoted string (phrase)
    Phrase(String),

    /// AND or &&
    And,
    /// OR or ||
    Or,
    /// NOT or a leading !
    Not,
    /// Leading + (required clause)
    Plus,
    /// Leading - (prohibited clause)
    Minus,

    /// Colon separator (field:value)
    Colon,
    /// Caret before a boost
    Caret,
    /// Tilde before a phrase slop
    Tilde,

    /// Left square bracket (inclusive range start)
    LeftBracket,
    /// Right square bracket (inclusive range end)
    RightBracket,
    /// Left curly brace (exclusive range start)
    LeftBrace,
    /// Right curly brace (exclusive range end)
    RightBrace,

    /// Left parenthesis (grouping)
    LeftParen,
    /// Right parenthesis (grouping)
    RightParen,

    /// End of input
    Eof,
}

impl Token {
    /// Bare `*`
    pub fn is_star(&self) -> bool {
        matches!(self, Token::Term { text, wildcard: Some(_) } if text == "*")
    }
}

/// Lexer for tokenizing query strings
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    /// Inside `[..]` or `{..}`: signs and colons are part of bounds
    in_range: bool,
}

impl Lexer {
    /// Create a new lexer for the given input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            in_range: false,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };

        if self.in_range {
            return match ch {
                ']' | '}' => {
                    self.advance();
                    self.in_range = false;
                    Ok(if ch == ']' {
                        Token::RightBracket
                    } else {
                        Token::RightBrace
                    })
                }
                '"' => self.read_phrase(),
                _ => self.read_term(),
            };
        }

        let single = match ch {
            ':' => Some(Token::Colon),
            '^' => Some(Token::Caret),
            '~' => Some(Token::Tilde),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            ']' => Some(Token::RightBracket),
            '}' => Some(Token::RightBrace),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '!' => Some(Token::Not),
            '[' | '{' => {
                self.in_range = true;
                Some(if ch == '[' {
                    Token::LeftBracket
                } else {
                    Token::LeftBrace
                })
            }
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match (ch, self.peek_char()) {
            ('&', Some('&')) => {
                self.position += 2;
                Ok(Token::And)
            }
            ('|', Some('|')) => {
                self.position += 2;
                Ok(Token::Or)
            }
            ('"', _) => self.read_phrase(),
            _ => self.read_term(),
        }
    }

    /// Get remaining input as string (for error messages)
    pub fn remaining(&self) -> String {
        self.input[self.position.min(self.input.len())..]
            .iter()
            .collect()
    }

    fn read_phrase(&mut self) -> Result<Token> {
        let start = self.position;
        self.advance();

        let mut text = String::new();
        loop {
            match self.current_char() {
                None => {
                    return Err(DocSearchError::MalformedQuery(format!(
                        "unterminated phrase starting at position {start}"
                    )))
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::Phrase(text));
                }
                Some('\\') => {
                    self.advance();
                    text.push(self.read_escaped()?);
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_term(&mut self) -> Result<Token> {
        let mut text = String::new();
        let mut pattern = String::new();
        let mut has_wildcard = false;

        while let Some(ch) = self.current_char() {
            if !self.is_term_char(ch) {
                break;
            }
            self.advance();

            match ch {
                '\\' => {
                    let escaped = self.read_escaped()?;
                    text.push(escaped);
                    pattern.push_str(&regex::escape(&escaped.to_string()));
                }
                '*' => {
                    has_wildcard = true;
                    text.push(ch);
                    pattern.push_str(".*");
                }
                '?' => {
                    has_wildcard = true;
                    text.push(ch);
                    pattern.push('.');
                }
                _ => {
                    text.push(ch);
                    pattern.push_str(&regex::escape(&ch.to_string()));
                }
            }
        }

        if text.is_empty() {
            return Err(DocSearchError::MalformedQuery(format!(
                "unexpected input at position {}: '{}'",
                self.position,
                self.remaining()
            )));
        }

        if !has_wildcard && !self.in_range {
            match text.as_str() {
                "AND" => return Ok(Token::And),
                "OR" => return Ok(Token::Or),
                "NOT" => return Ok(Token::Not),
                _ => {}
            }
        }

        Ok(Token::Term {
            text,
            wildcard: has_wildcard.then_some(pattern),
        })
    }

    fn read_escaped(&mut self) -> Result<char> {
        let ch = self.current_char().ok_or_else(|| {
            DocSearchError::MalformedQuery("query ends with a dangling escape".to_string())
        })?;
        self.advance();
        Ok(ch)
    }

    fn is_term_char(&self, ch: char) -> bool {
        if ch.is_whitespace() || ch == '"' {
            return false;
        }
        if self.in_range {
            return !matches!(ch, ']' | '}');
        }
        !matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | ':' | '^' | '~')
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}
