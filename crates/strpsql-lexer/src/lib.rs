#![warn(missing_docs)]
//! `strpsql-lexer` - a PostgreSQL lexer for `strpsql-core`.
//!
//! This is a highlighting lexer, not a parser: it never fails, and anything it does not
//! recognize becomes a `None` token. Unterminated strings, quoted identifiers and comments run
//! to the end of the input, which is what an editor wants while the user is still typing.
//!
//! Simple token shapes (numbers, words, parameters, dollar-quote tags) are regex rules; nested
//! block comments, quoted strings and dollar-quoted bodies are scanned by hand.

pub mod keywords;

use regex::Regex;
use std::sync::LazyLock;
use strpsql_core::{SqlLexer, SqlToken, SqlTokenCategory};

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:0[xX][0-9A-Fa-f_]+|0[oO][0-7_]+|0[bB][01_]+|(?:[0-9][0-9_]*(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)",
    )
    .expect("number pattern is valid")
});

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{Alphabetic}_][\p{Alphabetic}\p{Nd}_$]*").expect("word pattern is valid")
});

static NAMED_PARAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[:@][\p{Alphabetic}_][\p{Alphabetic}\p{Nd}_]*")
        .expect("named parameter pattern is valid")
});

static POSITIONAL_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$[0-9]+").expect("positional parameter pattern is valid"));

static DOLLAR_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$(?:[\p{Alphabetic}_][\p{Alphabetic}\p{Nd}_]*)?\$")
        .expect("dollar tag pattern is valid")
});

const OPERATOR_CHARS: &[u8] = b"+-*/<>=~!@#%^&|`?";
const PUNCTUATION_CHARS: &[u8] = b"(),;[].:$";

/// Lexes PostgreSQL into highlighting tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresLexer;

impl PostgresLexer {
    /// Create a lexer.
    pub fn new() -> Self {
        Self
    }

    /// Category and byte length of the token at the start of `rest` (never empty).
    fn next_token(&self, rest: &str) -> (SqlTokenCategory, usize) {
        let bytes = rest.as_bytes();
        let first = bytes[0];
        let second = bytes.get(1).copied();

        if let Some(len) = rest.find(|c: char| !c.is_whitespace()) {
            if len > 0 {
                return (SqlTokenCategory::None, len);
            }
        } else {
            return (SqlTokenCategory::None, rest.len());
        }

        match (first, second) {
            (b'-', Some(b'-')) => {
                let len = rest.find('\n').unwrap_or(rest.len());
                return (SqlTokenCategory::Comment, len);
            }
            (b'/', Some(b'*')) => return (SqlTokenCategory::Comment, block_comment_len(rest)),
            (b'\'', _) => return (SqlTokenCategory::String, quoted_len(rest, 0, b'\'', false)),
            (b'"', _) => return (SqlTokenCategory::Identifier, quoted_len(rest, 0, b'"', false)),
            (b':', Some(b':')) => return (SqlTokenCategory::Operator, 2),
            _ => {}
        }

        if let Some((category, len)) = prefixed_quote(rest) {
            return (category, len);
        }

        if first == b'$' {
            if let Some(tag) = DOLLAR_TAG.find(rest) {
                let delimiter = tag.as_str();
                let body = &rest[delimiter.len()..];
                let len = body
                    .find(delimiter)
                    .map_or(rest.len(), |end| delimiter.len() + end + delimiter.len());
                return (SqlTokenCategory::String, len);
            }
            if let Some(param) = POSITIONAL_PARAMETER.find(rest) {
                return (SqlTokenCategory::Parameter, param.end());
            }
        }

        if let Some(param) = NAMED_PARAMETER.find(rest) {
            return (SqlTokenCategory::Parameter, param.end());
        }

        if let Some(number) = NUMBER.find(rest) {
            return (SqlTokenCategory::Number, number.end());
        }

        if let Some(word) = WORD.find(rest) {
            let text = word.as_str();
            let category = if keywords::is_keyword(text) {
                SqlTokenCategory::Keyword
            } else if keywords::is_function(text) {
                SqlTokenCategory::SystemFunction
            } else {
                SqlTokenCategory::Identifier
            };
            return (category, word.end());
        }

        if OPERATOR_CHARS.contains(&first) {
            return (SqlTokenCategory::Operator, operator_len(rest));
        }

        if PUNCTUATION_CHARS.contains(&first) {
            return (SqlTokenCategory::Operator, 1);
        }

        let len = rest.chars().next().map_or(1, char::len_utf8);
        (SqlTokenCategory::None, len)
    }
}

impl SqlLexer for PostgresLexer {
    fn tokenize(&self, text: &str) -> Vec<SqlToken> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        let mut chars = 0;

        while pos < text.len() {
            let (category, len) = self.next_token(&text[pos..]);
            let token_chars = text[pos..pos + len].chars().count();
            tokens.push(SqlToken::new(category, chars, token_chars));
            pos += len;
            chars += token_chars;
        }

        tokens
    }
}

/// `E'...'`, `B'...'`, `X'...'`, `N'...'`, `U&'...'` strings and `U&"..."` identifiers.
fn prefixed_quote(rest: &str) -> Option<(SqlTokenCategory, usize)> {
    let bytes = rest.as_bytes();
    let prefix = bytes[0].to_ascii_uppercase();

    if prefix == b'U' && bytes.get(1) == Some(&b'&') {
        return match bytes.get(2) {
            Some(b'\'') => Some((SqlTokenCategory::String, quoted_len(rest, 2, b'\'', false))),
            Some(b'"') => Some((SqlTokenCategory::Identifier, quoted_len(rest, 2, b'"', false))),
            _ => None,
        };
    }

    if bytes.get(1) != Some(&b'\'') {
        return None;
    }
    match prefix {
        b'E' => Some((SqlTokenCategory::String, quoted_len(rest, 1, b'\'', true))),
        b'B' | b'X' | b'N' => Some((SqlTokenCategory::String, quoted_len(rest, 1, b'\'', false))),
        _ => None,
    }
}

/// Byte length of a quoted token whose opening quote is at `open`. Doubled quotes stay inside;
/// `backslash` enables C-style escapes.
fn quoted_len(rest: &str, open: usize, quote: u8, backslash: bool) -> usize {
    let bytes = rest.as_bytes();
    let mut i = open + 1;

    while i < bytes.len() {
        let b = bytes[i];
        if backslash && b == b'\\' {
            let escaped = rest[i + 1..].chars().next().map_or(0, char::len_utf8);
            i += 1 + escaped;
        } else if b == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
            } else {
                return i + 1;
            }
        } else {
            i += 1;
        }
    }

    rest.len()
}

/// Byte length of a (possibly nested) block comment.
fn block_comment_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }

    rest.len()
}

/// Byte length of an operator run; a comment start ends it.
fn operator_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut i = 0;

    while i < bytes.len() && OPERATOR_CHARS.contains(&bytes[i]) {
        if i > 0 && (rest[i..].starts_with("--") || rest[i..].starts_with("/*")) {
            break;
        }
        i += 1;
    }

    i
}
