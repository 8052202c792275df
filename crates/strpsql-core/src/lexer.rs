//! The SQL lexer seam.
//!
//! The engine treats the SQL lexer as a black box: canonical text in, ordered tokens out.
//! `strpsql-lexer` provides a PostgreSQL implementation.

/// Highlighting category of a SQL token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SqlTokenCategory {
    /// Whitespace and anything that is not highlighted. Never tagged.
    None,
    /// `-- ...` and `/* ... */`.
    Comment,
    /// Table, column and other names, quoted or not.
    Identifier,
    /// Reserved words.
    Keyword,
    /// Numeric literals.
    Number,
    /// Operators and punctuation.
    Operator,
    /// Bind parameters (`$1`, `@name`, `:name`).
    Parameter,
    /// SQL string literals.
    String,
    /// Built-in functions and other special tokens.
    SystemFunction,
}

impl SqlTokenCategory {
    /// All categories that produce tags.
    pub const TAGGED: [SqlTokenCategory; 8] = [
        SqlTokenCategory::Comment,
        SqlTokenCategory::Identifier,
        SqlTokenCategory::Keyword,
        SqlTokenCategory::Number,
        SqlTokenCategory::Operator,
        SqlTokenCategory::Parameter,
        SqlTokenCategory::String,
        SqlTokenCategory::SystemFunction,
    ];

    /// Stable lowercase name, used for classification names and JSON output.
    pub fn name(self) -> &'static str {
        match self {
            SqlTokenCategory::None => "none",
            SqlTokenCategory::Comment => "comment",
            SqlTokenCategory::Identifier => "identifier",
            SqlTokenCategory::Keyword => "keyword",
            SqlTokenCategory::Number => "number",
            SqlTokenCategory::Operator => "operator",
            SqlTokenCategory::Parameter => "parameter",
            SqlTokenCategory::String => "string",
            SqlTokenCategory::SystemFunction => "system-function",
        }
    }
}

/// A token in canonical text. Offsets count `char`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlToken {
    /// Token category.
    pub category: SqlTokenCategory,
    /// Start offset in `char`s.
    pub start: usize,
    /// Length in `char`s.
    pub len: usize,
}

impl SqlToken {
    /// Create a token.
    pub fn new(category: SqlTokenCategory, start: usize, len: usize) -> Self {
        Self {
            category,
            start,
            len,
        }
    }

    /// End offset in `char`s (exclusive).
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// A SQL lexer.
///
/// Implementations must be total (never fail, never panic on any input) and deterministic, and
/// return tokens ordered by start offset and non-overlapping.
pub trait SqlLexer {
    /// Tokenize canonical text.
    fn tokenize(&self, text: &str) -> Vec<SqlToken>;
}

impl<L: SqlLexer + ?Sized> SqlLexer for &L {
    fn tokenize(&self, text: &str) -> Vec<SqlToken> {
        (**self).tokenize(text)
    }
}

impl<L: SqlLexer + ?Sized> SqlLexer for Box<L> {
    fn tokenize(&self, text: &str) -> Vec<SqlToken> {
        (**self).tokenize(text)
    }
}
