//! Token remapper: projects lexer tokens from canonical text back onto the escaped source.

use crate::escape::Unescaped;
use crate::lexer::{SqlToken, SqlTokenCategory};
use crate::range::{NormalizedRanges, SourceRange};

/// A highlighted span of the original buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlTag {
    /// Range in the original buffer (UTF-16 code units).
    pub range: SourceRange,
    /// SQL category of the token the span belongs to.
    pub category: SqlTokenCategory,
    /// `true` if the span covers an escape sequence of the host literal.
    pub is_escape: bool,
}

impl SqlTag {
    /// Create a tag.
    pub fn new(range: SourceRange, category: SqlTokenCategory, is_escape: bool) -> Self {
        Self {
            range,
            category,
            is_escape,
        }
    }

    /// Classification name for the tag, e.g. `sql.keyword` or `sql.keyword.escape`.
    pub fn classification(&self) -> String {
        if self.is_escape {
            format!("sql.{}.escape", self.category.name())
        } else {
            format!("sql.{}", self.category.name())
        }
    }
}

/// Project `tokens` (canonical `char` offsets) onto original coordinates.
///
/// `base` is the buffer offset of the literal content that `unescaped` was produced from. Each
/// token is split at escape boundaries: the parts covering escape sequences are tagged with
/// `is_escape = true`. Zero-length and `None`-category tokens are dropped. Output is ordered by
/// start offset.
pub fn remap_tokens(base: usize, unescaped: &Unescaped, tokens: &[SqlToken]) -> Vec<SqlTag> {
    let corrections = unescaped.corrections();
    let escapes = unescaped.escape_ranges();

    let mut tags = Vec::new();
    let mut skipped = 0usize;
    let mut next = 0usize;

    for token in tokens {
        if token.len == 0 || token.category == SqlTokenCategory::None {
            continue;
        }

        while next < corrections.len() && corrections[next].index < token.start + skipped {
            skipped += corrections[next].skip;
            next += 1;
        }
        let start = token.start + skipped;

        let mut len = token.len;
        while next < corrections.len() && corrections[next].index < start + len {
            len += corrections[next].skip;
            next += 1;
        }
        skipped += len - token.len;

        let span = NormalizedRanges::single(SourceRange::new(start, len));
        let mut parts: Vec<SqlTag> = span
            .overlap(&escapes)
            .iter()
            .map(|r| SqlTag::new(r.shifted(base), token.category, true))
            .chain(
                span.difference(&escapes)
                    .iter()
                    .map(|r| SqlTag::new(r.shifted(base), token.category, false)),
            )
            .collect();
        parts.sort_by_key(|t| t.range.start);
        tags.extend(parts);
    }

    tags
}
