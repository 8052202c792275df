//! The tagging facade: one highlighting request from host tags to SQL tags.

use crate::config::HighlightConfig;
use crate::error::LiteralError;
use crate::escape::unescape;
use crate::lexer::SqlLexer;
use crate::literal::{LiteralClassifier, LiteralHead};
use crate::range::{NormalizedRanges, SourceRange};
use crate::regions::{EnabledRegions, inline_override};
use crate::remap::{SqlTag, remap_tokens};
use crate::snapshot::{HostTags, TextSnapshot};
use crate::stitch::{Stitched, collect_literals};

/// A stitched and classified literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLiteral {
    /// Fragment ranges, delimiters included, holes excluded.
    pub fragments: NormalizedRanges,
    /// Kind and delimiter lengths.
    pub head: LiteralHead,
}

impl LogicalLiteral {
    /// Fragments with the opening and closing delimiters trimmed off.
    ///
    /// The closing delimiter is only removed when the last fragment actually ends with it, so an
    /// unterminated literal keeps its tail. Fragments left empty are dropped.
    pub fn content_ranges(
        &self,
        snapshot: &TextSnapshot,
    ) -> Result<Vec<SourceRange>, LiteralError> {
        let count = self.fragments.len();
        let content: Vec<SourceRange> = self
            .fragments
            .iter()
            .enumerate()
            .filter_map(|(idx, fragment)| {
                let mut start = fragment.start;
                let mut end = fragment.end();
                if idx == 0 {
                    start += self.head.opening_len;
                }
                if idx + 1 == count && self.ends_with_closing(snapshot, fragment) {
                    end -= self.head.closing_len;
                }
                (start < end).then(|| SourceRange::from_bounds(start, end))
            })
            .collect();

        if content.is_empty() {
            return Err(LiteralError::EmptyAfterTrim);
        }
        Ok(content)
    }

    fn ends_with_closing(&self, snapshot: &TextSnapshot, fragment: &SourceRange) -> bool {
        let units = snapshot.slice(*fragment);
        units.len() >= self.head.closing_len
            && units[units.len() - self.head.closing_len..]
                .iter()
                .all(|&u| u == u16::from(b'"'))
    }
}

/// Outcome of a highlighting request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReport {
    /// Tags ordered by start offset, clipped to the request.
    pub tags: Vec<SqlTag>,
    /// Enabled literals that were not highlighted, with the reason.
    pub skipped: Vec<(SourceRange, LiteralError)>,
    /// Literals highlighted even though stitching stopped early.
    pub recovered: Vec<(SourceRange, LiteralError)>,
}

/// Highlights SQL embedded in string literals.
///
/// The tagger is a pure function of its inputs: it holds no per-request state, so a single
/// instance can serve concurrent requests over different snapshots.
#[derive(Debug, Clone)]
pub struct StringSqlTagger<L> {
    lexer: L,
    config: HighlightConfig,
    classifier: LiteralClassifier,
}

impl<L: SqlLexer> StringSqlTagger<L> {
    /// Create a tagger with the default configuration and the C# classifier.
    pub fn new(lexer: L) -> Self {
        Self {
            lexer,
            config: HighlightConfig::default(),
            classifier: LiteralClassifier::csharp(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: HighlightConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the literal classifier.
    pub fn with_classifier(mut self, classifier: LiteralClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// The SQL lexer.
    pub fn lexer(&self) -> &L {
        &self.lexer
    }

    /// Tags for `request`.
    pub fn tags(
        &self,
        snapshot: &TextSnapshot,
        tags: &HostTags,
        request: SourceRange,
    ) -> Vec<SqlTag> {
        self.tags_with_report(snapshot, tags, request).tags
    }

    /// Tags for `request`, plus the literals that were skipped or only partly stitched.
    pub fn tags_with_report(
        &self,
        snapshot: &TextSnapshot,
        tags: &HostTags,
        request: SourceRange,
    ) -> TagReport {
        let mut report = TagReport::default();
        let Some(request) = request.intersection(&snapshot.full_range()) else {
            return report;
        };

        let literals = collect_literals(snapshot, tags, request);
        log::trace!(
            "snapshot v{}: {} literal(s) reachable from {request}",
            snapshot.version(),
            literals.len()
        );
        if literals.is_empty() {
            return report;
        }

        let regions =
            EnabledRegions::compute(snapshot, tags, request, self.config.enabled_by_default);

        for stitched in literals {
            let Some(first) = stitched.fragments.first() else {
                continue;
            };
            let span = stitched.span().unwrap_or(first);

            let enabled = inline_override(snapshot, tags, first.start)
                .unwrap_or_else(|| regions.is_enabled(&first));
            if !enabled {
                continue;
            }

            match self.highlight(snapshot, &stitched) {
                Ok(literal_tags) => {
                    report.tags.extend(
                        literal_tags
                            .into_iter()
                            .filter_map(|tag| clip(tag, &request)),
                    );
                    if let Some(issue) = stitched.issue {
                        report.recovered.push((span, issue));
                    }
                }
                Err(err) => {
                    log::debug!("skipping literal at {span}: {err}");
                    report.skipped.push((span, err));
                }
            }
        }

        report.tags.sort_by_key(|tag| (tag.range.start, tag.range.end()));
        log::trace!("{} tag(s) for {request}", report.tags.len());
        report
    }

    /// Classify the stitched fragments of a literal.
    pub fn classify(
        &self,
        snapshot: &TextSnapshot,
        stitched: &Stitched,
    ) -> Result<LogicalLiteral, LiteralError> {
        let first = stitched
            .fragments
            .first()
            .ok_or(LiteralError::MalformedLiteralHead)?;
        let head = self.classifier.classify(snapshot.slice(first))?;
        Ok(LogicalLiteral {
            fragments: stitched.fragments.clone(),
            head,
        })
    }

    /// Tags for one whole literal, unclipped.
    ///
    /// Every fragment is unescaped and lexed on its own; a failure in any fragment rejects the
    /// whole literal.
    pub fn highlight(
        &self,
        snapshot: &TextSnapshot,
        stitched: &Stitched,
    ) -> Result<Vec<SqlTag>, LiteralError> {
        let literal = self.classify(snapshot, stitched)?;
        let content = literal.content_ranges(snapshot)?;

        let unescaped = content
            .iter()
            .map(|range| {
                unescape(snapshot.slice(*range), literal.head.kind).map(|text| (*range, text))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tags = Vec::new();
        for (range, text) in &unescaped {
            let tokens = self.lexer.tokenize(text.text());
            tags.extend(remap_tokens(range.start, text, &tokens));
        }
        Ok(tags)
    }
}

fn clip(tag: SqlTag, request: &SourceRange) -> Option<SqlTag> {
    let range = tag.range.intersection(request)?;
    Some(SqlTag { range, ..tag })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{SqlToken, SqlTokenCategory};
    use crate::literal::LiteralKind;
    use crate::snapshot::{HostTag, HostTagKind};
    use pretty_assertions::assert_eq;

    /// Every maximal run of non-space chars is one keyword.
    struct Words;

    impl SqlLexer for Words {
        fn tokenize(&self, text: &str) -> Vec<SqlToken> {
            let mut tokens = Vec::new();
            let mut start = None;
            for (idx, ch) in text.chars().chain(std::iter::once(' ')).enumerate() {
                match (ch.is_whitespace(), start) {
                    (false, None) => start = Some(idx),
                    (true, Some(s)) => {
                        tokens.push(SqlToken::new(SqlTokenCategory::Keyword, s, idx - s));
                        start = None;
                    }
                    _ => {}
                }
            }
            tokens
        }
    }

    fn string(start: usize, end: usize) -> HostTag {
        HostTag::new(SourceRange::from_bounds(start, end), HostTagKind::StringLiteral)
    }

    fn spans(tags: &[SqlTag]) -> Vec<(usize, usize, bool)> {
        tags.iter()
            .map(|t| (t.range.start, t.range.end(), t.is_escape))
            .collect()
    }

    #[test]
    fn test_plain_literal() {
        // 0123456789012345
        // x = "select a";
        let snapshot = TextSnapshot::new(r#"x = "select a";"#);
        let tags = HostTags::new([string(4, 14)]);
        let tagger = StringSqlTagger::new(Words);

        let out = tagger.tags(&snapshot, &tags, snapshot.full_range());
        assert_eq!(spans(&out), vec![(5, 11, false), (12, 13, false)]);
    }

    #[test]
    fn test_request_clips_but_lexes_whole_literal() {
        let snapshot = TextSnapshot::new(r#"x = "select a";"#);
        let tags = HostTags::new([string(4, 14)]);
        let tagger = StringSqlTagger::new(Words);

        let out = tagger.tags(&snapshot, &tags, SourceRange::from_bounds(8, 13));
        assert_eq!(spans(&out), vec![(8, 11, false), (12, 13, false)]);
    }

    #[test]
    fn test_unterminated_literal_keeps_tail() {
        let snapshot = TextSnapshot::new(r#"x = "select a"#);
        let tags = HostTags::new([string(4, 13)]);
        let tagger = StringSqlTagger::new(Words);

        let out = tagger.tags(&snapshot, &tags, snapshot.full_range());
        assert_eq!(spans(&out), vec![(5, 11, false), (12, 13, false)]);
    }

    #[test]
    fn test_empty_and_malformed_literals_are_reported() {
        // x = ""; y = "a\qb"; z = @@"c";
        let text = r#"x = ""; y = "a\qb"; z = @@"c";"#;
        let snapshot = TextSnapshot::new(text);
        let tags = HostTags::new([string(4, 6), string(12, 18), string(24, 29)]);
        let tagger = StringSqlTagger::new(Words);

        let report = tagger.tags_with_report(&snapshot, &tags, snapshot.full_range());
        assert!(report.tags.is_empty());
        assert_eq!(
            report.skipped,
            vec![
                (SourceRange::from_bounds(4, 6), LiteralError::EmptyAfterTrim),
                (
                    SourceRange::from_bounds(12, 18),
                    LiteralError::MalformedEscape { offset: 1 }
                ),
                (
                    SourceRange::from_bounds(24, 29),
                    LiteralError::MalformedLiteralHead
                ),
            ]
        );
    }

    #[test]
    fn test_unresolved_hole_is_recovered_and_still_highlighted() {
        // 0123456789012345
        // abcd}"select 1";
        let snapshot = TextSnapshot::new(r#"abcd}"select 1";"#);
        let tags = HostTags::new([
            HostTag::new(SourceRange::new(4, 1), HostTagKind::Punctuation),
            string(5, 15),
        ]);
        let tagger = StringSqlTagger::new(Words);

        let report = tagger.tags_with_report(&snapshot, &tags, snapshot.full_range());
        assert_eq!(spans(&report.tags), vec![(6, 12, false), (13, 14, false)]);
        assert!(report.skipped.is_empty());
        assert_eq!(
            report.recovered,
            vec![(
                SourceRange::from_bounds(5, 15),
                LiteralError::UnresolvableSplit
            )]
        );
    }

    #[test]
    fn test_disabled_default_and_no_strings() {
        let snapshot = TextSnapshot::new(r#"x = "select";"#);
        let tags = HostTags::new([string(4, 12)]);
        let tagger = StringSqlTagger::new(Words).with_config(HighlightConfig::new(false));
        assert!(tagger.tags(&snapshot, &tags, snapshot.full_range()).is_empty());

        let tagger = StringSqlTagger::new(Words);
        assert!(
            tagger
                .tags(&snapshot, &HostTags::default(), snapshot.full_range())
                .is_empty()
        );
        assert!(
            tagger
                .tags(&snapshot, &tags, SourceRange::new(100, 5))
                .is_empty()
        );
    }

    #[test]
    fn test_content_ranges_trim_each_end_once() {
        let snapshot = TextSnapshot::new(r#"$"ab{x}cd""#);
        let literal = LogicalLiteral {
            fragments: NormalizedRanges::from_ranges([
                SourceRange::from_bounds(0, 4),
                SourceRange::from_bounds(7, 10),
            ]),
            head: LiteralHead {
                kind: LiteralKind::INTERPOLATED,
                opening_len: 2,
                closing_len: 1,
            },
        };
        assert_eq!(
            literal.content_ranges(&snapshot).unwrap(),
            vec![SourceRange::from_bounds(2, 4), SourceRange::from_bounds(7, 9)]
        );
    }
}
