//! Enabled-region tracking from directive comments.
//!
//! Directives live in ordinary comments, matched case-insensitively against the trimmed comment
//! content:
//!
//! - `strpsql-on` / `strpsql-enable` / `strpsql-off` / `strpsql-disable` toggle the default for
//!   everything after the comment;
//! - `strpsql` / `strpsql-ignore` directly in front of a literal force it on / off.
//!
//! `PostgreSqlInAString` is accepted in place of `strpsql`, and any directive may be followed by
//! whitespace, `--` and free text.

use crate::range::{NormalizedRanges, SourceRange};
use crate::snapshot::{HostTagKind, HostTags, TextSnapshot};
use regex::Regex;
use std::sync::LazyLock;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:strpsql|PostgreSqlInAString)(?:-(on|off|enable|disable|ignore))?(?:$|\s+--)",
    )
    .expect("directive pattern is valid")
});

/// A parsed directive comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `-on` / `-enable`: highlighting is enabled after this comment.
    EnableRegion,
    /// `-off` / `-disable`: highlighting is disabled after this comment.
    DisableRegion,
    /// Bare marker: force-enable the literal right after the comment.
    InlineEnable,
    /// `-ignore`: force-disable the literal right after the comment.
    InlineDisable,
}

/// Parse trimmed comment content as a directive.
pub fn parse_directive(content: &str) -> Option<Directive> {
    let captures = DIRECTIVE.captures(content.trim())?;
    let Some(argument) = captures.get(1) else {
        return Some(Directive::InlineEnable);
    };
    match argument.as_str().to_ascii_lowercase().as_str() {
        "on" | "enable" => Some(Directive::EnableRegion),
        "off" | "disable" => Some(Directive::DisableRegion),
        "ignore" => Some(Directive::InlineDisable),
        _ => None,
    }
}

/// Locate the content of a comment, relative to the comment start.
///
/// `//` comments drop every leading `/`; block comments drop leading `*`s after `/*` and
/// trailing `*`s before `*/`. Returns `None` for unknown comment shapes or empty content.
pub fn comment_content(comment: &[u16]) -> Option<SourceRange> {
    let slash = u16::from(b'/');
    let star = u16::from(b'*');

    match comment {
        [a, b, ..] if *a == slash && *b == slash => {
            let start = (2..comment.len()).find(|&i| comment[i] != slash)?;
            Some(SourceRange::from_bounds(start, comment.len()))
        }
        [a, b, ..] if *a == slash && *b == star => {
            let start = (2..comment.len()).find(|&i| comment[i] != star)?;
            let terminated = comment.len() >= 4 && comment.ends_with(&[star, slash]);
            let body_end = if terminated {
                comment.len() - 2
            } else {
                comment.len()
            };
            let last = (start..body_end).rev().find(|&i| comment[i] != star)?;
            Some(SourceRange::from_bounds(start, last + 1))
        }
        _ => None,
    }
}

/// The directive held by the comment at `range`, if any.
pub fn directive_at(snapshot: &TextSnapshot, range: SourceRange) -> Option<Directive> {
    let content = comment_content(snapshot.slice(range))?;
    parse_directive(&snapshot.text(content.shifted(range.start)))
}

/// Buffer ranges in which highlighting is enabled by default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnabledRegions {
    ranges: NormalizedRanges,
}

impl EnabledRegions {
    /// Walk all comments before the end of `request` and collect the enabled regions.
    ///
    /// The state before the first directive is `enabled_by_default`. An enabling directive opens
    /// a region at the comment's end, a disabling one closes it at the comment's end; a region
    /// left open extends to the end of `request`.
    pub fn compute(
        snapshot: &TextSnapshot,
        tags: &HostTags,
        request: SourceRange,
        enabled_by_default: bool,
    ) -> Self {
        let scope = SourceRange::from_bounds(0, request.end());
        let comments = tags.ranges_of(HostTagKind::Comment, scope);

        let mut ranges = Vec::new();
        let mut open = enabled_by_default.then_some(0);

        for comment in &comments {
            match directive_at(snapshot, *comment) {
                Some(Directive::EnableRegion) => {
                    if open.is_none() {
                        open = Some(comment.end());
                    }
                }
                Some(Directive::DisableRegion) => {
                    if let Some(start) = open.take() {
                        ranges.push(SourceRange::from_bounds(start, comment.end()));
                    }
                }
                _ => {}
            }
        }

        if let Some(start) = open {
            ranges.push(SourceRange::from_bounds(start, request.end()));
        }

        Self {
            ranges: NormalizedRanges::from_ranges(ranges),
        }
    }

    /// The enabled ranges.
    pub fn ranges(&self) -> &NormalizedRanges {
        &self.ranges
    }

    /// Returns `true` if `range` overlaps an enabled region.
    pub fn is_enabled(&self, range: &SourceRange) -> bool {
        self.ranges.overlaps_with(range)
    }
}

/// Inline override for a literal whose opening delimiter starts at `literal_start`.
///
/// Only a comment ending right before the literal counts: `Some(true)` for a force-enable marker,
/// `Some(false)` for `-ignore`, `None` otherwise.
pub fn inline_override(
    snapshot: &TextSnapshot,
    tags: &HostTags,
    literal_start: usize,
) -> Option<bool> {
    let comment = tags.first_comment_at(literal_start.checked_sub(1)?)?;
    match directive_at(snapshot, comment)? {
        Directive::InlineEnable => Some(true),
        Directive::InlineDisable => Some(false),
        Directive::EnableRegion | Directive::DisableRegion => None,
    }
}
