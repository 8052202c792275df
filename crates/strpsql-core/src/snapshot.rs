//! Immutable buffer snapshots and the pre-fetched host classification index.
//!
//! The host editor classifies raw lexical spans (comments, punctuation, strings). Rather than
//! calling back into the host while tagging, callers collect those spans up front into a
//! [`HostTags`] index and hand it to the tagger together with the [`TextSnapshot`] they were
//! computed for.

use crate::range::{NormalizedRanges, SourceRange};

/// An immutable, versioned snapshot of a text buffer, stored as UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSnapshot {
    units: Vec<u16>,
    version: u64,
}

impl TextSnapshot {
    /// Create a snapshot (version 0) from UTF-8 text.
    pub fn new(text: &str) -> Self {
        Self {
            units: text.encode_utf16().collect(),
            version: 0,
        }
    }

    /// Create a snapshot from raw UTF-16 code units (lone surrogates allowed).
    pub fn from_utf16(units: Vec<u16>) -> Self {
        Self { units, version: 0 }
    }

    /// Set the snapshot version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// The snapshot version supplied by the host.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The code unit at `pos`.
    pub fn unit(&self, pos: usize) -> Option<u16> {
        self.units.get(pos).copied()
    }

    /// Returns `true` if the code unit at `pos` is the ASCII character `ch`.
    pub fn is_ascii_at(&self, pos: usize, ch: u8) -> bool {
        self.unit(pos) == Some(u16::from(ch))
    }

    /// All code units.
    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// The code units covered by `range`, clamped to the snapshot.
    pub fn slice(&self, range: SourceRange) -> &[u16] {
        let start = range.start.min(self.units.len());
        let end = range.end().min(self.units.len());
        &self.units[start..end]
    }

    /// The text covered by `range` (lone surrogates become U+FFFD).
    pub fn text(&self, range: SourceRange) -> String {
        String::from_utf16_lossy(self.slice(range))
    }

    /// A range covering the whole snapshot.
    pub fn full_range(&self) -> SourceRange {
        SourceRange::new(0, self.units.len())
    }
}

/// The lexical classification the host assigned to a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostTagKind {
    /// Single-line or block comment (documentation comments excluded).
    Comment,
    /// Punctuation, including the braces delimiting interpolation holes.
    Punctuation,
    /// Any string-like span: string content, verbatim string, string escape character.
    StringLiteral,
}

/// A host-classified span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostTag {
    /// The classified range.
    pub range: SourceRange,
    /// The classification.
    pub kind: HostTagKind,
}

impl HostTag {
    /// Create a host tag.
    pub fn new(range: SourceRange, kind: HostTagKind) -> Self {
        Self { range, kind }
    }
}

/// A pre-fetched, snapshot-consistent index of host tags.
///
/// Tags are kept sorted by start offset with a prefix maximum of end offsets, so range queries
/// only scan candidates that can still reach the query start.
#[derive(Debug, Clone, Default)]
pub struct HostTags {
    tags: Vec<HostTag>,
    prefix_max_end: Vec<usize>,
}

impl HostTags {
    /// Build an index from tags in any order. Empty tags are dropped.
    pub fn new(tags: impl IntoIterator<Item = HostTag>) -> Self {
        let mut tags: Vec<HostTag> = tags.into_iter().filter(|t| !t.range.is_empty()).collect();
        tags.sort_by_key(|t| (t.range.start, t.range.end()));

        let mut prefix_max_end = Vec::with_capacity(tags.len());
        let mut max_end = 0;
        for tag in &tags {
            max_end = max_end.max(tag.range.end());
            prefix_max_end.push(max_end);
        }

        Self {
            tags,
            prefix_max_end,
        }
    }

    /// Number of tags in the index.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if the index holds no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// All tags, sorted by start offset.
    pub fn iter(&self) -> std::slice::Iter<'_, HostTag> {
        self.tags.iter()
    }

    /// All tags overlapping `range`, in start order.
    ///
    /// An empty `range` matches tags containing its start position.
    pub fn query(&self, range: SourceRange) -> Vec<HostTag> {
        let probe = if range.is_empty() {
            SourceRange::new(range.start, 1)
        } else {
            range
        };

        let search_end = self.tags.partition_point(|t| t.range.start < probe.end());
        if search_end == 0 {
            return Vec::new();
        }

        let mut scan_start = self
            .tags
            .partition_point(|t| t.range.start < probe.start)
            .min(search_end);
        while scan_start > 0 && self.prefix_max_end[scan_start - 1] > probe.start {
            scan_start -= 1;
        }

        self.tags[scan_start..search_end]
            .iter()
            .filter(|t| t.range.overlaps(&probe))
            .copied()
            .collect()
    }

    /// All tags covering the code unit at `pos`.
    pub fn at(&self, pos: usize) -> Vec<HostTag> {
        self.query(SourceRange::new(pos, 1))
    }

    /// Returns `true` if the code unit at `pos` is covered by a tag of `kind`.
    pub fn is_kind_at(&self, pos: usize, kind: HostTagKind) -> bool {
        self.at(pos).iter().any(|t| t.kind == kind)
    }

    /// Normalized union of all ranges of `kind` overlapping `range`.
    pub fn ranges_of(&self, kind: HostTagKind, range: SourceRange) -> NormalizedRanges {
        self.query(range)
            .into_iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.range)
            .collect()
    }

    /// The string span at `pos` reaching furthest forward from its earliest start.
    ///
    /// Used when walking forward: of the string tags covering `pos`, the one starting first.
    pub fn next_string_at(&self, pos: usize) -> Option<SourceRange> {
        self.at(pos)
            .into_iter()
            .filter(|t| t.kind == HostTagKind::StringLiteral && t.range.end() > pos)
            .min_by_key(|t| t.range.start)
            .map(|t| t.range)
    }

    /// Used when walking backward: of the string tags covering `pos`, the one ending last.
    pub fn previous_string_at(&self, pos: usize) -> Option<SourceRange> {
        self.at(pos)
            .into_iter()
            .filter(|t| t.kind == HostTagKind::StringLiteral && t.range.start <= pos)
            .max_by_key(|t| t.range.end())
            .map(|t| t.range)
    }

    /// The first comment tag covering `pos`.
    pub fn first_comment_at(&self, pos: usize) -> Option<SourceRange> {
        self.at(pos)
            .into_iter()
            .find(|t| t.kind == HostTagKind::Comment)
            .map(|t| t.range)
    }
}

impl FromIterator<HostTag> for HostTags {
    fn from_iter<T: IntoIterator<Item = HostTag>>(iter: T) -> Self {
        HostTags::new(iter)
    }
}
