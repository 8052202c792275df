//! Source ranges and normalized range sets.
//!
//! Offsets are UTF-16 code units into a [`TextSnapshot`](crate::TextSnapshot). A
//! [`NormalizedRanges`] value is always sorted, free of empty ranges, and has overlapping or
//! abutting ranges merged, so set algebra (`union` / `overlap` / `difference`) is a linear merge.

use std::fmt;

/// A half-open range `[start, start + len)` into a text snapshot (UTF-16 code units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourceRange {
    /// Start offset (inclusive).
    pub start: usize,
    /// Length in code units.
    pub len: usize,
}

impl SourceRange {
    /// Create a range from a start offset and a length.
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Create a range from `[start, end)` bounds. `end < start` yields an empty range at `start`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start,
            len: end.saturating_sub(start),
        }
    }

    /// End offset (exclusive).
    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    /// Returns `true` if the range covers no code units.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the range contains a specific position.
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end()
    }

    /// Check if two ranges share at least one code unit.
    ///
    /// Empty ranges never overlap anything.
    pub fn overlaps(&self, other: &SourceRange) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start < other.end()
            && other.start < self.end()
    }

    /// The non-empty intersection of two ranges, if any.
    pub fn intersection(&self, other: &SourceRange) -> Option<SourceRange> {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        (start < end).then(|| SourceRange::from_bounds(start, end))
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    pub fn covers(&self, other: &SourceRange) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// Shift the range right by `delta` code units.
    pub fn shifted(self, delta: usize) -> SourceRange {
        SourceRange::new(self.start + delta, self.len)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl From<std::ops::Range<usize>> for SourceRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        SourceRange::from_bounds(range.start, range.end)
    }
}

/// A normalized set of ranges: sorted, non-empty, non-overlapping, non-abutting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedRanges {
    ranges: Vec<SourceRange>,
}

impl NormalizedRanges {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// A set holding a single range (empty if `range` is empty).
    pub fn single(range: SourceRange) -> Self {
        Self::from_ranges(std::iter::once(range))
    }

    /// Normalize an arbitrary collection of ranges.
    pub fn from_ranges(ranges: impl IntoIterator<Item = SourceRange>) -> Self {
        let mut ranges: Vec<SourceRange> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
        ranges.sort_unstable_by_key(|r| (r.start, r.len));

        let mut merged: Vec<SourceRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end() => {
                    let end = last.end().max(range.end());
                    *last = SourceRange::from_bounds(last.start, end);
                }
                _ => merged.push(range),
            }
        }

        Self { ranges: merged }
    }

    /// Number of ranges in the set.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns `true` if the set holds no ranges.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterate over the ranges in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, SourceRange> {
        self.ranges.iter()
    }

    /// The ranges as a slice.
    pub fn as_slice(&self) -> &[SourceRange] {
        &self.ranges
    }

    /// First range, if any.
    pub fn first(&self) -> Option<SourceRange> {
        self.ranges.first().copied()
    }

    /// Last range, if any.
    pub fn last(&self) -> Option<SourceRange> {
        self.ranges.last().copied()
    }

    /// The smallest single range covering the whole set.
    pub fn span(&self) -> Option<SourceRange> {
        let first = self.ranges.first()?;
        let last = self.ranges.last()?;
        Some(SourceRange::from_bounds(first.start, last.end()))
    }

    /// Set union.
    pub fn union(&self, other: &NormalizedRanges) -> NormalizedRanges {
        NormalizedRanges::from_ranges(self.ranges.iter().chain(other.ranges.iter()).copied())
    }

    /// Add a range to the set in place.
    pub fn insert(&mut self, range: SourceRange) {
        if range.is_empty() {
            return;
        }
        let ranges = std::mem::take(&mut self.ranges);
        *self = NormalizedRanges::from_ranges(ranges.into_iter().chain(std::iter::once(range)));
    }

    /// Set intersection. Never yields empty ranges.
    pub fn overlap(&self, other: &NormalizedRanges) -> NormalizedRanges {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = self.ranges[i];
            let b = other.ranges[j];
            if let Some(common) = a.intersection(&b) {
                result.push(common);
            }
            if a.end() <= b.end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self { ranges: result }
    }

    /// Ranges of `self` not covered by `other`. Never yields empty ranges.
    pub fn difference(&self, other: &NormalizedRanges) -> NormalizedRanges {
        let mut result = Vec::new();
        let mut j = 0;
        for range in &self.ranges {
            let mut cursor = range.start;
            while j < other.ranges.len() && other.ranges[j].end() <= cursor {
                j += 1;
            }
            let mut k = j;
            while k < other.ranges.len() && other.ranges[k].start < range.end() {
                let hole = other.ranges[k];
                if hole.start > cursor {
                    result.push(SourceRange::from_bounds(cursor, hole.start));
                }
                cursor = cursor.max(hole.end());
                k += 1;
            }
            if cursor < range.end() {
                result.push(SourceRange::from_bounds(cursor, range.end()));
            }
        }
        Self { ranges: result }
    }

    /// Returns `true` if any range in the set shares a code unit with `range`.
    pub fn overlaps_with(&self, range: &SourceRange) -> bool {
        let idx = self.ranges.partition_point(|r| r.end() <= range.start);
        self.ranges.get(idx).is_some_and(|r| r.overlaps(range))
    }

    /// Returns `true` if `pos` lies inside any range of the set.
    pub fn contains(&self, pos: usize) -> bool {
        let idx = self.ranges.partition_point(|r| r.end() <= pos);
        self.ranges.get(idx).is_some_and(|r| r.contains(pos))
    }

    /// The range containing `pos`, if any.
    pub fn range_at(&self, pos: usize) -> Option<SourceRange> {
        let idx = self.ranges.partition_point(|r| r.end() <= pos);
        self.ranges.get(idx).copied().filter(|r| r.contains(pos))
    }
}

impl FromIterator<SourceRange> for NormalizedRanges {
    fn from_iter<T: IntoIterator<Item = SourceRange>>(iter: T) -> Self {
        NormalizedRanges::from_ranges(iter)
    }
}

impl<'a> IntoIterator for &'a NormalizedRanges {
    type Item = &'a SourceRange;
    type IntoIter = std::slice::Iter<'a, SourceRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
