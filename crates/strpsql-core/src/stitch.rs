//! Span stitching: reassemble host-reported string fragments into logical literals.
//!
//! Only interpolated literals span several fragments. Given `$"aaa{expr}ccc"` the host reports
//! `$"aaa` and `ccc"` as strings and the hole braces as punctuation; walking outward from either
//! fragment across punctuation-tagged braces recovers the other.

use crate::error::LiteralError;
use crate::range::{NormalizedRanges, SourceRange};
use crate::snapshot::{HostTagKind, HostTags, TextSnapshot};

/// Fragments of one logical literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stitched {
    /// Fragment ranges in buffer order; holes are excluded.
    pub fragments: NormalizedRanges,
    /// Set when a hole boundary could not be resolved and a fragment was taken as the edge.
    pub issue: Option<LiteralError>,
}

impl Stitched {
    /// The range from the first fragment's start to the last fragment's end.
    pub fn span(&self) -> Option<SourceRange> {
        self.fragments.span()
    }
}

enum Step {
    Edge,
    Fragment(SourceRange),
    Unresolvable,
}

struct Walker<'a> {
    snapshot: &'a TextSnapshot,
    tags: &'a HostTags,
}

impl Walker<'_> {
    fn is_hole_brace(&self, pos: usize, brace: u8) -> bool {
        self.snapshot.is_ascii_at(pos, brace)
            && self.tags.is_kind_at(pos, HostTagKind::Punctuation)
            && !self.tags.is_kind_at(pos, HostTagKind::StringLiteral)
    }

    /// Grow `range` over directly adjacent string-tagged spans on both sides.
    fn complete(&self, range: SourceRange) -> SourceRange {
        let start = self.extend_backward(range).start;
        let end = self.extend_forward(range).end();
        SourceRange::from_bounds(start, end)
    }

    fn extend_backward(&self, mut range: SourceRange) -> SourceRange {
        while range.start > 0 {
            match self.tags.previous_string_at(range.start - 1) {
                Some(prev) if prev.start < range.start => {
                    range = SourceRange::from_bounds(prev.start, range.end());
                }
                _ => break,
            }
        }
        range
    }

    fn extend_forward(&self, mut range: SourceRange) -> SourceRange {
        while range.end() < self.snapshot.len() {
            match self.tags.next_string_at(range.end()) {
                Some(next) if next.end() > range.end() => {
                    range = SourceRange::from_bounds(range.start, next.end());
                }
                _ => break,
            }
        }
        range
    }

    /// The fragment before the hole that ends right before `fragment`.
    fn step_backward(&self, fragment: SourceRange) -> Step {
        let mut position = fragment.start - 1;

        while self.is_hole_brace(position, b'}') {
            let mut nesting = 1;
            loop {
                // Room is needed for at least `$"{`.
                if position <= 2 {
                    return Step::Unresolvable;
                }
                position -= 1;
                if self.is_hole_brace(position, b'{') {
                    nesting -= 1;
                    if nesting == 0 {
                        break;
                    }
                } else if self.is_hole_brace(position, b'}') {
                    nesting += 1;
                }
            }

            position -= 1;
            if let Some(prev) = self.tags.previous_string_at(position) {
                return Step::Fragment(self.extend_backward(prev));
            }
            if !self.snapshot.is_ascii_at(position, b'}') {
                // A code block right before a plain literal, e.g. `{}"str"`.
                return Step::Edge;
            }
        }

        Step::Edge
    }

    /// The fragment after the hole that starts right after `fragment`.
    fn step_forward(&self, fragment: SourceRange) -> Step {
        let len = self.snapshot.len();
        let mut position = fragment.end();

        while self.is_hole_brace(position, b'{') {
            let mut nesting = 1;
            loop {
                // Room is needed for at least `}"`.
                if position + 2 >= len {
                    return Step::Unresolvable;
                }
                position += 1;
                if self.is_hole_brace(position, b'}') {
                    nesting -= 1;
                    if nesting == 0 {
                        break;
                    }
                } else if self.is_hole_brace(position, b'{') {
                    nesting += 1;
                }
            }

            position += 1;
            if let Some(next) = self.tags.next_string_at(position) {
                return Step::Fragment(self.extend_forward(next));
            }
            if !self.snapshot.is_ascii_at(position, b'{') {
                return Step::Edge;
            }
        }

        Step::Edge
    }
}

/// Stitch the logical literal containing the string fragment `seed`.
///
/// The seed is first completed with directly adjacent string spans, then the walk proceeds
/// backward and forward across interpolation holes independently. An unmatched hole brace stops
/// the walk on that side and is reported in [`Stitched::issue`].
pub fn stitch_literal(snapshot: &TextSnapshot, tags: &HostTags, seed: SourceRange) -> Stitched {
    let walker = Walker { snapshot, tags };
    let seed = walker.complete(seed);

    let mut fragments = vec![seed];
    let mut issue = None;

    let mut edge = seed;
    // Room is needed for at least `$"{}` before the fragment.
    while edge.start > 3 {
        match walker.step_backward(edge) {
            Step::Fragment(prev) => {
                fragments.push(prev);
                edge = prev;
            }
            Step::Edge => break,
            Step::Unresolvable => {
                issue = Some(LiteralError::UnresolvableSplit);
                break;
            }
        }
    }

    let mut edge = seed;
    // And for at least `{}"` after it.
    while edge.end() + 3 < snapshot.len() {
        match walker.step_forward(edge) {
            Step::Fragment(next) => {
                fragments.push(next);
                edge = next;
            }
            Step::Edge => break,
            Step::Unresolvable => {
                issue = Some(LiteralError::UnresolvableSplit);
                break;
            }
        }
    }

    if issue.is_some() {
        log::debug!("unresolvable interpolation hole next to string fragment {seed}");
    }

    Stitched {
        fragments: NormalizedRanges::from_ranges(fragments),
        issue,
    }
}

/// Stitch every logical literal with a string fragment overlapping `request`.
///
/// Each literal is returned once, in buffer order of its first fragment reached.
pub fn collect_literals(
    snapshot: &TextSnapshot,
    tags: &HostTags,
    request: SourceRange,
) -> Vec<Stitched> {
    let seeds = tags.ranges_of(HostTagKind::StringLiteral, request);
    let mut visited = NormalizedRanges::new();
    let mut literals = Vec::new();

    for seed in &seeds {
        if visited.contains(seed.start) {
            continue;
        }
        let literal = stitch_literal(snapshot, tags, *seed);
        visited = visited.union(&literal.fragments);
        literals.push(literal);
    }

    literals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::HostTag;
    use pretty_assertions::assert_eq;

    fn string(start: usize, end: usize) -> HostTag {
        HostTag::new(SourceRange::from_bounds(start, end), HostTagKind::StringLiteral)
    }

    fn punct(pos: usize) -> HostTag {
        HostTag::new(SourceRange::new(pos, 1), HostTagKind::Punctuation)
    }

    fn fragments(stitched: &Stitched) -> Vec<(usize, usize)> {
        stitched
            .fragments
            .iter()
            .map(|r| (r.start, r.end()))
            .collect()
    }

    #[test]
    fn test_single_hole_from_either_side() {
        // 0123456789012345678901
        // x = $"aaa{expr}ccc";
        let snapshot = TextSnapshot::new(r#"x = $"aaa{expr}ccc";"#);
        let tags = HostTags::new([
            string(4, 9),
            punct(9),
            punct(14),
            string(15, 19),
            punct(19),
        ]);

        for seed in [SourceRange::from_bounds(4, 9), SourceRange::from_bounds(15, 19)] {
            let stitched = stitch_literal(&snapshot, &tags, seed);
            assert_eq!(fragments(&stitched), vec![(4, 9), (15, 19)]);
            assert_eq!(stitched.issue, None);
        }
    }

    #[test]
    fn test_adjacent_holes() {
        // $"a{1}{2}b"
        let snapshot = TextSnapshot::new(r#"$"a{1}{2}b""#);
        let tags = HostTags::new([
            string(0, 3),
            punct(3),
            punct(5),
            punct(6),
            punct(8),
            string(9, 11),
        ]);

        let stitched = stitch_literal(&snapshot, &tags, SourceRange::from_bounds(9, 11));
        assert_eq!(fragments(&stitched), vec![(0, 3), (9, 11)]);
    }

    #[test]
    fn test_nested_braces_inside_hole() {
        // $"a{new[]{1}}b"
        let snapshot = TextSnapshot::new(r#"$"a{new[]{1}}b""#);
        let tags = HostTags::new([
            string(0, 3),
            punct(3),
            punct(7),
            punct(8),
            punct(9),
            punct(11),
            punct(12),
            string(13, 15),
        ]);

        let backward = stitch_literal(&snapshot, &tags, SourceRange::from_bounds(13, 15));
        assert_eq!(fragments(&backward), vec![(0, 3), (13, 15)]);
        let forward = stitch_literal(&snapshot, &tags, SourceRange::from_bounds(0, 3));
        assert_eq!(fragments(&forward), vec![(0, 3), (13, 15)]);
    }

    #[test]
    fn test_code_block_before_literal_is_an_edge() {
        let snapshot = TextSnapshot::new(r#"x = {}"str""#);
        let tags = HostTags::new([punct(4), punct(5), string(6, 11)]);

        let stitched = stitch_literal(&snapshot, &tags, SourceRange::from_bounds(6, 11));
        assert_eq!(fragments(&stitched), vec![(6, 11)]);
        assert_eq!(stitched.issue, None);
    }

    #[test]
    fn test_unmatched_brace_keeps_fragment_as_edge() {
        let snapshot = TextSnapshot::new(r#"abcd}"ef""#);
        let tags = HostTags::new([punct(4), string(5, 9)]);

        let stitched = stitch_literal(&snapshot, &tags, SourceRange::from_bounds(5, 9));
        assert_eq!(fragments(&stitched), vec![(5, 9)]);
        assert_eq!(stitched.issue, Some(LiteralError::UnresolvableSplit));
    }

    #[test]
    fn test_string_tagged_braces_are_not_holes() {
        // $"a}}b{{c" with the doubled braces reported as string content.
        let snapshot = TextSnapshot::new(r#"x = $"a}}b{{c";"#);
        let tags = HostTags::new([
            string(4, 6),
            string(6, 8),
            string(8, 9),
            string(9, 11),
            string(11, 14),
        ]);

        let stitched = stitch_literal(&snapshot, &tags, SourceRange::from_bounds(8, 9));
        assert_eq!(fragments(&stitched), vec![(4, 14)]);
    }

    #[test]
    fn test_adjacent_fragments_are_completed() {
        // @$"stuff" reported as `@$"`, `stuff`, `"`.
        let snapshot = TextSnapshot::new(r#"@$"stuff""#);
        let tags = HostTags::new([string(0, 3), string(3, 8), string(8, 9)]);

        let stitched = stitch_literal(&snapshot, &tags, SourceRange::from_bounds(3, 8));
        assert_eq!(fragments(&stitched), vec![(0, 9)]);
    }

    #[test]
    fn test_chained_fragments_past_a_hole_are_absorbed() {
        // $"a{x}bc" reported as `$"`, `a`, hole, `bc`, `"`.
        let snapshot = TextSnapshot::new(r#"$"a{x}bc""#);
        let tags = HostTags::new([
            string(0, 2),
            string(2, 3),
            punct(3),
            punct(5),
            string(6, 8),
            string(8, 9),
        ]);

        for seed in [SourceRange::from_bounds(0, 2), SourceRange::from_bounds(8, 9)] {
            let stitched = stitch_literal(&snapshot, &tags, seed);
            assert_eq!(fragments(&stitched), vec![(0, 3), (6, 9)]);
            assert_eq!(stitched.issue, None);
        }
    }

    #[test]
    fn test_collect_literals_visits_each_literal_once() {
        let snapshot = TextSnapshot::new(r#"x = $"aaa{expr}ccc"; y = "z";"#);
        let tags = HostTags::new([
            string(4, 9),
            punct(9),
            punct(14),
            string(15, 19),
            punct(19),
            string(25, 28),
            punct(28),
        ]);

        let literals = collect_literals(&snapshot, &tags, snapshot.full_range());
        let all: Vec<_> = literals.iter().map(fragments).collect();
        assert_eq!(all, vec![vec![(4, 9), (15, 19)], vec![(25, 28)]]);

        let partial = collect_literals(&snapshot, &tags, SourceRange::from_bounds(16, 17));
        assert_eq!(partial.len(), 1);
        assert_eq!(fragments(&partial[0]), vec![(4, 9), (15, 19)]);
    }
}
