#![warn(missing_docs)]
//! `strpsql-csharp` - a small C# lexical classifier producing host tags for `strpsql-core`.
//!
//! Editors hand `strpsql-core` their own classification. This crate stands in for it when there
//! is no editor around (the CLI, tests, benches) and reports the same shapes an editor does:
//!
//! - `//` and `/* */` comments (`///` documentation comments are not reported);
//! - string literals, split into fragments at interpolation holes;
//! - hole braces and bracket/separator punctuation.
//!
//! Code inside holes is classified like any other code, so literals nested in holes get their
//! own tags. Character literals are skipped.

use strpsql_core::{HostTag, HostTagKind, HostTags, SourceRange, TextSnapshot};

const PUNCTUATION: &[u8] = b"{}()[];,.:";

/// Classify a C# source snapshot.
pub fn classify(snapshot: &TextSnapshot) -> HostTags {
    let mut scanner = Scanner {
        units: snapshot.units(),
        tags: Vec::new(),
    };
    scanner.code(0, false);
    HostTags::new(scanner.tags)
}

struct Scanner<'a> {
    units: &'a [u16],
    tags: Vec<HostTag>,
}

impl Scanner<'_> {
    fn is(&self, pos: usize, ch: u8) -> bool {
        self.units.get(pos) == Some(&u16::from(ch))
    }

    fn run_of(&self, pos: usize, ch: u8) -> usize {
        self.units[pos.min(self.units.len())..]
            .iter()
            .take_while(|&&u| u == u16::from(ch))
            .count()
    }

    fn is_line_break(&self, pos: usize) -> bool {
        self.is(pos, b'\n') || self.is(pos, b'\r')
    }

    fn push(&mut self, start: usize, end: usize, kind: HostTagKind) {
        self.tags
            .push(HostTag::new(SourceRange::from_bounds(start, end), kind));
    }

    fn punct(&mut self, pos: usize) {
        self.push(pos, pos + 1, HostTagKind::Punctuation);
    }

    /// Classify code from `pos`. Inside a hole, stops at the `}` closing it and returns its
    /// position; otherwise runs to the end.
    fn code(&mut self, mut pos: usize, in_hole: bool) -> usize {
        let len = self.units.len();
        let mut depth = 0usize;

        while pos < len {
            if self.is(pos, b'/') && self.is(pos + 1, b'/') {
                let end = (pos..len)
                    .find(|&i| self.is_line_break(i))
                    .unwrap_or(len);
                let doc = self.is(pos + 2, b'/') && !self.is(pos + 3, b'/');
                if !doc {
                    self.push(pos, end, HostTagKind::Comment);
                }
                pos = end;
            } else if self.is(pos, b'/') && self.is(pos + 1, b'*') {
                let end = (pos + 2..len.saturating_sub(1))
                    .find(|&i| self.is(i, b'*') && self.is(i + 1, b'/'))
                    .map_or(len, |i| i + 2);
                self.push(pos, end, HostTagKind::Comment);
                pos = end;
            } else if self.is(pos, b'\'') {
                pos = self.char_literal_end(pos);
            } else if let Some(end) = self.string(pos) {
                pos = end;
            } else if self.is(pos, b'{') {
                self.punct(pos);
                depth += 1;
                pos += 1;
            } else if self.is(pos, b'}') {
                if depth == 0 && in_hole {
                    return pos;
                }
                self.punct(pos);
                depth = depth.saturating_sub(1);
                pos += 1;
            } else {
                if u8::try_from(self.units[pos]).is_ok_and(|b| PUNCTUATION.contains(&b)) {
                    self.punct(pos);
                }
                pos += 1;
            }
        }

        len
    }

    fn char_literal_end(&self, start: usize) -> usize {
        let mut pos = start + 1;
        while pos < self.units.len() {
            if self.is(pos, b'\\') {
                pos += 2;
            } else if self.is(pos, b'\'') {
                return pos + 1;
            } else if self.is_line_break(pos) {
                return pos;
            } else {
                pos += 1;
            }
        }
        self.units.len()
    }

    /// If a string literal starts at `start`, tag it and return its end.
    fn string(&mut self, start: usize) -> Option<usize> {
        let mut pos = start;
        let mut dollars = 0;
        let mut verbatim = false;

        loop {
            if self.is(pos, b'$') {
                dollars += 1;
            } else if self.is(pos, b'@') && !verbatim {
                verbatim = true;
            } else {
                break;
            }
            pos += 1;
        }

        let quotes = self.run_of(pos, b'"');
        if quotes == 0 {
            return None;
        }

        if quotes >= 3 && !verbatim {
            return Some(self.raw_string(start, pos + quotes, quotes, dollars));
        }
        Some(self.quoted_string(start, pos + 1, verbatim, dollars > 0))
    }

    fn quoted_string(
        &mut self,
        start: usize,
        body: usize,
        verbatim: bool,
        interpolated: bool,
    ) -> usize {
        let len = self.units.len();
        let mut fragment_start = start;
        let mut pos = body;

        while pos < len {
            if !verbatim && self.is_line_break(pos) {
                break;
            }
            if !verbatim && self.is(pos, b'\\') {
                pos = (pos + 2).min(len);
            } else if self.is(pos, b'"') {
                if verbatim && self.is(pos + 1, b'"') {
                    pos += 2;
                    continue;
                }
                self.push(fragment_start, pos + 1, HostTagKind::StringLiteral);
                return pos + 1;
            } else if interpolated && self.is(pos, b'{') {
                if self.is(pos + 1, b'{') {
                    pos += 2;
                    continue;
                }
                self.push(fragment_start, pos, HostTagKind::StringLiteral);
                self.punct(pos);
                let close = self.code(pos + 1, true);
                if close >= len {
                    return len;
                }
                self.punct(close);
                pos = close + 1;
                fragment_start = pos;
            } else if interpolated && self.is(pos, b'}') && self.is(pos + 1, b'}') {
                pos += 2;
            } else {
                pos += 1;
            }
        }

        self.push(fragment_start, pos, HostTagKind::StringLiteral);
        pos
    }

    /// Raw literals: `quotes` closes the literal, and with `dollars` > 0 a run of that many
    /// braces opens a hole (shorter runs are content).
    fn raw_string(&mut self, start: usize, body: usize, quotes: usize, dollars: usize) -> usize {
        let len = self.units.len();
        let mut fragment_start = start;
        let mut pos = body;

        while pos < len {
            if self.is(pos, b'"') {
                let run = self.run_of(pos, b'"');
                if run >= quotes {
                    let end = pos + run;
                    self.push(fragment_start, end, HostTagKind::StringLiteral);
                    return end;
                }
                pos += run;
            } else if dollars > 0 && self.is(pos, b'{') {
                let run = self.run_of(pos, b'{');
                if run < dollars {
                    pos += run;
                    continue;
                }
                let open = pos + run - dollars;
                self.push(fragment_start, open, HostTagKind::StringLiteral);
                for brace in open..pos + run {
                    self.punct(brace);
                }
                let close = self.code(pos + run, true);
                if close >= len {
                    return len;
                }
                let closing = self.run_of(close, b'}').min(dollars);
                for brace in close..close + closing {
                    self.punct(brace);
                }
                pos = close + closing;
                fragment_start = pos;
            } else {
                pos += 1;
            }
        }

        self.push(fragment_start, len, HostTagKind::StringLiteral);
        len
    }
}
