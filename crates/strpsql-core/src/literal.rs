//! Literal kinds and the literal-head classifier.
//!
//! The classifier reads the opening characters of a literal (prefix markers followed by a run
//! of `"`) and reports the literal kind together with its delimiter lengths. Prefix markers are
//! described by a [`DelimiterStyle`] table, so supporting another literal style means adding a
//! table entry rather than a branch.

use crate::error::LiteralError;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Literal kind flags.
///
/// `VERBATIM`, `INTERPOLATED` and `RAW` each imply `QUOTED` and combine freely
/// (`$@"..."` is `VERBATIM | INTERPOLATED`). `UNKNOWN` (no bits) means the literal head was not
/// recognized.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LiteralKind(u8);

impl LiteralKind {
    /// Not a recognized literal head.
    pub const UNKNOWN: Self = Self(0);
    /// A plain `"..."` literal.
    pub const QUOTED: Self = Self(0b0001);
    /// `@"..."`: no backslash escapes, `""` stands for `"`.
    pub const VERBATIM: Self = Self(0b0011);
    /// `$"..."`: `{expr}` holes, `{{` / `}}` stand for braces.
    pub const INTERPOLATED: Self = Self(0b0101);
    /// `"""..."""`: no escapes at all.
    pub const RAW: Self = Self(0b1001);

    /// Raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: LiteralKind) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` for [`LiteralKind::UNKNOWN`].
    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for LiteralKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LiteralKind {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("Unknown");
        }
        let mut names = vec!["Quoted"];
        if self.contains(Self::VERBATIM) {
            names.push("Verbatim");
        }
        if self.contains(Self::INTERPOLATED) {
            names.push("Interpolated");
        }
        if self.contains(Self::RAW) {
            names.push("Raw");
        }
        f.write_str(&names.join(" | "))
    }
}

/// A prefix marker that may precede the opening quote(s) of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMarker {
    /// The marker character (e.g. `@`).
    pub marker: char,
    /// The kind flag it contributes.
    pub kind: LiteralKind,
    /// Whether a run of this marker (`$$`) is allowed in front of a raw literal.
    pub repeatable_for_raw: bool,
}

/// Data describing which literal heads a host language accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterStyle {
    /// Accepted prefix markers.
    pub prefixes: Vec<PrefixMarker>,
    /// Minimum run of opening quotes that makes a raw literal, or `None` if raw literals are not
    /// supported.
    pub raw_min_quotes: Option<usize>,
}

impl DelimiterStyle {
    /// C# 11 literal heads: `@`, `$` and raw `"""` literals.
    pub fn csharp() -> Self {
        Self {
            prefixes: vec![
                PrefixMarker {
                    marker: '@',
                    kind: LiteralKind::VERBATIM,
                    repeatable_for_raw: false,
                },
                PrefixMarker {
                    marker: '$',
                    kind: LiteralKind::INTERPOLATED,
                    repeatable_for_raw: true,
                },
            ],
            raw_min_quotes: Some(3),
        }
    }

    /// Pre-C# 11 literal heads (no raw literals).
    pub fn csharp_legacy() -> Self {
        Self {
            raw_min_quotes: None,
            ..Self::csharp()
        }
    }
}

/// The result of classifying a literal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralHead {
    /// The literal kind (never `UNKNOWN`).
    pub kind: LiteralKind,
    /// Length of the opening delimiter, prefix markers included.
    pub opening_len: usize,
    /// Length of the closing delimiter.
    pub closing_len: usize,
}

/// Classifies literal heads according to a [`DelimiterStyle`].
#[derive(Debug, Clone)]
pub struct LiteralClassifier {
    style: DelimiterStyle,
}

impl Default for LiteralClassifier {
    fn default() -> Self {
        Self::csharp()
    }
}

impl LiteralClassifier {
    /// Create a classifier for a custom delimiter style.
    pub fn new(style: DelimiterStyle) -> Self {
        Self { style }
    }

    /// Classifier for current C# (raw literals supported).
    pub fn csharp() -> Self {
        Self::new(DelimiterStyle::csharp())
    }

    /// Classifier for C# without raw literals.
    pub fn legacy() -> Self {
        Self::new(DelimiterStyle::csharp_legacy())
    }

    /// The delimiter style in use.
    pub fn style(&self) -> &DelimiterStyle {
        &self.style
    }

    /// Classify the opening fragment of a literal.
    pub fn classify(&self, text: &[u16]) -> Result<LiteralHead, LiteralError> {
        let mut kind = LiteralKind::QUOTED;
        let mut seen = vec![0usize; self.style.prefixes.len()];
        let mut pos = 0;

        while let Some(&unit) = text.get(pos) {
            if unit == u16::from(b'"') {
                break;
            }
            let Some(idx) = self
                .style
                .prefixes
                .iter()
                .position(|p| u32::from(unit) == u32::from(p.marker))
            else {
                return Err(LiteralError::MalformedLiteralHead);
            };
            seen[idx] += 1;
            if seen[idx] > 1 && !self.style.prefixes[idx].repeatable_for_raw {
                return Err(LiteralError::MalformedLiteralHead);
            }
            kind |= self.style.prefixes[idx].kind;
            pos += 1;
        }

        let quotes = text[pos..]
            .iter()
            .take_while(|&&u| u == u16::from(b'"'))
            .count();
        if quotes == 0 {
            return Err(LiteralError::MalformedLiteralHead);
        }

        let repeated_marker = seen.iter().any(|&count| count > 1);
        let is_raw = self
            .style
            .raw_min_quotes
            .is_some_and(|min| quotes >= min && !kind.contains(LiteralKind::VERBATIM));

        if is_raw {
            return Ok(LiteralHead {
                kind: kind | LiteralKind::RAW,
                opening_len: pos + quotes,
                closing_len: quotes,
            });
        }

        if repeated_marker {
            // `$$` only introduces raw literals.
            return Err(LiteralError::MalformedLiteralHead);
        }

        Ok(LiteralHead {
            kind,
            opening_len: pos + 1,
            closing_len: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Result<LiteralHead, LiteralError> {
        let units: Vec<u16> = text.encode_utf16().collect();
        LiteralClassifier::csharp().classify(&units)
    }

    #[test]
    fn test_plain_and_prefixed_heads() {
        let head = classify("\"select 1\"").unwrap();
        assert_eq!(head.kind, LiteralKind::QUOTED);
        assert_eq!((head.opening_len, head.closing_len), (1, 1));

        let head = classify("$@\"x\"").unwrap();
        assert_eq!(head.kind, LiteralKind::VERBATIM | LiteralKind::INTERPOLATED);
        assert_eq!(head.opening_len, 3);

        let head = classify("@$\"x\"").unwrap();
        assert!(head.kind.contains(LiteralKind::VERBATIM));
        assert!(head.kind.contains(LiteralKind::INTERPOLATED));
        assert!(!head.kind.contains(LiteralKind::RAW));
    }

    #[test]
    fn test_raw_heads() {
        let head = classify("\"\"\"\"text\"\"\"\"").unwrap();
        assert_eq!(head.kind, LiteralKind::RAW);
        assert_eq!((head.opening_len, head.closing_len), (4, 4));

        let head = classify("$$\"\"\"{{x}}\"\"\"").unwrap();
        assert_eq!(head.kind, LiteralKind::RAW | LiteralKind::INTERPOLATED);
        assert_eq!((head.opening_len, head.closing_len), (5, 3));
    }

    #[test]
    fn test_empty_string_is_quoted_not_raw() {
        let head = classify("\"\"").unwrap();
        assert_eq!(head.kind, LiteralKind::QUOTED);
        assert_eq!(head.opening_len, 1);
    }

    #[test]
    fn test_verbatim_with_leading_escaped_quote_is_not_raw() {
        let head = classify("@\"\"\"a\"").unwrap();
        assert_eq!(head.kind, LiteralKind::VERBATIM);
        assert_eq!((head.opening_len, head.closing_len), (2, 1));
    }

    #[test]
    fn test_malformed_heads() {
        assert_eq!(classify("@@\"x\""), Err(LiteralError::MalformedLiteralHead));
        assert_eq!(classify("$$\"x\""), Err(LiteralError::MalformedLiteralHead));
        assert_eq!(classify("x\"a\""), Err(LiteralError::MalformedLiteralHead));
        assert_eq!(classify("'a'"), Err(LiteralError::MalformedLiteralHead));
        assert_eq!(classify("$@"), Err(LiteralError::MalformedLiteralHead));
        assert_eq!(classify(""), Err(LiteralError::MalformedLiteralHead));
    }

    #[test]
    fn test_legacy_classifier_has_no_raw_literals() {
        let units: Vec<u16> = "\"\"\"a\"\"\"".encode_utf16().collect();
        let head = LiteralClassifier::legacy().classify(&units).unwrap();
        assert_eq!(head.kind, LiteralKind::QUOTED);
        assert_eq!(head.opening_len, 1);
    }
}
