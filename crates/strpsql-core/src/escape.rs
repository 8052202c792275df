//! Escape codec: turns literal content into canonical text plus an offset-correction table.
//!
//! Offsets on the original side are UTF-16 code units relative to the start of the literal
//! content. Offsets on the canonical side are `char`s, which is how the SQL lexer counts.
//!
//! Every place where the two sides do not advance one-for-one gets a [`Correction`]:
//! escape sequences (`\n`, `\u0041`, `""`, `{{`, ...) and surrogate pairs (two code units, one
//! `char`). Translating a canonical offset `c` walks the sorted corrections and adds `skip` for
//! each one starting before the running original offset.

use crate::error::LiteralError;
use crate::literal::LiteralKind;
use crate::range::{NormalizedRanges, SourceRange};

const BACKSLASH: u16 = b'\\' as u16;
const QUOTE: u16 = b'"' as u16;
const OPEN_BRACE: u16 = b'{' as u16;
const CLOSE_BRACE: u16 = b'}' as u16;

/// One place where original and canonical offsets diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Correction {
    /// Original offset (relative to the literal content) where the divergence starts.
    pub index: usize,
    /// Number of original code units forming the escape; `0` for surrogate-pair markers, which
    /// are not escapes and are never tagged as such.
    pub escaped_len: usize,
    /// Original code units consumed beyond one per canonical `char`.
    pub skip: usize,
}

impl Correction {
    /// Returns `true` for a real escape sequence (as opposed to a surrogate-pair marker).
    pub fn is_escape(&self) -> bool {
        self.escaped_len > 0
    }

    /// The original range covered by the escape (empty for surrogate-pair markers).
    pub fn range(&self) -> SourceRange {
        SourceRange::new(self.index, self.escaped_len)
    }
}

/// Canonical literal text together with its correction table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unescaped {
    text: String,
    corrections: Vec<Correction>,
}

impl Unescaped {
    /// The canonical text handed to the SQL lexer.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Corrections, sorted by `index`.
    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    /// Consume into `(text, corrections)`.
    pub fn into_parts(self) -> (String, Vec<Correction>) {
        (self.text, self.corrections)
    }

    /// Translate a canonical `char` offset into an original code-unit offset.
    pub fn to_original_offset(&self, canonical: usize) -> usize {
        let mut original = canonical;
        for correction in &self.corrections {
            if correction.index >= original {
                break;
            }
            original += correction.skip;
        }
        original
    }

    /// Original ranges of real escape sequences, normalized.
    pub fn escape_ranges(&self) -> NormalizedRanges {
        self.corrections
            .iter()
            .filter(|c| c.is_escape())
            .map(Correction::range)
            .collect()
    }
}

enum EscapeValue {
    Scalar(char),
    Unit(u16),
}

/// Canonicalize the content of a literal of the given kind.
///
/// `content` excludes the opening and closing delimiters. Raw literals only get surrogate-pair
/// markers. Any unrecognized or truncated escape rejects the whole literal.
pub fn unescape(content: &[u16], kind: LiteralKind) -> Result<Unescaped, LiteralError> {
    let raw = kind.contains(LiteralKind::RAW);
    let verbatim = kind.contains(LiteralKind::VERBATIM);
    let interpolated = kind.contains(LiteralKind::INTERPOLATED);

    let mut text = String::with_capacity(content.len());
    let mut corrections = Vec::new();
    let mut i = 0;

    while i < content.len() {
        let unit = content[i];
        let next = content.get(i + 1).copied();

        if !raw {
            let doubled = (interpolated && (unit == OPEN_BRACE || unit == CLOSE_BRACE))
                || (verbatim && unit == QUOTE);
            if doubled && next == Some(unit) {
                corrections.push(Correction {
                    index: i,
                    escaped_len: 2,
                    skip: 1,
                });
                text.push(char::from(unit as u8));
                i += 2;
                continue;
            }

            if !verbatim && unit == BACKSLASH {
                let (ch, consumed) = scan_escape_sequence(content, i)?;
                corrections.push(Correction {
                    index: i,
                    escaped_len: consumed,
                    skip: consumed - 1,
                });
                text.push(ch);
                i += consumed;
                continue;
            }
        }

        if is_high_surrogate(unit) && next.is_some_and(is_low_surrogate) {
            corrections.push(Correction {
                index: i,
                escaped_len: 0,
                skip: 1,
            });
            text.push(decode_pair(unit, next.unwrap_or_default()));
            i += 2;
            continue;
        }

        text.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
        i += 1;
    }

    Ok(Unescaped { text, corrections })
}

/// Scan the escape sequence whose backslash is at `start`, returning the decoded `char` and the
/// number of code units consumed (backslash included).
///
/// A `\u`/`\x` escape yielding a high surrogate followed directly by one yielding a low
/// surrogate is decoded as a single `char`. Any other lone surrogate becomes U+FFFD.
fn scan_escape_sequence(content: &[u16], start: usize) -> Result<(char, usize), LiteralError> {
    let malformed = LiteralError::MalformedEscape { offset: start };
    let (value, len) = scan_escape(content, start + 1).ok_or(malformed)?;
    let consumed = len + 1;

    let unit = match value {
        EscapeValue::Scalar(ch) => return Ok((ch, consumed)),
        EscapeValue::Unit(unit) => unit,
    };

    if is_high_surrogate(unit) && content.get(start + consumed) == Some(&BACKSLASH) {
        if let Some((EscapeValue::Unit(low), low_len)) = scan_escape(content, start + consumed + 1)
        {
            if is_low_surrogate(low) {
                return Ok((decode_pair(unit, low), consumed + low_len + 1));
            }
        }
    }

    let ch = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
    Ok((ch, consumed))
}

/// Scan an escape body starting right after the backslash. Returns the value and the number of
/// code units consumed after the backslash.
fn scan_escape(content: &[u16], pos: usize) -> Option<(EscapeValue, usize)> {
    let introducer = u8::try_from(*content.get(pos)?).ok()?;
    let simple = match introducer {
        b'\'' => Some('\''),
        b'"' => Some('"'),
        b'\\' => Some('\\'),
        b'0' => Some('\0'),
        b'a' => Some('\u{07}'),
        b'b' => Some('\u{08}'),
        b'f' => Some('\u{0C}'),
        b'n' => Some('\n'),
        b'r' => Some('\r'),
        b't' => Some('\t'),
        b'v' => Some('\u{0B}'),
        _ => None,
    };
    if let Some(ch) = simple {
        return Some((EscapeValue::Scalar(ch), 1));
    }

    match introducer {
        b'u' => {
            let value = hex_value(content.get(pos + 1..pos + 5)?)?;
            Some((EscapeValue::Unit(value as u16), 5))
        }
        b'U' => {
            let value = hex_value(content.get(pos + 1..pos + 9)?)?;
            Some((EscapeValue::Scalar(char::from_u32(value)?), 9))
        }
        b'x' => {
            let digits = content[pos + 1..]
                .iter()
                .take(4)
                .take_while(|&&u| hex_digit(u).is_some())
                .count();
            if digits == 0 {
                return None;
            }
            let value = hex_value(&content[pos + 1..pos + 1 + digits])?;
            Some((EscapeValue::Unit(value as u16), digits + 1))
        }
        _ => None,
    }
}

fn hex_digit(unit: u16) -> Option<u32> {
    char::from_u32(u32::from(unit))?.to_digit(16)
}

fn hex_value(units: &[u16]) -> Option<u32> {
    units
        .iter()
        .try_fold(0u32, |acc, &u| Some((acc << 4) | hex_digit(u)?))
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..0xE000).contains(&unit)
}

fn decode_pair(high: u16, low: u16) -> char {
    let scalar = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    char::from_u32(scalar).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::seq::SliceRandom;

    fn units(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    fn corr(index: usize, escaped_len: usize, skip: usize) -> Correction {
        Correction {
            index,
            escaped_len,
            skip,
        }
    }

    #[test]
    fn test_interpolated_escapes() {
        let result = unescape(&units(r"a\tb{{c}}"), LiteralKind::INTERPOLATED).unwrap();
        assert_eq!(result.text(), "a\tb{c}");
        assert_eq!(
            result.corrections(),
            &[corr(1, 2, 1), corr(4, 2, 1), corr(7, 2, 1)]
        );
        assert_eq!(result.to_original_offset(2), 3);
        assert_eq!(result.to_original_offset(4), 6);
        assert_eq!(result.to_original_offset(6), 9);
    }

    #[test]
    fn test_verbatim_ignores_backslashes() {
        let result = unescape(&units("c:\\dir \"\"x\"\""), LiteralKind::VERBATIM).unwrap();
        assert_eq!(result.text(), "c:\\dir \"x\"");
        assert_eq!(result.corrections(), &[corr(7, 2, 1), corr(10, 2, 1)]);
    }

    #[test]
    fn test_plain_literal_keeps_braces() {
        let result = unescape(&units("{{x}}"), LiteralKind::QUOTED).unwrap();
        assert_eq!(result.text(), "{{x}}");
        assert!(result.corrections().is_empty());
    }

    #[test]
    fn test_hex_and_unicode_escapes() {
        let result = unescape(&units(r"\x41\x4g\u0042\U0001F600!"), LiteralKind::QUOTED).unwrap();
        assert_eq!(result.text(), "A\u{4}gB😀!");
        assert_eq!(
            result.corrections(),
            &[corr(0, 4, 3), corr(4, 3, 2), corr(8, 6, 5), corr(14, 10, 9)]
        );
        assert_eq!(result.to_original_offset(4), 14);
        assert_eq!(result.to_original_offset(5), 24);
    }

    #[test]
    fn test_hex_escape_is_greedy_up_to_four_digits() {
        let result = unescape(&units(r"\x00411"), LiteralKind::QUOTED).unwrap();
        assert_eq!(result.text(), "A1");
        assert_eq!(result.corrections(), &[corr(0, 6, 5)]);
    }

    #[test]
    fn test_escaped_surrogate_pair_is_one_char() {
        let result = unescape(&units(r"\uD83D\uDE00x"), LiteralKind::QUOTED).unwrap();
        assert_eq!(result.text(), "😀x");
        assert_eq!(result.corrections(), &[corr(0, 12, 11)]);
        assert_eq!(result.to_original_offset(1), 12);

        let lone = unescape(&units(r"\uD83Dx"), LiteralKind::QUOTED).unwrap();
        assert_eq!(lone.text(), "\u{FFFD}x");
    }

    #[test]
    fn test_raw_surrogate_pair_gets_zero_length_marker() {
        let result = unescape(&units("a😀b"), LiteralKind::QUOTED).unwrap();
        assert_eq!(result.text(), "a😀b");
        assert_eq!(result.corrections(), &[corr(1, 0, 1)]);
        assert!(result.escape_ranges().is_empty());
        assert_eq!(result.to_original_offset(2), 3);
    }

    #[test]
    fn test_raw_literal_has_no_escapes() {
        let result = unescape(&units(r#"a\n""{{😀"#), LiteralKind::RAW).unwrap();
        assert_eq!(result.text(), r#"a\n""{{😀"#);
        assert_eq!(result.corrections(), &[corr(7, 0, 1)]);
    }

    #[test]
    fn test_malformed_escapes_reject_the_literal() {
        let cases = [r"bad\qend", r"\u12", r"\u12G4", r"\U0011FFFF", r"\UD800DC00", r"\x", r"end\"];
        for case in cases {
            assert!(
                matches!(
                    unescape(&units(case), LiteralKind::QUOTED),
                    Err(LiteralError::MalformedEscape { .. })
                ),
                "expected failure for {case:?}"
            );
        }

        assert_eq!(
            unescape(&units(r"ok\qx"), LiteralKind::QUOTED),
            Err(LiteralError::MalformedEscape { offset: 2 })
        );
    }

    /// Encode canonical text as literal content for `kind`, choosing escape spellings at random.
    /// Returns the content and the original offset at which each canonical `char` starts.
    fn encode(text: &[char], kind: LiteralKind, rng: &mut impl Rng) -> (Vec<u16>, Vec<usize>) {
        let raw = kind.contains(LiteralKind::RAW);
        let verbatim = kind.contains(LiteralKind::VERBATIM);
        let interpolated = kind.contains(LiteralKind::INTERPOLATED);

        let mut out = String::new();
        let mut starts = Vec::new();
        for &ch in text {
            starts.push(out.encode_utf16().count());
            let doubled = !raw
                && ((interpolated && (ch == '{' || ch == '}')) || (verbatim && ch == '"'));
            if doubled {
                out.push(ch);
                out.push(ch);
                continue;
            }
            if raw || verbatim {
                out.push(ch);
                continue;
            }
            let must_escape = matches!(ch, '"' | '\\' | '\n' | '\t' | '\0');
            if !must_escape && rng.gen_bool(0.5) {
                out.push(ch);
                continue;
            }
            let code = ch as u32;
            let spellings: Vec<String> = match ch {
                '\n' => vec![r"\n".into(), format!("\\u{code:04X}")],
                '\t' => vec![r"\t".into(), format!("\\x{code:04x}")],
                '"' => vec![r#"\""#.into(), format!("\\x{code:04x}")],
                '\\' => vec![r"\\".into(), format!("\\U{code:08X}")],
                '\0' => vec![r"\0".into(), format!("\\u{code:04x}")],
                _ if code > 0xFFFF => {
                    let mut pair = [0u16; 2];
                    ch.encode_utf16(&mut pair);
                    vec![
                        format!("\\U{code:08X}"),
                        format!("\\u{:04X}\\u{:04X}", pair[0], pair[1]),
                    ]
                }
                _ => vec![format!("\\U{code:08x}"), format!("\\u{code:04X}")],
            };
            out.push_str(spellings.choose(rng).map(String::as_str).unwrap_or_default());
        }
        starts.push(out.encode_utf16().count());
        (out.encode_utf16().collect(), starts)
    }

    #[test]
    fn test_randomized_round_trip_offsets() {
        let pool = [
            'a', 'Z', '1', ' ', '\'', '"', '\\', '\n', '\t', '\0', '{', '}', 'é', '😀', '𝄞', '$',
        ];
        let kinds = [
            LiteralKind::QUOTED,
            LiteralKind::VERBATIM,
            LiteralKind::INTERPOLATED,
            LiteralKind::VERBATIM | LiteralKind::INTERPOLATED,
            LiteralKind::RAW,
        ];
        let mut rng = rand::thread_rng();

        for _ in 0..300 {
            let kind = *kinds.choose(&mut rng).unwrap();
            let len = rng.gen_range(0..24);
            let text: Vec<char> = (0..len).map(|_| *pool.choose(&mut rng).unwrap()).collect();
            let (content, starts) = encode(&text, kind, &mut rng);

            let result = unescape(&content, kind).unwrap();
            let expected: String = text.iter().collect();
            assert_eq!(result.text(), expected, "kind {kind:?}");

            for (canonical, &start) in starts.iter().enumerate() {
                assert_eq!(
                    result.to_original_offset(canonical),
                    start,
                    "offset {canonical} of {expected:?} ({kind:?})"
                );
            }

            let skipped: usize = result.corrections().iter().map(|c| c.skip).sum();
            assert_eq!(text.len() + skipped, content.len());
        }
    }
}
