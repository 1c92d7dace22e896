//! UTF-8 correctness primitives shared by the JSON codec.
//!
//! Rust's `char`/`str` already guarantee well-formed UTF-8 byte sequences,
//! but they do not reject every codepoint the wire contract forbids
//! (U+0000, UTF-16 surrogate halves, private-use ranges, noncharacters,
//! and the FFF0–FFF8 reserved block are all otherwise-valid Unicode
//! scalar values). This module layers those additional semantic checks on
//! top of `std`'s byte-level validation, matching `src/common/utf.c`.

use std::fmt;

/// A codepoint the wire contract forbids, with the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Violation {
    /// U+0000 (`NULL_CODE` in the JSON parser's error taxonomy).
    Null,
    /// U+D800–U+DFFF, a lone UTF-16 surrogate half (`SURROGATE_CODE`).
    Surrogate,
    /// A private-use codepoint (`PRIVATE_CODE`).
    PrivateUse,
    /// A noncharacter: U+FDD0–U+FDEF or any `U+nFFFE`/`U+nFFFF`
    /// (`NONCHARACTER_CODE`).
    Noncharacter,
    /// U+FFF0–U+FFF8, reserved (`RESERVED_CODE`).
    Reserved,
}

impl fmt::Display for Utf8Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Null => "NULL_CODE",
            Self::Surrogate => "SURROGATE_CODE",
            Self::PrivateUse => "PRIVATE_CODE",
            Self::Noncharacter => "NONCHARACTER_CODE",
            Self::Reserved => "RESERVED_CODE",
        };
        f.write_str(s)
    }
}

/// Check whether `cp` is one of the codepoints the wire contract forbids.
///
/// Surrogate halves can never appear in a valid `char` (Rust's `char`
/// excludes D800–DFFF by construction), so that branch is unreachable in
/// practice for codepoints sourced from a `char`; it is kept so this
/// function is also usable on raw `u32` codepoints read while parsing
/// `\uXXXX` escapes, which (unlike `char`) can represent a lone surrogate
/// before combining with its pair.
#[must_use]
pub fn classify_violation(cp: u32) -> Option<Utf8Violation> {
    match cp {
        0x0000 => Some(Utf8Violation::Null),
        0xD800..=0xDFFF => Some(Utf8Violation::Surrogate),
        0xE000..=0xF8FF | 0xF_0000..=0xF_FFFD | 0x10_0000..=0x10_FFFD => {
            Some(Utf8Violation::PrivateUse)
        }
        0xFDD0..=0xFDEF => Some(Utf8Violation::Noncharacter),
        _ if is_plane_noncharacter(cp) => Some(Utf8Violation::Noncharacter),
        0xFFF0..=0xFFF8 => Some(Utf8Violation::Reserved),
        _ => None,
    }
}

fn is_plane_noncharacter(cp: u32) -> bool {
    let low16 = cp & 0xFFFF;
    (low16 == 0xFFFE || low16 == 0xFFFF) && cp <= 0x10_FFFF
}

/// `true` if `cp` is allowed on the wire (the inverse of
/// [`classify_violation`]).
#[must_use]
pub fn is_allowed_codepoint(cp: u32) -> bool {
    classify_violation(cp).is_none()
}

/// Read one UTF-8 scalar from the front of `bytes`.
///
/// Returns the decoded `char`, its length in bytes, and `Some(violation)`
/// if the codepoint (though well-formed UTF-8) is on the forbidden list.
/// Returns `Err` if `bytes` does not begin with a well-formed UTF-8
/// sequence.
///
/// # Errors
/// Returns `Err(())` if `bytes` is empty or does not start with valid
/// UTF-8.
pub fn read_scalar(bytes: &[u8]) -> Result<(char, usize, Option<Utf8Violation>), ()> {
    if bytes.is_empty() {
        return Err(());
    }
    // Find the shortest valid-UTF-8 prefix length by probing sequential
    // slice sizes through `str::from_utf8`; this delegates byte-level
    // decoding to `std` per spec §9 and only adds the semantic layer on
    // top.
    let width = utf8_width(bytes[0]).ok_or(())?;
    if bytes.len() < width {
        return Err(());
    }
    let s = std::str::from_utf8(&bytes[..width]).map_err(|_| ())?;
    let ch = s.chars().next().ok_or(())?;
    let violation = classify_violation(ch as u32);
    Ok((ch, width, violation))
}

fn utf8_width(lead: u8) -> Option<usize> {
    if lead & 0x80 == 0 {
        Some(1)
    } else if lead & 0xE0 == 0xC0 {
        Some(2)
    } else if lead & 0xF0 == 0xE0 {
        Some(3)
    } else if lead & 0xF8 == 0xF0 {
        Some(4)
    } else {
        None
    }
}

/// Encode `cp` as UTF-8 into a stack buffer, returning the slice written.
#[must_use]
pub fn write_scalar(cp: char, buf: &mut [u8; 4]) -> &[u8] {
    let s = cp.encode_utf8(buf);
    let len = s.len();
    &buf[..len]
}

/// `true` if `c` is space (U+0020) or horizontal tab (U+0009).
#[must_use]
pub fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// `true` if `c` is a newline sequence member (LF or CR).
#[must_use]
pub fn is_newline(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// `true` if `c` is a C0/C1 control character or DEL.
#[must_use]
pub fn is_control(c: char) -> bool {
    let cp = c as u32;
    cp < 0x20 || (0x7F..=0x9F).contains(&cp)
}

/// `true` if `c` is whitespace per JSON's definition: space, tab, CR, LF.
#[must_use]
pub fn is_whitespace(c: char) -> bool {
    is_space(c) || is_newline(c)
}

/// The byte-order-mark-detected encoding of a byte buffer's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedEncoding {
    /// UTF-8 (BOM present, or no BOM recognized and the content is
    /// assumed UTF-8 by default).
    Utf8,
    /// UTF-16, big-endian.
    Utf16Be,
    /// UTF-16, little-endian.
    Utf16Le,
    /// UTF-32, big-endian.
    Utf32Be,
    /// UTF-32, little-endian.
    Utf32Le,
    /// No recognized BOM and the buffer is too short to guess.
    Unknown,
}

/// Inspect a byte buffer's prefix for a byte-order mark and report the
/// encoding it implies. The JSON parser uses this to reject UTF-16/32
/// input upfront (`UTF16LE_SCHEMA` and friends) and to silently consume a
/// leading UTF-8 BOM.
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> DetectedEncoding {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => DetectedEncoding::Utf8,
        [0x00, 0x00, 0xFE, 0xFF, ..] => DetectedEncoding::Utf32Be,
        [0xFF, 0xFE, 0x00, 0x00, ..] => DetectedEncoding::Utf32Le,
        [0xFE, 0xFF, ..] => DetectedEncoding::Utf16Be,
        [0xFF, 0xFE, ..] => DetectedEncoding::Utf16Le,
        _ => DetectedEncoding::Unknown,
    }
}

/// Length in bytes of the BOM [`detect_bom`] recognized, if any (so the
/// caller can skip past it). `Unknown` and `Utf8`-without-a-leading-BOM
/// both report `0`; callers distinguish those by checking the bytes
/// themselves before calling this, as the JSON parser does.
#[must_use]
pub fn bom_len(bytes: &[u8]) -> usize {
    match bytes {
        [0x00, 0x00, 0xFE, 0xFF, ..] | [0xFF, 0xFE, 0x00, 0x00, ..] => 4,
        [0xEF, 0xBB, 0xBF, ..] => 3,
        [0xFE, 0xFF, ..] | [0xFF, 0xFE, ..] => 2,
        _ => 0,
    }
}

/// Map a non-printable codepoint to a loggable substitute: C0 controls
/// (and DEL) map into the Unicode Control Pictures block (U+2400+cp, or
/// U+2421 for DEL); any other forbidden/non-printable codepoint maps to
/// U+FFFD. Printable codepoints pass through unchanged.
///
/// Used when a handler wants to log request bodies that may contain
/// control characters without corrupting a terminal.
#[must_use]
pub fn loggable(c: char) -> char {
    let cp = c as u32;
    if cp < 0x20 {
        char::from_u32(0x2400 + cp).unwrap_or('\u{FFFD}')
    } else if cp == 0x7F {
        '\u{2421}'
    } else if !is_allowed_codepoint(cp) {
        '\u{FFFD}'
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_null_surrogate_private_noncharacter_reserved() {
        assert_eq!(classify_violation(0x0000), Some(Utf8Violation::Null));
        assert_eq!(classify_violation(0xD900), Some(Utf8Violation::Surrogate));
        assert_eq!(classify_violation(0xE001), Some(Utf8Violation::PrivateUse));
        assert_eq!(
            classify_violation(0xF_0001),
            Some(Utf8Violation::PrivateUse)
        );
        assert_eq!(
            classify_violation(0xFDD5),
            Some(Utf8Violation::Noncharacter)
        );
        assert_eq!(
            classify_violation(0xFFFE),
            Some(Utf8Violation::Noncharacter)
        );
        assert_eq!(
            classify_violation(0x1_FFFF),
            Some(Utf8Violation::Noncharacter)
        );
        assert_eq!(classify_violation(0xFFF4), Some(Utf8Violation::Reserved));
    }

    #[test]
    fn accepts_canonical_sample_of_each_allowed_range() {
        for cp in [
            'a' as u32,
            '0' as u32,
            0x00A0, // Latin-1 supplement
            0x0100, // Latin Extended-A
            0x4E2D, // CJK
            0x1F600, // emoji plane
        ] {
            assert!(is_allowed_codepoint(cp), "{cp:x} should be allowed");
        }
    }

    #[test]
    fn read_scalar_roundtrips_ascii_and_multibyte() {
        let (ch, len, violation) = read_scalar("A".as_bytes()).unwrap();
        assert_eq!((ch, len, violation), ('A', 1, None));

        let (ch, len, violation) = read_scalar("é".as_bytes()).unwrap();
        assert_eq!(ch, 'é');
        assert_eq!(len, 2);
        assert_eq!(violation, None);
    }

    #[test]
    fn write_scalar_roundtrips() {
        let mut buf = [0u8; 4];
        let bytes = write_scalar('λ', &mut buf);
        assert_eq!(bytes, "λ".as_bytes());
    }

    #[test]
    fn detect_bom_variants() {
        assert_eq!(detect_bom(&[0xEF, 0xBB, 0xBF, b'{']), DetectedEncoding::Utf8);
        assert_eq!(
            detect_bom(&[0xFF, 0xFE, 0x00, 0x00]),
            DetectedEncoding::Utf32Le
        );
        assert_eq!(detect_bom(&[0xFF, 0xFE, b'{', 0]), DetectedEncoding::Utf16Le);
        assert_eq!(detect_bom(&[0xFE, 0xFF]), DetectedEncoding::Utf16Be);
        assert_eq!(detect_bom(b"{}"), DetectedEncoding::Unknown);
    }

    #[test]
    fn loggable_substitutes_control_pictures() {
        assert_eq!(loggable('\u{0007}'), '\u{2407}');
        assert_eq!(loggable('\u{007F}'), '\u{2421}');
        assert_eq!(loggable('A'), 'A');
    }
}
