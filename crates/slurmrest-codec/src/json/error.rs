//! JSON parse/emit error taxonomy, reported with line/column and (where
//! known) the offending codepoint, per spec §4.C.

use std::fmt;

use slurmrest_core::utf8::Utf8Violation;

/// The distinct JSON parse failure kinds the source's parser reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonErrorKind {
    /// A byte sequence could not be decoded as UTF-8 at all.
    InvalidRead,
    /// A raw byte was rejected outright (e.g. a stray continuation byte).
    InvalidByte(u8),
    /// A structural character appeared where the grammar forbids it.
    InvalidChar,
    /// A `\` escape sequence inside a quoted string was malformed.
    InvalidEscaped,
    /// Input ended mid-token with no valid way to terminate.
    IllegalTermination,
    /// A `"` appeared somewhere the grammar didn't expect one.
    UnexpectedQuotes,
    /// A `[` appeared where the grammar didn't expect one.
    UnexpectedList,
    /// A `]` appeared where the grammar didn't expect one.
    UnexpectedListEnd,
    /// A `{` appeared where the grammar didn't expect one.
    UnexpectedDictionary,
    /// A `}` appeared where the grammar didn't expect one.
    UnexpectedDictionaryEnd,
    /// A `,` appeared where the grammar didn't expect one.
    UnexpectedComma,
    /// A quoted string token appeared where the grammar didn't expect one.
    UnexpectedQuotedString,
    /// An unquoted (bareword) token appeared where the grammar didn't
    /// expect one.
    UnexpectedUnquotedString,
    /// A dict key token was not a valid string.
    InvalidDictionaryKey,
    /// The `:` separating a dict key from its value was missing or
    /// misplaced.
    InvalidDictionaryColon,
    /// A dict key was opened (`"`) but never closed before `:` or `}`.
    IncompleteDictionaryKey,
    /// A quoted string was opened but never closed.
    UnclosedQuotedString,
    /// A `{` was opened but never closed.
    UnclosedDictionary,
    /// A `[` was opened but never closed.
    UnclosedList,
    /// A scalar decoded to U+0000.
    NullCode,
    /// A scalar decoded to a lone UTF-16 surrogate half.
    SurrogateCode,
    /// A scalar decoded to a private-use codepoint.
    PrivateCode,
    /// A scalar decoded to a noncharacter.
    NoncharacterCode,
    /// A scalar decoded to a reserved codepoint.
    ReservedCode,
    /// Container nesting exceeded [`super::parser::MAX_DEPTH`].
    ParseDepthMax,
    /// A negative/impossible depth was requested internally (defensive;
    /// surfaces only on programmer error in a caller-supplied resume
    /// point).
    ParseDepthMin,
    /// The input began with a UTF-16BE byte-order mark.
    Utf16BeSchema,
    /// The input began with a UTF-16LE byte-order mark.
    Utf16LeSchema,
    /// The input began with a UTF-32BE byte-order mark.
    Utf32BeSchema,
    /// The input began with a UTF-32LE byte-order mark.
    Utf32LeSchema,
}

impl fmt::Display for JsonErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidRead => "INVALID_READ",
            Self::InvalidByte(b) => return write!(f, "INVALID_BYTE_{b:02X}"),
            Self::InvalidChar => "INVALID_CHAR",
            Self::InvalidEscaped => "INVALID_ESCAPED",
            Self::IllegalTermination => "ILLEGAL_TERMINATION",
            Self::UnexpectedQuotes => "UNEXPECTED_QUOTES",
            Self::UnexpectedList => "UNEXPECTED_LIST",
            Self::UnexpectedListEnd => "UNEXPECTED_LIST_END",
            Self::UnexpectedDictionary => "UNEXPECTED_DICTIONARY",
            Self::UnexpectedDictionaryEnd => "UNEXPECTED_DICTIONARY_END",
            Self::UnexpectedComma => "UNEXPECTED_COMMA",
            Self::UnexpectedQuotedString => "UNEXPECTED_QUOTED_STRING",
            Self::UnexpectedUnquotedString => "UNEXPECTED_UNQUOTED_STRING",
            Self::InvalidDictionaryKey => "INVALID_DICTIONARY_KEY",
            Self::InvalidDictionaryColon => "INVALID_DICTIONARY_COLON",
            Self::IncompleteDictionaryKey => "INCOMPLETE_DICTIONARY_KEY",
            Self::UnclosedQuotedString => "UNCLOSED_QUOTED_STRING",
            Self::UnclosedDictionary => "UNCLOSED_DICTIONARY",
            Self::UnclosedList => "UNCLOSED_LIST",
            Self::NullCode => "NULL_CODE",
            Self::SurrogateCode => "SURROGATE_CODE",
            Self::PrivateCode => "PRIVATE_CODE",
            Self::NoncharacterCode => "NONCHARACTER_CODE",
            Self::ReservedCode => "RESERVED_CODE",
            Self::ParseDepthMax => "PARSE_DEPTH_MAX",
            Self::ParseDepthMin => "PARSE_DEPTH_MIN",
            Self::Utf16BeSchema => "UTF16BE_SCHEMA",
            Self::Utf16LeSchema => "UTF16LE_SCHEMA",
            Self::Utf32BeSchema => "UTF32BE_SCHEMA",
            Self::Utf32LeSchema => "UTF32LE_SCHEMA",
        };
        f.write_str(s)
    }
}

impl From<Utf8Violation> for JsonErrorKind {
    fn from(v: Utf8Violation) -> Self {
        match v {
            Utf8Violation::Null => Self::NullCode,
            Utf8Violation::Surrogate => Self::SurrogateCode,
            Utf8Violation::PrivateUse => Self::PrivateCode,
            Utf8Violation::Noncharacter => Self::NoncharacterCode,
            Utf8Violation::Reserved => Self::ReservedCode,
        }
    }
}

/// A JSON parse error: its kind, 1-based line/column, and the offending
/// codepoint if one was decoded before the error was raised.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("{kind} at line {line}, column {column}")]
pub struct JsonError {
    /// The kind of failure.
    pub kind: JsonErrorKind,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// The offending codepoint, if one was successfully decoded.
    pub offending: Option<char>,
}

impl JsonError {
    pub(crate) fn new(kind: JsonErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            offending: None,
        }
    }

    pub(crate) fn with_char(mut self, c: char) -> Self {
        self.offending = Some(c);
        self
    }
}
