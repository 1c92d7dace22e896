//! Single-pass codepoint scanner producing a flat token stream for the
//! push-down parser in [`super::parser`].
//!
//! Tokenizing and container assembly are deliberately separate: this module
//! only ever looks at the current scalar and (for comments and escapes) a
//! short fixed lookahead, so it never recurses and never needs to know
//! about nesting.

use slurmrest_core::convert::convert_auto;
use slurmrest_core::utf8::{
    bom_len, classify_violation, detect_bom, is_whitespace, read_scalar, DetectedEncoding,
    Utf8Violation,
};
use slurmrest_core::Value;

use super::error::{JsonError, JsonErrorKind};

/// A lexical token, tagged with the 1-based (line, column) of its first
/// character.
pub(super) enum Token {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    /// A string or bareword scalar, already classified. `quoted` records
    /// whether it was written with `"..."` (used only to pick between
    /// `UNEXPECTED_QUOTED_STRING`/`UNEXPECTED_UNQUOTED_STRING` on error).
    Scalar { value: Value, quoted: bool },
}

pub(super) struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub(super) fn new(bytes: &'a [u8]) -> Result<Self, JsonError> {
        let kind = match detect_bom(bytes) {
            DetectedEncoding::Utf16Be => Some(JsonErrorKind::Utf16BeSchema),
            DetectedEncoding::Utf16Le => Some(JsonErrorKind::Utf16LeSchema),
            DetectedEncoding::Utf32Be => Some(JsonErrorKind::Utf32BeSchema),
            DetectedEncoding::Utf32Le => Some(JsonErrorKind::Utf32LeSchema),
            DetectedEncoding::Utf8 | DetectedEncoding::Unknown => None,
        };
        if let Some(kind) = kind {
            return Err(JsonError::new(kind, 1, 1));
        }
        let skip = bom_len(bytes);
        Ok(Self {
            bytes,
            pos: skip,
            line: 1,
            col: 1,
        })
    }

    pub(super) fn line(&self) -> usize {
        self.line
    }

    pub(super) fn col(&self) -> usize {
        self.col
    }

    fn peek_raw(&self) -> Result<Option<(char, usize, Option<Utf8Violation>)>, JsonError> {
        if self.pos >= self.bytes.len() {
            return Ok(None);
        }
        match read_scalar(&self.bytes[self.pos..]) {
            Ok(triple) => Ok(Some(triple)),
            Err(()) => Err(JsonError::new(JsonErrorKind::InvalidRead, self.line, self.col)),
        }
    }

    fn peek(&self) -> Result<Option<char>, JsonError> {
        Ok(self.peek_raw()?.map(|(c, _, _)| c))
    }

    fn bump(&mut self) -> Result<Option<char>, JsonError> {
        let Some((c, width, violation)) = self.peek_raw()? else {
            return Ok(None);
        };
        if let Some(v) = violation {
            return Err(JsonError::new(v.into(), self.line, self.col).with_char(c));
        }
        self.pos += width;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Ok(Some(c))
    }

    fn skip_ws_and_comments(&mut self) -> Result<(), JsonError> {
        loop {
            match self.peek()? {
                Some(c) if is_whitespace(c) => {
                    self.bump()?;
                }
                Some('/') => {
                    let mark = (self.pos, self.line, self.col);
                    self.bump()?;
                    match self.peek()? {
                        Some('/') => {
                            self.bump()?;
                            loop {
                                match self.peek()? {
                                    None | Some('\n') => break,
                                    Some(_) => {
                                        self.bump()?;
                                    }
                                }
                            }
                        }
                        Some('*') => {
                            self.bump()?;
                            loop {
                                match self.bump()? {
                                    None => {
                                        return Err(JsonError::new(
                                            JsonErrorKind::IllegalTermination,
                                            self.line,
                                            self.col,
                                        ))
                                    }
                                    Some('*') if self.peek()? == Some('/') => {
                                        self.bump()?;
                                        break;
                                    }
                                    Some(_) => {}
                                }
                            }
                        }
                        _ => {
                            (self.pos, self.line, self.col) = mark;
                            return Ok(());
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    pub(super) fn next_token(&mut self) -> Result<Option<(Token, usize, usize)>, JsonError> {
        self.skip_ws_and_comments()?;
        let (line, col) = (self.line, self.col);
        let Some(c) = self.peek()? else {
            return Ok(None);
        };
        let token = match c {
            '{' => {
                self.bump()?;
                Token::LBrace
            }
            '}' => {
                self.bump()?;
                Token::RBrace
            }
            '[' => {
                self.bump()?;
                Token::LBracket
            }
            ']' => {
                self.bump()?;
                Token::RBracket
            }
            ',' => {
                self.bump()?;
                Token::Comma
            }
            ':' => {
                self.bump()?;
                Token::Colon
            }
            '"' => Token::Scalar {
                value: Value::String(self.scan_quoted_string(line, col)?),
                quoted: true,
            },
            _ => Token::Scalar {
                value: self.scan_bareword(line, col)?,
                quoted: false,
            },
        };
        Ok(Some((token, line, col)))
    }

    fn scan_quoted_string(&mut self, line: usize, col: usize) -> Result<String, JsonError> {
        self.bump()?; // opening quote
        let mut out = String::new();
        loop {
            match self.bump()? {
                None => return Err(JsonError::new(JsonErrorKind::UnclosedQuotedString, line, col)),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let (eline, ecol) = (self.line, self.col);
                    match self.bump()? {
                        None => {
                            return Err(JsonError::new(
                                JsonErrorKind::UnclosedQuotedString,
                                line,
                                col,
                            ))
                        }
                        Some('"') => out.push('"'),
                        Some('\\') => out.push('\\'),
                        Some('/') => out.push('/'),
                        Some('b') => out.push('\u{0008}'),
                        Some('f') => out.push('\u{000C}'),
                        Some('n') => out.push('\n'),
                        Some('r') => out.push('\r'),
                        Some('t') => out.push('\t'),
                        Some('u') => out.push(self.scan_unicode_escape(eline, ecol)?),
                        Some(_) => {
                            return Err(JsonError::new(JsonErrorKind::InvalidEscaped, eline, ecol))
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Accepts 4 to 6 hex digits per spec and interprets them as the raw
    /// codepoint value directly (the wire contract never uses UTF-16
    /// surrogate-pair escapes; it emits the full codepoint in up to 6 hex
    /// digits instead).
    fn scan_unicode_escape(&mut self, line: usize, col: usize) -> Result<char, JsonError> {
        let mut digits = String::new();
        for _ in 0..4 {
            match self.bump()? {
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                _ => return Err(JsonError::new(JsonErrorKind::InvalidEscaped, line, col)),
            }
        }
        for _ in 0..2 {
            match self.peek()? {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.bump()?;
                    digits.push(c);
                }
                _ => break,
            }
        }
        let cp = u32::from_str_radix(&digits, 16)
            .map_err(|_| JsonError::new(JsonErrorKind::InvalidEscaped, line, col))?;
        if let Some(v) = classify_violation(cp) {
            return Err(JsonError::new(v.into(), line, col));
        }
        char::from_u32(cp).ok_or_else(|| JsonError::new(JsonErrorKind::InvalidEscaped, line, col))
    }

    fn scan_bareword(&mut self, line: usize, col: usize) -> Result<Value, JsonError> {
        let mut s = String::new();
        loop {
            match self.peek()? {
                Some(c) if is_structural(c) || is_whitespace(c) || c == '"' || c == '/' => break,
                Some(c) => {
                    self.bump()?;
                    s.push(c);
                }
                None => break,
            }
        }
        if s.is_empty() {
            return Err(JsonError::new(JsonErrorKind::InvalidChar, line, col));
        }
        Ok(match s.as_str() {
            "Infinity" => Value::Double(f64::INFINITY),
            "-Infinity" => Value::Double(f64::NEG_INFINITY),
            "NaN" => Value::Double(f64::NAN),
            "-NaN" => Value::Double(-f64::NAN),
            _ => convert_auto(Value::String(s)),
        })
    }
}

fn is_structural(c: char) -> bool {
    matches!(c, '{' | '}' | '[' | ']' | ',' | ':')
}
