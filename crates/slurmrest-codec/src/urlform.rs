//! `application/x-www-form-urlencoded` codec producing/consuming the data
//! tree, matching `src/plugins/serializer/url-encoded/serializer_url_encoded.c`
//! (spec §4.D).
//!
//! Each `key=value` pair becomes a top-level dict entry; `;` and `&` are
//! accepted interchangeably as pair separators; a bare `key` with no `=`
//! becomes `key: null`; values run through [`convert_auto`] so
//! `a=1&b=true` decodes `b` as a `Bool`, not a `String`.

use slurmrest_core::convert::convert_auto;
use slurmrest_core::{Dict, Value};
use thiserror::Error;

/// Error returned by [`parse`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UrlFormError {
    /// A `%XX` escape was not followed by two hex digits.
    #[error("invalid percent-escape at byte offset {0}")]
    InvalidPercentEscape(usize),
    /// A decoded key or value was not valid UTF-8.
    #[error("decoded field at byte offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),
    /// A pair began with `=`, i.e. an empty key.
    #[error("empty key at byte offset {0}")]
    EmptyKey(usize),
    /// [`emit`] was called; this codec only deserializes URL-encoded form
    /// bodies, it does not produce them.
    #[error("url-encoded form serialization is not supported")]
    SerializationNotSupported,
}

/// Parse a URL-encoded form body into a top-level [`Value::Dict`].
///
/// # Errors
/// Returns [`UrlFormError`] on a malformed percent-escape, invalid UTF-8,
/// or an empty key.
pub fn parse(body: &str) -> Result<Value, UrlFormError> {
    let mut dict = Dict::new();
    if body.is_empty() {
        return Ok(Value::Dict(dict));
    }
    let mut offset = 0;
    for pair in body.split(['&', ';']) {
        if pair.is_empty() {
            offset += 1;
            continue;
        }
        match pair.split_once('=') {
            Some((raw_key, raw_value)) => {
                let key = decode(raw_key, offset)?;
                if key.is_empty() {
                    return Err(UrlFormError::EmptyKey(offset));
                }
                let value_offset = offset + raw_key.len() + 1;
                let value = decode(raw_value, value_offset)?;
                dict.insert(key, convert_auto(Value::String(value)));
            }
            None => {
                let key = decode(pair, offset)?;
                if key.is_empty() {
                    return Err(UrlFormError::EmptyKey(offset));
                }
                dict.insert(key, Value::Null);
            }
        }
        offset += pair.len() + 1;
    }
    Ok(Value::Dict(dict))
}

fn decode(raw: &str, base_offset: usize) -> Result<String, UrlFormError> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or(UrlFormError::InvalidPercentEscape(base_offset + i))?;
                let hi = hex_digit(hex[0]).ok_or(UrlFormError::InvalidPercentEscape(base_offset + i))?;
                let lo = hex_digit(hex[1]).ok_or(UrlFormError::InvalidPercentEscape(base_offset + i))?;
                out.push(hi << 4 | lo);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| UrlFormError::InvalidUtf8(base_offset))
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// URL-encoded form bodies are only ever deserialized by this codec;
/// serialization is not supported.
///
/// # Errors
/// Always returns [`UrlFormError::SerializationNotSupported`].
pub fn emit(_dict: &Dict) -> Result<String, UrlFormError> {
    Err(UrlFormError::SerializationNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_key_becomes_null() {
        let v = parse("a=1&b&c=hi").unwrap();
        let d = v.as_dict().unwrap();
        assert_eq!(d.get("a").unwrap().as_int64().unwrap(), 1);
        assert!(d.get("b").unwrap().is_null());
        assert_eq!(d.get("c").unwrap().as_str().unwrap(), "hi");
    }

    #[test]
    fn semicolon_and_ampersand_are_equivalent_separators() {
        let v = parse("a=1;b=2&c=3").unwrap();
        let d = v.as_dict().unwrap();
        assert_eq!(d.get("a").unwrap().as_int64().unwrap(), 1);
        assert_eq!(d.get("b").unwrap().as_int64().unwrap(), 2);
        assert_eq!(d.get("c").unwrap().as_int64().unwrap(), 3);
    }

    #[test]
    fn plus_decodes_to_space_and_percent_escapes_decode() {
        let v = parse("name=hello+world%21").unwrap();
        assert_eq!(
            v.as_dict().unwrap().get("name").unwrap().as_str().unwrap(),
            "hello world!"
        );
    }

    #[test]
    fn values_autoconvert_by_type() {
        let v = parse("flag=true&n=3.5&s=hello").unwrap();
        let d = v.as_dict().unwrap();
        assert_eq!(d.get("flag").unwrap().as_bool().unwrap(), true);
        assert_eq!(d.get("n").unwrap().as_double().unwrap(), 3.5);
        assert_eq!(d.get("s").unwrap().as_str().unwrap(), "hello");
    }

    #[test]
    fn empty_body_is_empty_dict() {
        let v = parse("").unwrap();
        assert!(v.is_empty_dict());
    }

    #[test]
    fn bad_percent_escape_errors() {
        let err = parse("a=%zz").unwrap_err();
        assert!(matches!(err, UrlFormError::InvalidPercentEscape(_)));
    }

    #[test]
    fn emit_is_not_supported() {
        let mut d = Dict::new();
        d.insert("a", Value::Int64(1));
        assert_eq!(emit(&d).unwrap_err(), UrlFormError::SerializationNotSupported);
    }
}
