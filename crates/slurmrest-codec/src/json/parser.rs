//! Push-down JSON parser: a single loop over a flat token stream, backed by
//! an explicit container stack instead of recursive descent, so nesting
//! depth is a plain `Vec` length check rather than native call-stack
//! consumption (spec §4.C/§9).

use slurmrest_core::{Dict, Value};

use super::error::{JsonError, JsonErrorKind};
use super::lexer::{Lexer, Token};

/// Maximum container nesting depth. The 51st open bracket/brace fails with
/// [`JsonErrorKind::ParseDepthMax`].
pub const MAX_DEPTH: usize = 50;

#[derive(Debug, PartialEq)]
enum ListState {
    /// Just opened; a value or an immediate `]` are both legal.
    AwaitingValueOrClose,
    /// After a `,`; a value is required, `]` is not legal.
    AwaitingValue,
    /// After a value; a `,` or `]` are both legal.
    AwaitingCommaOrClose,
}

#[derive(Debug, PartialEq)]
enum DictState {
    /// Just opened; a key or an immediate `}` are both legal.
    AwaitingKeyOrClose,
    /// After a `,`; a key is required, `}` is not legal.
    AwaitingKey,
    /// A key was read; a `:` is required next.
    AwaitingColon(String),
    /// A key and `:` were read; a value is required next.
    AwaitingValue(String),
    /// After a complete entry; a `,` or `}` are both legal.
    AwaitingCommaOrClose,
}

enum Frame {
    List { items: Vec<Value>, state: ListState },
    Dict { dict: Dict, state: DictState },
}

/// Parse a complete JSON document from `input`, producing a [`Value`] tree.
///
/// Tolerates `//` and `/* */` comments and unquoted boolean/null/numeric
/// barewords between structural characters, matching the source codec's
/// relaxed grammar. Rejects a leading UTF-16/UTF-32 byte-order mark
/// outright and silently consumes a leading UTF-8 BOM.
///
/// # Errors
/// Returns [`JsonError`] on any grammar violation, depth overflow, or
/// forbidden codepoint, with the 1-based line/column of the offending
/// token.
pub fn parse(input: &[u8]) -> Result<Value, JsonError> {
    let mut lexer = Lexer::new(input)?;
    let mut stack: Vec<Frame> = Vec::new();
    let mut result: Option<Value> = None;

    loop {
        let Some((token, line, col)) = lexer.next_token()? else {
            return match stack.last() {
                Some(Frame::List { .. }) => {
                    Err(JsonError::new(JsonErrorKind::UnclosedList, lexer.line(), lexer.col()))
                }
                Some(Frame::Dict { .. }) => Err(JsonError::new(
                    JsonErrorKind::UnclosedDictionary,
                    lexer.line(),
                    lexer.col(),
                )),
                None => result.ok_or_else(|| {
                    JsonError::new(JsonErrorKind::IllegalTermination, lexer.line(), lexer.col())
                }),
            };
        };

        match token {
            Token::LBrace => {
                check_can_open(&stack, &result, JsonErrorKind::UnexpectedDictionary, line, col)?;
                if stack.len() >= MAX_DEPTH {
                    return Err(JsonError::new(JsonErrorKind::ParseDepthMax, line, col));
                }
                stack.push(Frame::Dict {
                    dict: Dict::new(),
                    state: DictState::AwaitingKeyOrClose,
                });
            }
            Token::LBracket => {
                check_can_open(&stack, &result, JsonErrorKind::UnexpectedList, line, col)?;
                if stack.len() >= MAX_DEPTH {
                    return Err(JsonError::new(JsonErrorKind::ParseDepthMax, line, col));
                }
                stack.push(Frame::List {
                    items: Vec::new(),
                    state: ListState::AwaitingValueOrClose,
                });
            }
            Token::RBrace => close_dict(&mut stack, &mut result, line, col)?,
            Token::RBracket => close_list(&mut stack, &mut result, line, col)?,
            Token::Comma => match stack.last_mut() {
                Some(Frame::List { state, .. }) if *state == ListState::AwaitingCommaOrClose => {
                    *state = ListState::AwaitingValue;
                }
                Some(Frame::Dict { state, .. }) if *state == DictState::AwaitingCommaOrClose => {
                    *state = DictState::AwaitingKey;
                }
                _ => return Err(JsonError::new(JsonErrorKind::UnexpectedComma, line, col)),
            },
            Token::Colon => match stack.last_mut() {
                Some(Frame::Dict { state, .. })
                    if matches!(state, DictState::AwaitingColon(_)) =>
                {
                    let DictState::AwaitingColon(key) =
                        std::mem::replace(state, DictState::AwaitingCommaOrClose)
                    else {
                        unreachable!("matched above")
                    };
                    *state = DictState::AwaitingValue(key);
                }
                _ => return Err(JsonError::new(JsonErrorKind::InvalidDictionaryColon, line, col)),
            },
            Token::Scalar { value, quoted } => {
                place_scalar(&mut stack, &mut result, value, quoted, line, col)?;
            }
        }
    }
}

fn check_can_open(
    stack: &[Frame],
    result: &Option<Value>,
    err_kind: JsonErrorKind,
    line: usize,
    col: usize,
) -> Result<(), JsonError> {
    match stack.last() {
        None if result.is_some() => Err(JsonError::new(err_kind, line, col)),
        None => Ok(()),
        Some(Frame::List { state, .. }) => match state {
            ListState::AwaitingValueOrClose | ListState::AwaitingValue => Ok(()),
            ListState::AwaitingCommaOrClose => Err(JsonError::new(err_kind, line, col)),
        },
        Some(Frame::Dict { state, .. }) => match state {
            DictState::AwaitingValue(_) => Ok(()),
            _ => Err(JsonError::new(err_kind, line, col)),
        },
    }
}

fn attach_closed(stack: &mut [Frame], result: &mut Option<Value>, value: Value) {
    match stack.last_mut() {
        None => *result = Some(value),
        Some(Frame::List { items, state }) => {
            items.push(value);
            *state = ListState::AwaitingCommaOrClose;
        }
        Some(Frame::Dict { dict, state }) => {
            let DictState::AwaitingValue(key) =
                std::mem::replace(state, DictState::AwaitingCommaOrClose)
            else {
                unreachable!("a container can only close into a parent awaiting a value")
            };
            dict.insert(key, value);
        }
    }
}

fn close_dict(
    stack: &mut Vec<Frame>,
    result: &mut Option<Value>,
    line: usize,
    col: usize,
) -> Result<(), JsonError> {
    match stack.pop() {
        Some(Frame::Dict { dict, state }) => match state {
            DictState::AwaitingKeyOrClose | DictState::AwaitingCommaOrClose => {
                attach_closed(stack, result, Value::Dict(dict));
                Ok(())
            }
            DictState::AwaitingKey => {
                Err(JsonError::new(JsonErrorKind::UnexpectedDictionaryEnd, line, col))
            }
            DictState::AwaitingColon(_) | DictState::AwaitingValue(_) => {
                Err(JsonError::new(JsonErrorKind::IncompleteDictionaryKey, line, col))
            }
        },
        Some(Frame::List { .. }) | None => {
            Err(JsonError::new(JsonErrorKind::UnexpectedDictionaryEnd, line, col))
        }
    }
}

fn close_list(
    stack: &mut Vec<Frame>,
    result: &mut Option<Value>,
    line: usize,
    col: usize,
) -> Result<(), JsonError> {
    match stack.pop() {
        Some(Frame::List { items, state }) => match state {
            ListState::AwaitingValueOrClose | ListState::AwaitingCommaOrClose => {
                attach_closed(stack, result, Value::List(items));
                Ok(())
            }
            ListState::AwaitingValue => {
                Err(JsonError::new(JsonErrorKind::UnexpectedListEnd, line, col))
            }
        },
        Some(Frame::Dict { .. }) | None => {
            Err(JsonError::new(JsonErrorKind::UnexpectedListEnd, line, col))
        }
    }
}

fn place_scalar(
    stack: &mut [Frame],
    result: &mut Option<Value>,
    value: Value,
    quoted: bool,
    line: usize,
    col: usize,
) -> Result<(), JsonError> {
    match stack.last_mut() {
        None => {
            if result.is_some() {
                return Err(JsonError::new(unexpected_scalar_kind(quoted), line, col));
            }
            *result = Some(value);
            Ok(())
        }
        Some(Frame::List { items, state }) => match state {
            ListState::AwaitingValueOrClose | ListState::AwaitingValue => {
                items.push(value);
                *state = ListState::AwaitingCommaOrClose;
                Ok(())
            }
            ListState::AwaitingCommaOrClose => {
                Err(JsonError::new(unexpected_scalar_kind(quoted), line, col))
            }
        },
        Some(Frame::Dict { dict, state }) => match state {
            DictState::AwaitingKeyOrClose | DictState::AwaitingKey => {
                let Value::String(key) = value else {
                    return Err(JsonError::new(JsonErrorKind::InvalidDictionaryKey, line, col));
                };
                if key.is_empty() {
                    return Err(JsonError::new(JsonErrorKind::InvalidDictionaryKey, line, col));
                }
                *state = DictState::AwaitingColon(key);
                Ok(())
            }
            DictState::AwaitingColon(_) => {
                Err(JsonError::new(JsonErrorKind::InvalidDictionaryColon, line, col))
            }
            DictState::AwaitingValue(_) => {
                let DictState::AwaitingValue(key) =
                    std::mem::replace(state, DictState::AwaitingCommaOrClose)
                else {
                    unreachable!("matched above")
                };
                dict.insert(key, value);
                Ok(())
            }
            DictState::AwaitingCommaOrClose => {
                Err(JsonError::new(unexpected_scalar_kind(quoted), line, col))
            }
        },
    }
}

fn unexpected_scalar_kind(quoted: bool) -> JsonErrorKind {
    if quoted {
        JsonErrorKind::UnexpectedQuotedString
    } else {
        JsonErrorKind::UnexpectedUnquotedString
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_object_and_array() {
        let v = parse(br#"{"a": [1, 2, {"b": true}], "c": null}"#).unwrap();
        let d = v.as_dict().unwrap();
        assert_eq!(d.get("a").unwrap().as_list().unwrap().len(), 3);
        assert!(d.get("c").unwrap().is_null());
    }

    #[test]
    fn depth_50_is_ok_51_fails() {
        let mut s = String::new();
        for _ in 0..50 {
            s.push('[');
        }
        s.push('1');
        for _ in 0..50 {
            s.push(']');
        }
        assert!(parse(s.as_bytes()).is_ok());

        let mut s2 = String::new();
        for _ in 0..51 {
            s2.push('[');
        }
        s2.push('1');
        for _ in 0..51 {
            s2.push(']');
        }
        let err = parse(s2.as_bytes()).unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::ParseDepthMax);
    }

    #[test]
    fn rejects_utf16le_bom() {
        let err = parse(&[0xFF, 0xFE, b'{', 0]).unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::Utf16LeSchema);
    }

    #[test]
    fn consumes_utf8_bom_silently() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"{}");
        let v = parse(&input).unwrap();
        assert!(v.is_empty_dict());
    }

    #[test]
    fn rejects_trailing_comma_in_object() {
        let err = parse(br#"{"a":1,}"#).unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::UnexpectedDictionaryEnd);
    }

    #[test]
    fn rejects_trailing_comma_in_array() {
        let err = parse(b"[1,]").unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::UnexpectedListEnd);
    }

    #[test]
    fn unterminated_string_errors() {
        let err = parse(b"\"abc").unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::UnclosedQuotedString);
    }

    #[test]
    fn later_duplicate_key_wins() {
        let v = parse(br#"{"a":1,"a":2}"#).unwrap();
        assert_eq!(v.as_dict().unwrap().get("a").unwrap().as_int64().unwrap(), 2);
    }

    #[test]
    fn tolerates_barewords_and_comments() {
        let v = parse(b"{yes: on, /* c */ n: off} // trailing").unwrap();
        let d = v.as_dict().unwrap();
        assert_eq!(d.get("yes").unwrap().as_bool().unwrap(), true);
        assert_eq!(d.get("n").unwrap().as_bool().unwrap(), false);
    }

    #[test]
    fn bareword_non_finite_tokens_parse_as_doubles() {
        let v = parse(b"[Infinity, -Infinity, NaN, -NaN]").unwrap();
        let items: Vec<_> = v.as_list().unwrap().to_vec();
        assert_eq!(items[0].as_double().unwrap(), f64::INFINITY);
        assert_eq!(items[1].as_double().unwrap(), f64::NEG_INFINITY);
        assert!(items[2].as_double().unwrap().is_nan());
        assert!(items[3].as_double().unwrap().is_nan());
    }

    #[test]
    fn unicode_escape_accepts_4_to_6_hex_digits() {
        let v = parse(br#""A""#).unwrap();
        assert_eq!(v.as_str().unwrap(), "A");

        let mut input = Vec::from(&b"\""[..]);
        input.extend_from_slice(b"\\u");
        input.extend_from_slice(b"1F600"); // 5 hex digits, within the accepted range
        input.push(b'"');
        let v = parse(&input).unwrap();
        assert_eq!(v.as_str().unwrap(), "\u{1F600}");
    }

    #[test]
    fn rejects_trailing_content_after_top_level_value() {
        let err = parse(b"{} {}").unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::UnexpectedDictionary);
    }

    #[test]
    fn empty_input_is_illegal_termination() {
        let err = parse(b"   ").unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::IllegalTermination);
    }

    #[test]
    fn unclosed_containers_report_unclosed_kind() {
        assert_eq!(
            parse(b"{\"a\":1").unwrap_err().kind,
            JsonErrorKind::UnclosedDictionary
        );
        assert_eq!(parse(b"[1,2").unwrap_err().kind, JsonErrorKind::UnclosedList);
    }
}
