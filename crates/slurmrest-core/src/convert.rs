//! Reversible type coercion between [`Value`] primitives.
//!
//! Mirrors the YAML-1.1-flavored `data_convert_type` rules from the source:
//! a pure function that attempts to reinterpret a primitive `Value` as a
//! different primitive tag, using regex-equivalent string matching for the
//! `String` source case. Lists and dicts are never coerced.

use crate::value::Value;

pub use crate::value::ValueType;

/// Error returned when a [`convert`] attempt fails.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ConvertError {
    /// The source value could not be reinterpreted as the requested
    /// target type.
    #[error("cannot convert {from} to {to}")]
    Unsupported {
        /// Tag of the value that was given.
        from: ValueType,
        /// Tag that was requested.
        to: ValueType,
    },
    /// `convert` does not coerce [`Value::List`]/[`Value::Dict`].
    #[error("containers ({0}) are never coerced")]
    Container(ValueType),
}

/// Attempt to reinterpret `value` as `target`, per the source → target
/// table in spec §3. Never touches `List`/`Dict`.
///
/// # Errors
/// Returns [`ConvertError`] if the pair isn't in the reversible subset the
/// table defines, or if `value` is a container.
pub fn convert(value: &Value, target: ValueType) -> Result<Value, ConvertError> {
    if matches!(value, Value::List(_) | Value::Dict(_)) {
        return Err(ConvertError::Container(value.get_type()));
    }

    match (value, target) {
        (Value::Null, ValueType::Bool) => Ok(Value::Bool(false)),
        (Value::Null, ValueType::String) => Ok(Value::String("null".to_string())),
        (Value::Null, ValueType::Null) => Ok(Value::Null),

        (Value::Bool(b), ValueType::Bool) => Ok(Value::Bool(*b)),
        (Value::Bool(b), ValueType::String) => {
            Ok(Value::String(if *b { "true" } else { "false" }.to_string()))
        }

        (Value::Int64(i), ValueType::Bool) => Ok(Value::Bool(*i != 0)),
        (Value::Int64(i), ValueType::Int64) => Ok(Value::Int64(*i)),
        (Value::Int64(i), ValueType::String) => Ok(Value::String(i.to_string())),

        (Value::Double(d), ValueType::Bool) => Ok(Value::Bool(*d != 0.0)),
        (Value::Double(d), ValueType::Double) => Ok(Value::Double(*d)),
        (Value::Double(d), ValueType::String) => Ok(Value::String(format_double(*d))),

        (Value::String(s), ValueType::Bool) => {
            // The named true/false token sets take priority; a string
            // matching neither still converts rather than erroring — a
            // non-empty string is truthy, an empty string is falsy. This
            // matches the source's documented boundary behavior
            // (`convert_type("maybe", Bool)` → `true`,
            // `convert_type("", Bool)` → `false`).
            Ok(Value::Bool(parse_bool(s).unwrap_or(!s.is_empty())))
        }
        (Value::String(s), ValueType::Int64) => {
            parse_int64(s).map(Value::Int64).ok_or(unsupported(value, target))
        }
        (Value::String(s), ValueType::Double) => {
            parse_double(s).map(Value::Double).ok_or(unsupported(value, target))
        }
        (Value::String(s), ValueType::String) => Ok(Value::String(s.clone())),
        (Value::String(s), ValueType::Null) => {
            if is_null_token(s) {
                Ok(Value::Null)
            } else {
                Err(unsupported(value, target))
            }
        }

        _ => Err(unsupported(value, target)),
    }
}

fn unsupported(value: &Value, target: ValueType) -> ConvertError {
    ConvertError::Unsupported {
        from: value.get_type(),
        to: target,
    }
}

/// Auto-classify a value with no explicit target: try `Null`, `Bool`,
/// `Int64`, `Double` in that order, falling back to the original value
/// (typically a `String`) on failure. Used for URL-form values and
/// unquoted JSON barewords.
#[must_use]
pub fn convert_auto(value: Value) -> Value {
    let Value::String(ref s) = value else {
        return value;
    };
    if is_null_token(s) {
        return Value::Null;
    }
    if let Some(b) = parse_bool(s) {
        return Value::Bool(b);
    }
    if let Some(i) = parse_int64(s) {
        return Value::Int64(i);
    }
    if let Some(d) = parse_double(s) {
        return Value::Double(d);
    }
    value
}

fn format_double(d: f64) -> String {
    format!("{d:e}")
}

fn is_null_token(s: &str) -> bool {
    s == "~" || s.eq_ignore_ascii_case("null")
}

const TRUE_TOKENS: &[&str] = &["y", "yes", "t", "true", "on"];
const FALSE_TOKENS: &[&str] = &["n", "no", "f", "false", "off"];

fn parse_bool(s: &str) -> Option<bool> {
    let lower = s.to_ascii_lowercase();
    if TRUE_TOKENS.contains(&lower.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

fn parse_int64(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i64>().ok()
}

fn parse_double(s: &str) -> Option<f64> {
    // `^[+-]?[0-9]*\.[0-9]*(|[eE][+-]?[0-9]+)$` — requires a literal decimal
    // point; at least one of the integer/fractional parts may be empty but
    // not both (`.` alone is not a number).
    let rest = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match rest.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (rest, None),
    };
    let Some((int_part, frac_part)) = mantissa.split_once('.') else {
        return None;
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    if let Some(e) = exponent {
        let e_body = e.strip_prefix(['+', '-']).unwrap_or(e);
        if e_body.is_empty() || !e_body.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_to_double_scientific() {
        let v = convert(&Value::String("3.14e2".to_string()), ValueType::Double).unwrap();
        assert_eq!(v.as_double().unwrap(), 314.0);
    }

    #[test]
    fn string_to_bool_non_matching_falls_through_to_true() {
        let v = convert(&Value::String("maybe".to_string()), ValueType::Bool).unwrap();
        assert_eq!(v.as_bool().unwrap(), true);
    }

    #[test]
    fn empty_string_to_bool_is_false() {
        let v = convert(&Value::String(String::new()), ValueType::Bool).unwrap();
        assert_eq!(v.as_bool().unwrap(), false);
    }

    #[test]
    fn null_round_trips_through_string() {
        let s = convert(&Value::Null, ValueType::String).unwrap();
        assert_eq!(s.as_str().unwrap(), "null");
        let back = convert(&s, ValueType::Null).unwrap();
        assert!(back.is_null());
    }

    #[test]
    fn bool_round_trips_through_string() {
        for b in [true, false] {
            let s = convert(&Value::Bool(b), ValueType::String).unwrap();
            let back = convert(&s, ValueType::Bool).unwrap();
            assert_eq!(back.as_bool().unwrap(), b);
        }
    }

    #[test]
    fn int64_round_trips_through_string() {
        for i in [0_i64, -42, 1_000_000] {
            let s = convert(&Value::Int64(i), ValueType::String).unwrap();
            let back = convert(&s, ValueType::Int64).unwrap();
            assert_eq!(back.as_int64().unwrap(), i);
        }
    }

    #[test]
    fn containers_never_coerce() {
        assert!(matches!(
            convert(&Value::List(vec![]), ValueType::String),
            Err(ConvertError::Container(ValueType::List))
        ));
    }

    #[test]
    fn convert_auto_tries_null_bool_int_double_then_string() {
        assert!(convert_auto(Value::String("~".into())).is_null());
        assert_eq!(
            convert_auto(Value::String("yes".into())).as_bool().unwrap(),
            true
        );
        assert_eq!(
            convert_auto(Value::String("42".into())).as_int64().unwrap(),
            42
        );
        assert_eq!(
            convert_auto(Value::String("3.5".into())).as_double().unwrap(),
            3.5
        );
        assert_eq!(
            convert_auto(Value::String("hello".into())).as_str().unwrap(),
            "hello"
        );
    }

    #[test]
    fn convert_auto_leaves_unmatched_empty_string_as_string() {
        // `target=NONE` only tries the strict named token sets for Bool;
        // an empty string matches none of Null/Bool/Int64/Double and is
        // left as a `String`. (The `""` → `false` boundary behavior is
        // specific to an *explicit* `convert(_, Bool)` request — see
        // `empty_string_to_bool_is_false` above.)
        let v = convert_auto(Value::String(String::new()));
        assert_eq!(v.as_str().unwrap(), "");
    }
}
