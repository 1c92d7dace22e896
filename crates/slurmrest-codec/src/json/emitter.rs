//! JSON emission: compact or pretty-printed, with the UTF-8 BOM and
//! `\uXXXXXX` non-ASCII escaping the wire contract expects (spec §4.C).

use std::fmt::Write as _;

use slurmrest_core::Value;

/// Controls how a [`Value`] tree is rendered to JSON text.
#[derive(Debug, Clone, Copy)]
pub struct JsonEmitOptions {
    /// Insert newlines and two-space indentation between container
    /// members. `false` produces the most compact legal encoding.
    pub pretty: bool,
    /// Prefix the output with a UTF-8 byte-order mark, matching what the
    /// source codec writes.
    pub write_bom: bool,
    /// When `true`, a non-finite [`Value::Double`] (`NaN`/`±Infinity`) is
    /// emitted as `null` instead of the bare token, for strict-JSON
    /// consumers. Defaults to `false` to match the source codec, which
    /// emits the bare tokens.
    pub non_finite_as_null: bool,
}

impl Default for JsonEmitOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            write_bom: false,
            non_finite_as_null: false,
        }
    }
}

/// Render `value` to a JSON `String` per `options`.
#[must_use]
pub fn emit(value: &Value, options: JsonEmitOptions) -> String {
    let mut out = String::new();
    if options.write_bom {
        out.push('\u{FEFF}');
    }
    write_value(&mut out, value, options, 0);
    out
}

fn write_value(out: &mut String, value: &Value, options: JsonEmitOptions, depth: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int64(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Double(d) => write_double(out, *d, options),
        Value::String(s) => write_string(out, s),
        Value::List(items) => write_list(out, items, options, depth),
        Value::Dict(dict) => write_dict(out, dict, options, depth),
    }
}

fn write_double(out: &mut String, d: f64, options: JsonEmitOptions) {
    if d.is_finite() {
        write_scientific(out, d);
        return;
    }
    if options.non_finite_as_null {
        out.push_str("null");
        return;
    }
    if d.is_nan() {
        out.push_str(if d.is_sign_negative() { "-NaN" } else { "NaN" });
    } else if d > 0.0 {
        out.push_str("Infinity");
    } else {
        out.push_str("-Infinity");
    }
}

/// Renders a finite double the way C's `printf("%e", ...)` would: one
/// digit before the decimal point, six after, and a signed, zero-padded
/// (minimum two digits) exponent.
fn write_scientific(out: &mut String, d: f64) {
    let formatted = format!("{d:.6e}");
    let (mantissa, exp_str) = formatted.split_once('e').expect("scientific format always contains 'e'");
    let exp: i32 = exp_str.parse().expect("exponent parses as an integer");
    let sign = if exp < 0 { '-' } else { '+' };
    let _ = write!(out, "{mantissa}e{sign}{:02}", exp.abs());
}

fn write_list(out: &mut String, items: &[Value], options: JsonEmitOptions, depth: usize) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        newline_indent(out, options, depth + 1);
        write_value(out, item, options, depth + 1);
    }
    newline_indent(out, options, depth);
    out.push(']');
}

fn write_dict(out: &mut String, dict: &slurmrest_core::Dict, options: JsonEmitOptions, depth: usize) {
    if dict.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push('{');
    for (i, (key, value)) in dict.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        newline_indent(out, options, depth + 1);
        write_string(out, key);
        out.push(':');
        if options.pretty {
            out.push(' ');
        }
        write_value(out, value, options, depth + 1);
    }
    newline_indent(out, options, depth);
    out.push('}');
}

fn newline_indent(out: &mut String, options: JsonEmitOptions, depth: usize) {
    if !options.pretty {
        return;
    }
    out.push('\n');
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:06x}", c as u32);
            }
            c if c.is_ascii() => out.push(c),
            c => {
                let _ = write!(out, "\\u{:06x}", c as u32);
            }
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use slurmrest_core::Dict;

    #[test]
    fn emits_compact_object() {
        let mut d = Dict::new();
        d.insert("a", Value::Int64(1));
        d.insert("b", Value::Bool(true));
        let s = emit(&Value::Dict(d), JsonEmitOptions::default());
        assert_eq!(s, r#"{"a":1,"b":true}"#);
    }

    #[test]
    fn emits_pretty_nested() {
        let mut d = Dict::new();
        d.insert("a", Value::List(vec![Value::Int64(1), Value::Int64(2)]));
        let s = emit(
            &Value::Dict(d),
            JsonEmitOptions {
                pretty: true,
                ..Default::default()
            },
        );
        assert_eq!(s, "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
    }

    #[test]
    fn escapes_non_ascii_as_six_hex_digits() {
        let s = emit(&Value::String("caf\u{00E9}".into()), JsonEmitOptions::default());
        assert_eq!(s, "\"caf\\u0000e9\"");
    }

    #[test]
    fn finite_double_uses_scientific_notation() {
        assert_eq!(emit(&Value::Double(3.5), JsonEmitOptions::default()), "3.500000e+00");
        assert_eq!(emit(&Value::Double(-3.5), JsonEmitOptions::default()), "-3.500000e+00");
        assert_eq!(emit(&Value::Double(0.0), JsonEmitOptions::default()), "0.000000e+00");
        assert_eq!(emit(&Value::Double(1500.0), JsonEmitOptions::default()), "1.500000e+03");
    }

    #[test]
    fn write_bom_prefixes_output() {
        let s = emit(
            &Value::Null,
            JsonEmitOptions {
                write_bom: true,
                ..Default::default()
            },
        );
        assert!(s.starts_with('\u{FEFF}'));
    }

    #[test]
    fn non_finite_double_defaults_to_bare_token() {
        let s = emit(&Value::Double(f64::NAN), JsonEmitOptions::default());
        assert_eq!(s, "NaN");
        let s = emit(&Value::Double(f64::INFINITY), JsonEmitOptions::default());
        assert_eq!(s, "Infinity");
    }

    #[test]
    fn non_finite_double_as_null_when_requested() {
        let s = emit(
            &Value::Double(f64::NAN),
            JsonEmitOptions {
                non_finite_as_null: true,
                ..Default::default()
            },
        );
        assert_eq!(s, "null");
    }

    #[test]
    fn round_trips_through_parse() {
        let original = {
            let mut d = Dict::new();
            d.insert("name", Value::String("job".into()));
            d.insert("count", Value::Int64(3));
            d.insert("tags", Value::List(vec![Value::String("x".into())]));
            Value::Dict(d)
        };
        let text = emit(&original, JsonEmitOptions::default());
        let parsed = super::super::parser::parse(text.as_bytes()).unwrap();
        assert_eq!(parsed, original);
    }
}
