//! Shared field-extraction helpers used by every entity's PARSE/DUMP.

use slurmrest_core::{Dict, Value};

/// Read a required dict out of `tree_node`, or an empty dict if this
/// node is not itself a dict (PARSE for a missing/null body should yield
/// defaults, not an error — the caller decides whether an empty PARSE
/// result is itself an error for that endpoint).
pub(crate) fn dict_or_default(tree_node: &Value) -> Dict {
    match tree_node {
        Value::Dict(d) => d.clone(),
        _ => Dict::new(),
    }
}

pub(crate) fn get_str(dict: &Dict, key: &str) -> Option<String> {
    dict.get(key).and_then(|v| v.as_str().ok()).map(str::to_string)
}

pub(crate) fn get_u32(dict: &Dict, key: &str) -> Option<u32> {
    dict.get(key)
        .and_then(|v| v.as_int64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

pub(crate) fn get_i32(dict: &Dict, key: &str) -> Option<i32> {
    dict.get(key)
        .and_then(|v| v.as_int64().ok())
        .and_then(|v| i32::try_from(v).ok())
}

pub(crate) fn get_str_list(dict: &Dict, key: &str) -> Vec<String> {
    dict.get(key)
        .and_then(|v| v.as_list().ok())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str().ok())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn get_u32_list(dict: &Dict, key: &str) -> Vec<u32> {
    dict.get(key)
        .and_then(|v| v.as_list().ok())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_int64().ok())
                .filter_map(|v| u32::try_from(v).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn set_opt_str(dict: &mut Dict, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        dict.insert(key, Value::String(v.to_string()));
    }
}

pub(crate) fn set_str(dict: &mut Dict, key: &str, value: &str) {
    dict.insert(key, Value::String(value.to_string()));
}

pub(crate) fn set_i64(dict: &mut Dict, key: &str, value: i64) {
    dict.insert(key, Value::Int64(value));
}

pub(crate) fn set_opt_u32(dict: &mut Dict, key: &str, value: Option<u32>) {
    if let Some(v) = value {
        dict.insert(key, Value::Int64(i64::from(v)));
    }
}

pub(crate) fn set_str_list(dict: &mut Dict, key: &str, values: &[String]) {
    dict.insert(
        key,
        Value::List(values.iter().map(|v| Value::String(v.clone())).collect()),
    );
}
