//! YAML emission over the same [`Value`] tree the JSON codec renders,
//! for `Accept: application/yaml` content negotiation (spec §6). Only
//! emission is implemented; the wire contract never accepts YAML
//! request bodies.

use slurmrest_core::{Dict, Value};
use thiserror::Error;

/// Error returned by [`emit`].
#[derive(Debug, Error)]
pub enum YamlError {
    /// The underlying YAML library failed to render the document.
    #[error("failed to emit yaml: {0}")]
    Emit(#[from] serde_yaml_ng::Error),
}

/// Render `value` as a YAML document.
///
/// # Errors
/// Returns [`YamlError`] if the underlying YAML library fails to render
/// the document.
pub fn emit(value: &Value) -> Result<String, YamlError> {
    Ok(serde_yaml_ng::to_string(&to_yaml(value))?)
}

fn to_yaml(value: &Value) -> serde_yaml_ng::Value {
    match value {
        Value::Null => serde_yaml_ng::Value::Null,
        Value::Bool(b) => serde_yaml_ng::Value::Bool(*b),
        Value::Int64(i) => serde_yaml_ng::Value::Number((*i).into()),
        Value::Double(d) => serde_yaml_ng::Value::Number((*d).into()),
        Value::String(s) => serde_yaml_ng::Value::String(s.clone()),
        Value::List(items) => serde_yaml_ng::Value::Sequence(items.iter().map(to_yaml).collect()),
        Value::Dict(dict) => serde_yaml_ng::Value::Mapping(to_mapping(dict)),
    }
}

fn to_mapping(dict: &Dict) -> serde_yaml_ng::Mapping {
    let mut mapping = serde_yaml_ng::Mapping::new();
    for (key, value) in dict.iter() {
        mapping.insert(serde_yaml_ng::Value::String(key.to_string()), to_yaml(value));
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_scalar_mapping() {
        let mut d = Dict::new();
        d.insert("name", Value::String("job".into()));
        d.insert("count", Value::Int64(3));
        let s = emit(&Value::Dict(d)).unwrap();
        assert_eq!(s, "name: job\ncount: 3\n");
    }

    #[test]
    fn emits_nested_list() {
        let mut d = Dict::new();
        d.insert("tags", Value::List(vec![Value::String("a".into()), Value::String("b".into())]));
        let s = emit(&Value::Dict(d)).unwrap();
        assert_eq!(s, "tags:\n- a\n- b\n");
    }

    #[test]
    fn emits_null_and_bool() {
        let mut d = Dict::new();
        d.insert("active", Value::Bool(true));
        d.insert("parent", Value::Null);
        let s = emit(&Value::Dict(d)).unwrap();
        assert_eq!(s, "active: true\nparent: null\n");
    }
}
