//! Slash-separated path traversal of [`Value::Dict`] trees.

use crate::value::{Dict, Value, ValueType};

/// Error returned by [`resolve_path`]/[`define_path`].
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum PathError {
    /// No child exists at this path.
    #[error("path not found: {0}")]
    NotFound(String),
    /// An intermediate segment exists but is neither [`Value::Dict`] nor
    /// [`Value::Null`], so it cannot be traversed or upgraded into a dict.
    #[error("path segment {segment:?} is a {found}, not a dict")]
    Conflict {
        /// The offending path segment.
        segment: String,
        /// The tag actually found there.
        found: ValueType,
    },
}

/// Resolve `path` (a `/`-separated string) against `root`, which must be a
/// [`Value::Dict`] at each traversed level. Returns the child [`Value`] or
/// [`PathError::NotFound`].
///
/// An empty path resolves to `root` itself.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    let mut node = root;
    for segment in split(path) {
        let dict = as_dict(node, segment)?;
        node = dict
            .get(segment)
            .ok_or_else(|| PathError::NotFound(path.to_string()))?;
    }
    Ok(node)
}

/// Create intermediate dicts as needed so that `path` resolves, returning
/// the (possibly freshly created, [`Value::Null`]) leaf.
///
/// Rejects a conflict where an intermediate segment is neither
/// [`Value::Dict`] nor [`Value::Null`] (a `Null` intermediate is upgraded
/// in place to a `Dict`).
pub fn define_path<'a>(root: &'a mut Value, path: &str) -> Result<&'a mut Value, PathError> {
    let mut node = root;
    for segment in split(path) {
        if node.is_null() {
            node.set_dict();
        }
        let found = node.get_type();
        let Value::Dict(dict) = node else {
            return Err(PathError::Conflict {
                segment: segment.to_string(),
                found,
            });
        };
        node = dict.key_set(segment);
    }
    Ok(node)
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn as_dict<'a>(node: &'a Value, segment: &str) -> Result<&'a Dict, PathError> {
    match node {
        Value::Dict(d) => Ok(d),
        other => Err(PathError::Conflict {
            segment: segment.to_string(),
            found: other.get_type(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_after_define_returns_the_defined_node() {
        let mut root = Value::Dict(Dict::new());
        {
            let leaf = define_path(&mut root, "a/b/c").unwrap();
            leaf.set_int64(42);
        }
        let resolved = resolve_path(&root, "a/b/c").unwrap();
        assert_eq!(resolved.as_int64().unwrap(), 42);
    }

    #[test]
    fn empty_path_resolves_to_root() {
        let root = Value::Dict(Dict::new());
        assert!(matches!(resolve_path(&root, ""), Ok(Value::Dict(_))));
    }

    #[test]
    fn resolve_missing_path_not_found() {
        let root = Value::Dict(Dict::new());
        assert!(matches!(
            resolve_path(&root, "x/y"),
            Err(PathError::NotFound(_))
        ));
    }

    #[test]
    fn define_path_rejects_conflicting_intermediate() {
        let mut root = Value::Dict(Dict::new());
        root.as_dict_mut().unwrap().insert("a", Value::Int64(1));
        let err = define_path(&mut root, "a/b").unwrap_err();
        assert!(matches!(err, PathError::Conflict { .. }));
    }

    #[test]
    fn define_path_upgrades_null_intermediate_to_dict() {
        let mut root = Value::Dict(Dict::new());
        root.as_dict_mut().unwrap().insert("a", Value::Null);
        let leaf = define_path(&mut root, "a/b").unwrap();
        leaf.set_bool(true);
        assert_eq!(
            resolve_path(&root, "a/b").unwrap().as_bool().unwrap(),
            true
        );
    }
}
