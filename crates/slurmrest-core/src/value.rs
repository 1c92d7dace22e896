//! The polymorphic [`Value`] data-tree node and its ordered [`Dict`] container.

use std::fmt;

use indexmap::IndexMap;

use crate::iter::{outcome, ForEachCmd, VisitCount};

/// A self-describing data-tree node.
///
/// Containers ([`Value::List`], [`Value::Dict`]) own their children
/// exclusively — there are no shared sub-trees and no cycles. Reassigning
/// a node to a different variant (via `set_*`) drops any previously owned
/// children for free, as `Value` has no manual destructor to run.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// No value. The default variant.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int64(i64),
    /// A 64-bit float.
    Double(f64),
    /// A UTF-8 string.
    String(String),
    /// An ordered sequence of values.
    List(Vec<Value>),
    /// An order-preserving keyed map. Keys are non-empty.
    Dict(Dict),
}

/// The tag of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Tag of [`Value::Null`].
    Null,
    /// Tag of [`Value::Bool`].
    Bool,
    /// Tag of [`Value::Int64`].
    Int64,
    /// Tag of [`Value::Double`].
    Double,
    /// Tag of [`Value::String`].
    String,
    /// Tag of [`Value::List`].
    List,
    /// Tag of [`Value::Dict`].
    Dict,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int64 => "int64",
            Self::Double => "double",
            Self::String => "string",
            Self::List => "list",
            Self::Dict => "dict",
        };
        f.write_str(s)
    }
}

/// Error returned when a [`Value`] accessor or mutator is used against the
/// wrong tag.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("expected a {expected} value, found {found}")]
pub struct TypeMismatch {
    /// The tag the caller required.
    pub expected: ValueType,
    /// The tag actually found.
    pub found: ValueType,
}

impl Value {
    /// The tag of this node.
    #[must_use]
    pub fn get_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Bool(_) => ValueType::Bool,
            Self::Int64(_) => ValueType::Int64,
            Self::Double(_) => ValueType::Double,
            Self::String(_) => ValueType::String,
            Self::List(_) => ValueType::List,
            Self::Dict(_) => ValueType::Dict,
        }
    }

    /// `true` if this node is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `true` if this node is an empty [`Value::Dict`].
    #[must_use]
    pub fn is_empty_dict(&self) -> bool {
        matches!(self, Self::Dict(d) if d.is_empty())
    }

    /// Set this node to [`Value::Null`], dropping any previously owned
    /// children.
    pub fn set_null(&mut self) {
        *self = Self::Null;
    }

    /// Set this node to a [`Value::Bool`].
    pub fn set_bool(&mut self, value: bool) {
        *self = Self::Bool(value);
    }

    /// Set this node to a [`Value::Int64`].
    pub fn set_int64(&mut self, value: i64) {
        *self = Self::Int64(value);
    }

    /// Set this node to a [`Value::Double`].
    pub fn set_double(&mut self, value: f64) {
        *self = Self::Double(value);
    }

    /// Set this node to a [`Value::String`].
    pub fn set_string(&mut self, value: impl Into<String>) {
        *self = Self::String(value.into());
    }

    /// Set this node to an empty [`Value::List`] and return it.
    pub fn set_list(&mut self) -> &mut Vec<Value> {
        *self = Self::List(Vec::new());
        match self {
            Self::List(l) => l,
            _ => unreachable!(),
        }
    }

    /// Set this node to an empty [`Value::Dict`] and return it.
    pub fn set_dict(&mut self) -> &mut Dict {
        *self = Self::Dict(Dict::new());
        match self {
            Self::Dict(d) => d,
            _ => unreachable!(),
        }
    }

    /// View this node as a `bool`, asserting its tag.
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::Bool`].
    pub fn as_bool(&self) -> Result<bool, TypeMismatch> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(mismatch(ValueType::Bool, other)),
        }
    }

    /// View this node as an `i64`, asserting its tag.
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::Int64`].
    pub fn as_int64(&self) -> Result<i64, TypeMismatch> {
        match self {
            Self::Int64(i) => Ok(*i),
            other => Err(mismatch(ValueType::Int64, other)),
        }
    }

    /// View this node as an `f64`, asserting its tag.
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::Double`].
    pub fn as_double(&self) -> Result<f64, TypeMismatch> {
        match self {
            Self::Double(d) => Ok(*d),
            other => Err(mismatch(ValueType::Double, other)),
        }
    }

    /// View this node as a `&str`, asserting its tag.
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::String`].
    pub fn as_str(&self) -> Result<&str, TypeMismatch> {
        match self {
            Self::String(s) => Ok(s.as_str()),
            other => Err(mismatch(ValueType::String, other)),
        }
    }

    /// View this node as a `&[Value]`, asserting its tag.
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::List`].
    pub fn as_list(&self) -> Result<&[Value], TypeMismatch> {
        match self {
            Self::List(l) => Ok(l.as_slice()),
            other => Err(mismatch(ValueType::List, other)),
        }
    }

    /// View this node as a `&mut Vec<Value>`, asserting its tag.
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::List`].
    pub fn as_list_mut(&mut self) -> Result<&mut Vec<Value>, TypeMismatch> {
        let found = self.get_type();
        match self {
            Self::List(l) => Ok(l),
            _ => Err(TypeMismatch {
                expected: ValueType::List,
                found,
            }),
        }
    }

    /// View this node as a `&Dict`, asserting its tag.
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::Dict`].
    pub fn as_dict(&self) -> Result<&Dict, TypeMismatch> {
        match self {
            Self::Dict(d) => Ok(d),
            other => Err(mismatch(ValueType::Dict, other)),
        }
    }

    /// View this node as a `&mut Dict`, asserting its tag.
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::Dict`].
    pub fn as_dict_mut(&mut self) -> Result<&mut Dict, TypeMismatch> {
        let found = self.get_type();
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(TypeMismatch {
                expected: ValueType::Dict,
                found,
            }),
        }
    }

    /// Append a value to this node, which must already be a
    /// [`Value::List`].
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::List`].
    pub fn list_append(&mut self, value: Value) -> Result<(), TypeMismatch> {
        self.as_list_mut()?.push(value);
        Ok(())
    }

    /// Prepend a value to this node, which must already be a
    /// [`Value::List`].
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::List`].
    pub fn list_prepend(&mut self, value: Value) -> Result<(), TypeMismatch> {
        self.as_list_mut()?.insert(0, value);
        Ok(())
    }

    /// Visit every element of this node (which must be a [`Value::List`]),
    /// allowing mutation and deletion.
    ///
    /// Returns the number of elements visited, negated if the walk ended
    /// via [`ForEachCmd::Fail`].
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::List`].
    pub fn list_for_each<F>(&mut self, mut visit: F) -> Result<VisitCount, TypeMismatch>
    where
        F: FnMut(&mut Value) -> ForEachCmd,
    {
        let list = self.as_list_mut()?;
        let mut visited: i64 = 0;
        let mut failed = false;
        let mut i = 0;
        while i < list.len() {
            let cmd = visit(&mut list[i]);
            visited += 1;
            let (cont, fail) = outcome(cmd);
            failed = fail;
            if cmd == ForEachCmd::Delete {
                list.remove(i);
            } else {
                i += 1;
            }
            if !cont {
                break;
            }
        }
        Ok(if failed { -visited } else { visited })
    }

    /// Visit every element of this node (which must be a [`Value::List`])
    /// read-only.
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if this node is not [`Value::List`].
    ///
    /// # Panics
    /// Panics if the visitor returns [`ForEachCmd::Delete`] — mutation is
    /// not legal in a const iteration.
    pub fn list_for_each_const<F>(&self, mut visit: F) -> Result<VisitCount, TypeMismatch>
    where
        F: FnMut(&Value) -> ForEachCmd,
    {
        let list = self.as_list()?;
        let mut visited: i64 = 0;
        let mut failed = false;
        for item in list {
            let cmd = visit(item);
            visited += 1;
            assert!(
                cmd != ForEachCmd::Delete,
                "ForEachCmd::Delete is illegal in a const iteration"
            );
            let (cont, fail) = outcome(cmd);
            failed = fail;
            if !cont {
                break;
            }
        }
        Ok(if failed { -visited } else { visited })
    }

    /// Deep copy this node.
    #[must_use]
    pub fn deep_copy(&self) -> Value {
        self.clone()
    }

    /// Deep-equality check with optional wildcard masking.
    ///
    /// When `mask` is `false`, `self` and `other` must match exactly:
    /// dicts compare by key set (order-insensitive), lists compare
    /// positionally (same length, same order), doubles compare with a
    /// relative fuzzy tolerance, and strings compare bytewise.
    ///
    /// When `mask` is `true`, `other` is treated as a pattern: every key
    /// present in `other`'s dicts must match in `self`, but `self` may
    /// carry additional keys `other` doesn't mention. This mirrors the
    /// source's `data_check_match(a, b, mask)` wildcard behavior, used by
    /// handlers that only want to assert a subset of an RPC result.
    #[must_use]
    pub fn check_match(&self, other: &Value, mask: bool) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => fuzzy_eq(*a, *b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.check_match(y, mask))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if !mask && a.len() != b.len() {
                    return false;
                }
                b.iter()
                    .all(|(k, v)| a.get(k).is_some_and(|av| av.check_match(v, mask)))
            }
            _ => false,
        }
    }
}

/// Relative fuzzy-equality tolerance used by [`Value::check_match`] for
/// [`Value::Double`] comparisons, matching the source's epsilon-based
/// float comparison in `data.c`.
pub const DOUBLE_MATCH_EPSILON: f64 = 1e-5;

fn fuzzy_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= DOUBLE_MATCH_EPSILON * scale
}

fn mismatch(expected: ValueType, found: &Value) -> TypeMismatch {
    TypeMismatch {
        expected,
        found: found.get_type(),
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<Dict> for Value {
    fn from(value: Dict) -> Self {
        Self::Dict(value)
    }
}

/// An order-preserving keyed map from non-empty string keys to [`Value`]s.
///
/// Backed by an [`indexmap::IndexMap`], giving O(1) average keyed lookup
/// while preserving insertion order — required so JSON emission round-trips
/// key order, per the wire contract in spec §3/§9.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict(IndexMap<String, Value>);

impl Dict {
    /// Create an empty dict.
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a key, mutably.
    #[must_use]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or overwrite `key`. Late keys overwrite earlier ones during
    /// parsing, as the wire contract requires; emitters must never be
    /// handed a `Dict` with a duplicate key because `IndexMap` cannot
    /// represent one.
    ///
    /// # Panics
    /// Panics if `key` is empty — dict keys must be non-empty per §3.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        assert!(!key.is_empty(), "dict keys must be non-empty");
        self.0.insert(key, value)
    }

    /// Return the existing child for `key`, or insert a new
    /// [`Value::Null`] child and return that.
    ///
    /// Idempotent: calling twice with the same key returns the same node
    /// without duplicating the entry.
    ///
    /// # Panics
    /// Panics if `key` is empty.
    pub fn key_set(&mut self, key: &str) -> &mut Value {
        assert!(!key.is_empty(), "dict keys must be non-empty");
        self.0.entry(key.to_string()).or_insert(Value::Null)
    }

    /// Remove `key`, preserving the order of remaining entries.
    pub fn key_unset(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate entries in insertion order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.0.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Visit every entry, allowing mutation and deletion.
    ///
    /// Returns the number of entries visited, negated if the walk ended
    /// via [`ForEachCmd::Fail`].
    pub fn for_each<F>(&mut self, mut visit: F) -> VisitCount
    where
        F: FnMut(&str, &mut Value) -> ForEachCmd,
    {
        let mut visited: i64 = 0;
        let mut failed = false;
        let mut i = 0;
        while i < self.0.len() {
            let (key, value) = self.0.get_index_mut(i).expect("index in bounds");
            let cmd = visit(key.as_str(), value);
            visited += 1;
            let (cont, fail) = outcome(cmd);
            failed = fail;
            if cmd == ForEachCmd::Delete {
                self.0.shift_remove_index(i);
            } else {
                i += 1;
            }
            if !cont {
                break;
            }
        }
        if failed {
            -visited
        } else {
            visited
        }
    }

    /// Visit every entry read-only.
    ///
    /// # Panics
    /// Panics if the visitor returns [`ForEachCmd::Delete`].
    pub fn for_each_const<F>(&self, mut visit: F) -> VisitCount
    where
        F: FnMut(&str, &Value) -> ForEachCmd,
    {
        let mut visited: i64 = 0;
        let mut failed = false;
        for (key, value) in &self.0 {
            let cmd = visit(key.as_str(), value);
            visited += 1;
            assert!(
                cmd != ForEachCmd::Delete,
                "ForEachCmd::Delete is illegal in a const iteration"
            );
            let (cont, fail) = outcome(cmd);
            failed = fail;
            if !cont {
                break;
            }
        }
        if failed {
            -visited
        } else {
            visited
        }
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl FromIterator<(String, Value)> for Dict {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut d = Dict::new();
        for (k, v) in iter {
            d.insert(k, v);
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_releases_children() {
        let mut v = Value::List(vec![Value::Int64(1), Value::Int64(2)]);
        v.set_bool(true);
        assert_eq!(v.as_bool().unwrap(), true);
    }

    #[test]
    fn dict_key_set_is_idempotent() {
        let mut d = Dict::new();
        d.key_set("a").set_int64(1);
        let first_ptr = d.get("a").unwrap() as *const Value;
        d.key_set("a");
        let second_ptr = d.get("a").unwrap() as *const Value;
        assert_eq!(first_ptr, second_ptr);
        assert_eq!(d.len(), 1);
        assert_eq!(d.get("a").unwrap().as_int64().unwrap(), 1);
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn dict_key_set_rejects_empty_key() {
        let mut d = Dict::new();
        d.key_set("");
    }

    #[test]
    fn list_for_each_can_delete_current() {
        let mut v = Value::List(vec![
            Value::Int64(1),
            Value::Int64(2),
            Value::Int64(3),
        ]);
        let visited = v
            .list_for_each(|item| {
                if item.as_int64().unwrap() == 2 {
                    ForEachCmd::Delete
                } else {
                    ForEachCmd::Cont
                }
            })
            .unwrap();
        assert_eq!(visited, 3);
        let remaining: Vec<i64> = v
            .as_list()
            .unwrap()
            .iter()
            .map(|v| v.as_int64().unwrap())
            .collect();
        assert_eq!(remaining, vec![1, 3]);
    }

    #[test]
    fn list_for_each_fail_negates_count() {
        let mut v = Value::List(vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
        let visited = v
            .list_for_each(|item| {
                if item.as_int64().unwrap() == 2 {
                    ForEachCmd::Fail
                } else {
                    ForEachCmd::Cont
                }
            })
            .unwrap();
        assert_eq!(visited, -2);
    }

    #[test]
    #[should_panic(expected = "illegal in a const iteration")]
    fn const_iteration_panics_on_delete() {
        let v = Value::List(vec![Value::Int64(1)]);
        let _ = v.list_for_each_const(|_| ForEachCmd::Delete);
    }

    #[test]
    fn check_match_dict_order_insensitive() {
        let mut a = Dict::new();
        a.insert("x", Value::Int64(1));
        a.insert("y", Value::Int64(2));
        let mut b = Dict::new();
        b.insert("y", Value::Int64(2));
        b.insert("x", Value::Int64(1));
        assert!(Value::Dict(a).check_match(&Value::Dict(b), false));
    }

    #[test]
    fn check_match_mask_ignores_extra_keys_in_self() {
        let mut a = Dict::new();
        a.insert("x", Value::Int64(1));
        a.insert("y", Value::Int64(2));
        let mut pattern = Dict::new();
        pattern.insert("x", Value::Int64(1));
        assert!(Value::Dict(a.clone()).check_match(&Value::Dict(pattern.clone()), true));
        assert!(!Value::Dict(a).check_match(&Value::Dict(pattern), false));
    }

    #[test]
    fn check_match_double_fuzzy() {
        assert!(Value::Double(1.0).check_match(&Value::Double(1.0 + 1e-9), false));
        assert!(!Value::Double(1.0).check_match(&Value::Double(1.1), false));
    }

    #[test]
    fn list_append_requires_list_tag() {
        let mut v = Value::Int64(1);
        assert!(v.list_append(Value::Null).is_err());
    }
}
