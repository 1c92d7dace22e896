//! UTF-8-correct JSON codec and URL-encoded form codec producing and
//! consuming [`slurmrest_core::Value`] trees.
//!
//! The JSON parser is a push-down automaton over an explicit container
//! stack rather than recursive descent, so nesting depth is bounded by
//! [`json::MAX_DEPTH`] instead of the native call stack.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod json;
pub mod urlform;
pub mod yaml;

pub use json::{emit as emit_json, parse as parse_json, JsonEmitOptions, JsonError, JsonErrorKind};
pub use urlform::{emit as emit_urlform, parse as parse_urlform, UrlFormError};
pub use yaml::{emit as emit_yaml, YamlError};
