//! The self-describing data tree at the heart of the slurmrest façade.
//!
//! A [`Value`] is a tagged union over the primitive JSON-like types
//! (`Null`, `Bool`, `Int64`, `Double`, `String`) plus two containers
//! (`List`, an ordered sequence, and [`Dict`], an order-preserving keyed
//! map). Every wire format the façade speaks — JSON, URL-encoded forms,
//! YAML — is parsed into and emitted from this tree; no endpoint handler
//! touches wire bytes directly.
//!
//! This crate also carries the UTF-8 correctness primitives ([`utf8`])
//! the JSON codec is built on, the reversible type-coercion rules
//! ([`convert`]) shared by the URL-form codec and the `convert_type`
//! data-tree operation, and slash-path traversal ([`path`]).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod convert;
pub mod iter;
pub mod path;
pub mod utf8;
pub mod value;

pub use convert::{convert, convert_auto, ConvertError, ValueType};
pub use iter::ForEachCmd;
pub use path::{define_path, resolve_path, PathError};
pub use value::{Dict, Value};
