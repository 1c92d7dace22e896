//! The core of the slurmrest REST façade: the response envelope and
//! error taxonomy, the versioned data-parser plugin interface, the
//! method-aware path router, and the per-request context/operation
//! framework that ties them together.
//!
//! This crate knows nothing about HTTP transport or any concrete entity
//! schema (job, node, partition, ...) — those live in `slurmrest-api`
//! and `slurmrest-parsers` respectively, built on top of the types here.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod context;
pub mod dataparser;
pub mod envelope;
pub mod errors;
pub mod router;

pub use context::{db_modify, db_query_commit, db_query_list, db_query_rc, ListQueryOutcome, RequestContext};
pub use dataparser::{DataParser, ParserRegistry, TypeTag};
pub use envelope::{Envelope, Meta};
pub use errors::{ErrorClass, ErrorKind};
pub use router::{split_request_path, Method, Router, UNREGISTERED_TAG};
