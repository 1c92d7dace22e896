//! The data-parser plugin interface (spec §4.F): a versioned `PARSE`/
//! `DUMP`/`ASSIGN`/`SPECIFY` object the core dispatches to by [`TypeTag`],
//! plus a small registry mapping a `data_parser` path segment (e.g.
//! `"v0.0.39"`) to the registered implementation.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use slurmrest_core::Value;

use crate::envelope::Envelope;
use crate::errors::ErrorKind;

/// Stable identifiers for the record shapes the core's handlers move
/// through a data parser. Unlike the source's tag table (a runtime
/// `alloc_parser_obj(tag)`/`free_parser_obj(tag, ptr)` pair mediating an
/// untyped allocation), Rust's ownership rules make the alloc/free
/// mediation unnecessary: a handler simply holds the typed record
/// returned by [`DataParser::parse`] as a local binding, which `Drop`s at
/// scope exit on every return path including error returns. The tag
/// still exists because `parse`/`dump` are still dispatched dynamically
/// by tag across parser versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TypeTag {
    /// `JOB_DESC_MSG` — a job submission/update description.
    JobDescMsg,
    /// `JOB_INFO_MSG` — a job info listing.
    JobInfoMsg,
    /// `KILL_JOBS_MSG` — a bulk job-kill request.
    KillJobsMsg,
    /// `JOB_STATE_RESP` — the filtered job-state listing.
    JobStateResp,
    /// `UPDATE_NODE_MSG` — a node update request.
    UpdateNodeMsg,
    /// `NODES_RESP` — a node listing.
    NodesResp,
    /// `PARTITION_RESP` — a partition listing.
    PartitionResp,
    /// `RESERVATION_RESP` — a reservation listing.
    ReservationResp,
    /// `OPENAPI_PING_RESP` — the ping/diag/licenses/shares passthroughs.
    OpenapiPingResp,
    /// A generic, otherwise-unclassified acknowledgement response.
    OpenapiResp,
    /// `ACCOUNTS_RESP` / account entity payload (request or response).
    Account,
    /// `ASSOCIATIONS_RESP` / association entity payload.
    Association,
    /// `QOS_RESP` / QOS entity payload.
    Qos,
    /// `USERS_RESP` / user entity payload.
    User,
    /// `WCKEYS_RESP` / wckey entity payload.
    Wckey,
    /// `TRES_RESP` / TRES entity payload.
    Tres,
    /// `CLUSTERS_RESP` / cluster entity payload.
    Cluster,
    /// `INSTANCES_RESP` / instance entity payload.
    Instance,
    /// `CONFIG_RESP` — the fan-out configuration dump/replay envelope.
    Config,
}

/// A versioned data-parser plugin.
///
/// `parse`/`dump` are dispatched by [`TypeTag`]; the core never inspects
/// the record layout itself. `assign` hands the parser per-connection
/// state (e.g. a DB handle) it needs to resolve references during
/// parsing; `specify` folds this version's type-specific additions into
/// an OpenAPI document.
pub trait DataParser: Send + Sync {
    /// This parser's `data_parser` path segment, e.g. `"v0.0.39"`.
    fn version(&self) -> &'static str;

    /// Decode `tree_node` into a record of the shape `tag` names.
    ///
    /// On a type mismatch, appends a descriptive error to `envelope`
    /// (attributed to `source`) and returns the resulting error code,
    /// mirroring the source's "append error, return non-zero" contract.
    ///
    /// # Errors
    /// Returns the numeric code of an [`ErrorKind`] appended to
    /// `envelope`.
    fn parse(
        &self,
        tag: TypeTag,
        tree_node: &Value,
        parent_path: &str,
        envelope: &mut Envelope,
        source: &str,
    ) -> Result<Box<dyn Any + Send>, i64>;

    /// Encode `record` (which must be the concrete type `tag` implies)
    /// into `tree_node`.
    ///
    /// # Errors
    /// Returns [`ErrorKind::DataExpectedDict`] if `record`'s concrete
    /// type does not match what `tag` implies — a programmer error in
    /// the calling handler, not a client-facing one.
    fn dump(&self, tag: TypeTag, record: &dyn Any, tree_node: &mut Value) -> Result<(), ErrorKind>;

    /// Hand this parser per-connection state (e.g. a DB handle) under
    /// `attribute`.
    fn assign(&mut self, attribute: &str, value: Box<dyn Any + Send>);

    /// Fold this parser's type-specific additions into an OpenAPI spec
    /// document tree.
    fn specify(&self, spec_tree: &mut Value);
}

/// Maps a `{data_parser}` path segment to its registered [`DataParser`].
///
/// Structured so a second parser version can be registered without
/// touching the core (spec §9: "a single built-in parser version per
/// build is acceptable" but the registry itself must not assume that).
#[derive(Default)]
pub struct ParserRegistry {
    parsers: RwLock<HashMap<String, Arc<dyn DataParser>>>,
}

impl ParserRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `parser` under its own [`DataParser::version`].
    /// Re-registering the same version replaces the previous instance.
    pub fn register(&self, parser: Arc<dyn DataParser>) {
        self.parsers
            .write()
            .expect("parser registry lock poisoned")
            .insert(parser.version().to_string(), parser);
    }

    /// Look up the parser registered for `version` (the `{data_parser}`
    /// path placeholder's captured value).
    #[must_use]
    pub fn get(&self, version: &str) -> Option<Arc<dyn DataParser>> {
        self.parsers
            .read()
            .expect("parser registry lock poisoned")
            .get(version)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubParser;

    impl DataParser for StubParser {
        fn version(&self) -> &'static str {
            "v0.0.39"
        }

        fn parse(
            &self,
            _tag: TypeTag,
            _tree_node: &Value,
            _parent_path: &str,
            _envelope: &mut Envelope,
            _source: &str,
        ) -> Result<Box<dyn Any + Send>, i64> {
            Ok(Box::new(()))
        }

        fn dump(&self, _tag: TypeTag, _record: &dyn Any, _tree_node: &mut Value) -> Result<(), ErrorKind> {
            Ok(())
        }

        fn assign(&mut self, _attribute: &str, _value: Box<dyn Any + Send>) {}

        fn specify(&self, _spec_tree: &mut Value) {}
    }

    #[test]
    fn register_then_get_returns_same_version() {
        let registry = ParserRegistry::new();
        registry.register(Arc::new(StubParser));
        assert!(registry.get("v0.0.39").is_some());
        assert!(registry.get("v0.0.40").is_none());
    }
}
