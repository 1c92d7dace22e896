//! Small pieces every handler reaches for: resolving the `{data_parser}`
//! version, turning a [`BackendError`] into an `(ErrorKind, String)` pair,
//! and query-string numeric extraction.

use std::any::Any;
use std::sync::Arc;

use slurmrest::{context::RequestContext, DataParser, ErrorKind, TypeTag};
use slurmrest_backend::BackendError;
use slurmrest_core::{Dict, Value};

use crate::state::AppState;

/// Resolve `ctxt.params["data_parser"]` against `state.parsers`. On an
/// unregistered version, records [`ErrorKind::InvalidQuery`] and returns
/// `None` — the caller should return immediately.
pub(crate) fn parser_for(state: &AppState, ctxt: &mut RequestContext) -> Option<Arc<dyn DataParser>> {
    let version = ctxt
        .params
        .get("data_parser")
        .and_then(|v| v.as_str().ok())
        .unwrap_or_default()
        .to_string();
    match state.parsers.get(&version) {
        Some(parser) => Some(parser),
        None => {
            ctxt.envelope.resp_error(
                ErrorKind::InvalidQuery,
                "data_parser",
                format!("no data parser registered for version {version:?}"),
            );
            None
        }
    }
}

/// Classify a [`BackendError`] into the envelope error it should be
/// reported as. Each handler still attributes the `source` field itself,
/// since that depends on which RPC failed.
pub(crate) fn classify_backend_error(err: &BackendError) -> (ErrorKind, String) {
    match err {
        BackendError::Connection(msg) => (ErrorKind::DbConnection, msg.clone()),
        BackendError::RpcFailed { rpc, code, message } => (
            ErrorKind::BackendRpcFailed,
            format!("{rpc} failed with code {code}: {message}"),
        ),
        BackendError::NoChangeInData => {
            (ErrorKind::EmptyResult, "no change in data since the last update".to_string())
        }
        BackendError::NotFound(what) => (ErrorKind::UnknownEntity, what.clone()),
        BackendError::Timeout(rpc) => (ErrorKind::DbConnection, format!("{rpc} timed out")),
    }
}

/// PARSE the request body into the concrete type `tag` implies, via the
/// registered data parser. Any error is already recorded on the envelope
/// by [`DataParser::parse`]; callers just propagate `None`.
pub(crate) fn parse_body<T: 'static>(
    parser: &dyn DataParser,
    tag: TypeTag,
    ctxt: &mut RequestContext,
    source: &str,
) -> Option<T> {
    let body = ctxt.body.clone();
    match parser.parse(tag, &body, "", &mut ctxt.envelope, source) {
        Ok(record) => downcast(record),
        Err(_code) => None,
    }
}

fn downcast<T: 'static>(record: Box<dyn Any + Send>) -> Option<T> {
    record.downcast::<T>().ok().map(|b| *b)
}

/// DUMP `record` (the concrete type `tag` implies) through the
/// registered data parser, recording an envelope error and returning
/// `None` on a shape mismatch.
pub(crate) fn dump_value(
    parser: &dyn DataParser,
    tag: TypeTag,
    record: &dyn Any,
    ctxt: &mut RequestContext,
    source: &str,
) -> Option<Value> {
    let mut tree = Value::Null;
    match parser.dump(tag, record, &mut tree) {
        Ok(()) => Some(tree),
        Err(kind) => {
            ctxt.envelope.resp_error(kind, source, "DUMP failed for this record shape");
            None
        }
    }
}

/// Read an integer query parameter, defaulting to `default` if absent
/// or unparseable.
pub(crate) fn query_i64(query: &Dict, key: &str, default: i64) -> i64 {
    query.get(key).and_then(|v| v.as_str().ok()).and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// Read an unsigned integer query parameter, defaulting to `default`.
pub(crate) fn query_u32(query: &Dict, key: &str, default: u32) -> u32 {
    query.get(key).and_then(|v| v.as_str().ok()).and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// Read a string query parameter.
pub(crate) fn query_str<'a>(query: &'a Dict, key: &str) -> Option<&'a str> {
    query.get(key).and_then(|v| v.as_str().ok())
}
