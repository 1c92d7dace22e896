//! The per-request context and its backend-RPC helper contracts (spec
//! §4.H): everything a handler touches between being dispatched to and
//! returning its envelope.

use slurmrest_core::{Dict, Value};

use crate::envelope::{Envelope, Meta};
use crate::errors::ErrorKind;
use crate::router::Method;

/// Everything allocated for one incoming request (spec §4.H step 1): the
/// method, path/query parameters, parsed body, a client id for log
/// prefixing, the response envelope, and the commit flag a handler may
/// set once its mutation succeeds.
pub struct RequestContext {
    /// The request's HTTP method.
    pub method: Method,
    /// `{placeholder}` captures from the path router.
    pub params: Dict,
    /// The parsed query string.
    pub query: Dict,
    /// The parsed request body, or `Value::Null` for a bodyless request.
    pub body: Value,
    /// An opaque id for this request used to prefix log lines (spec §4.H
    /// step 1, "a client id for log prefixing").
    pub client_id: String,
    /// The response envelope this request is building up.
    pub envelope: Envelope,
    commit_requested: bool,
}

impl RequestContext {
    /// Allocate a context and seed its envelope (spec §4.H steps 1–2).
    #[must_use]
    pub fn new(method: Method, params: Dict, query: Dict, body: Value, client_id: impl Into<String>) -> Self {
        Self {
            method,
            params,
            query,
            body,
            client_id: client_id.into(),
            envelope: Envelope::new(),
            commit_requested: false,
        }
    }

    /// A handler calls this once its mutation succeeded and should be
    /// committed (spec §4.H step 6). Read-only handlers never call this.
    pub fn request_commit(&mut self) {
        self.commit_requested = true;
    }

    /// Whether the transaction should be committed: a commit was
    /// requested and no error was recorded. If this is `false` after a
    /// commit was requested, the backend is expected to auto-rollback on
    /// disconnect (spec §4.H step 6) — this crate never issues an
    /// explicit rollback call.
    #[must_use]
    pub fn should_commit(&self) -> bool {
        self.commit_requested && !self.envelope.has_errors()
    }

    /// Render this request's envelope into its final wire value,
    /// consuming the context (spec §4.H step 7, "tear down the context").
    #[must_use]
    pub fn finish(self, meta: &Meta) -> Value {
        self.envelope.into_value(meta)
    }
}

/// The outcome a backend list-query closure passed to [`db_query_list`]
/// reports back.
pub enum ListQueryOutcome<T> {
    /// The query succeeded and produced `0..=n` rows.
    Data(Vec<T>),
    /// The backend reported its `NO_CHANGE_IN_DATA` sentinel: nothing has
    /// changed since the client's timestamp.
    NoChangeInData,
    /// The query failed.
    Error {
        /// The error classification to record.
        kind: ErrorKind,
        /// A human-readable description for the envelope entry.
        description: String,
    },
}

/// Invoke a backend list query (spec §4.H, `db_query_list`).
///
/// - `NO_CHANGE_IN_DATA` → no list, a warning is recorded, returns `None`.
/// - an error → the error is recorded, returns `None`.
/// - success with zero rows → a warning is recorded unless
///   `suppress_empty_warning` is set, either way returns `Some(vec![])`.
pub fn db_query_list<T>(
    ctxt: &mut RequestContext,
    source: &str,
    suppress_empty_warning: bool,
    func: impl FnOnce() -> ListQueryOutcome<T>,
) -> Option<Vec<T>> {
    match func() {
        ListQueryOutcome::Data(list) => {
            if list.is_empty() && !suppress_empty_warning {
                ctxt.envelope
                    .resp_warn(source, "query succeeded but returned no results");
            }
            Some(list)
        }
        ListQueryOutcome::NoChangeInData => {
            ctxt.envelope
                .resp_warn(source, "no change in data since the client's last update");
            None
        }
        ListQueryOutcome::Error { kind, description } => {
            ctxt.envelope.resp_error(kind, source, description);
            None
        }
    }
}

/// Invoke a backend add/set RPC (spec §4.H, `db_query_rc`). Surfaces a
/// non-zero backend return as an error; returns whether it succeeded.
pub fn db_query_rc(
    ctxt: &mut RequestContext,
    source: &str,
    func: impl FnOnce() -> Result<(), (ErrorKind, String)>,
) -> bool {
    match func() {
        Ok(()) => true,
        Err((kind, description)) => {
            ctxt.envelope.resp_error(kind, source, description);
            false
        }
    }
}

/// Invoke a backend modify RPC returning the changed set (spec §4.H,
/// `db_modify`). A `None` result (the backend's "null list" return)
/// records [`ErrorKind::EmptyResult`].
pub fn db_modify<T>(
    ctxt: &mut RequestContext,
    source: &str,
    func: impl FnOnce() -> Option<Vec<T>>,
) -> Option<Vec<T>> {
    match func() {
        Some(changed) => Some(changed),
        None => {
            ctxt.envelope
                .resp_error(ErrorKind::EmptyResult, source, "modify matched no records");
            None
        }
    }
}

/// Commit the backend transaction (spec §4.H, `db_query_commit`).
/// Surfaces a commit failure as an error; returns whether it succeeded.
pub fn db_query_commit(
    ctxt: &mut RequestContext,
    source: &str,
    func: impl FnOnce() -> Result<(), (ErrorKind, String)>,
) -> bool {
    db_query_rc(ctxt, source, func)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctxt() -> RequestContext {
        RequestContext::new(Method::Get, Dict::new(), Dict::new(), Value::Null, "test-client")
    }

    #[test]
    fn no_change_in_data_warns_and_yields_none() {
        let mut ctxt = ctxt();
        let result: Option<Vec<i64>> = db_query_list(&mut ctxt, "load_jobs", false, || ListQueryOutcome::NoChangeInData);
        assert!(result.is_none());
        assert!(!ctxt.envelope.has_errors());
    }

    #[test]
    fn list_error_records_error_and_yields_none() {
        let mut ctxt = ctxt();
        let result: Option<Vec<i64>> = db_query_list(&mut ctxt, "load_jobs", false, || ListQueryOutcome::Error {
            kind: ErrorKind::DbConnection,
            description: "connection refused".into(),
        });
        assert!(result.is_none());
        assert!(ctxt.envelope.has_errors());
    }

    #[test]
    fn empty_success_warns_unless_suppressed() {
        let mut ctxt = ctxt();
        let result: Option<Vec<i64>> = db_query_list(&mut ctxt, "load_jobs", true, || ListQueryOutcome::Data(vec![]));
        assert_eq!(result, Some(vec![]));
        assert!(!ctxt.envelope.has_errors());
    }

    #[test]
    fn db_modify_none_records_empty_result_error() {
        let mut ctxt = ctxt();
        let result: Option<Vec<i64>> = db_modify(&mut ctxt, "update_job", || None);
        assert!(result.is_none());
        assert_eq!(ctxt.envelope.result_code(), ErrorKind::EmptyResult.code());
    }

    #[test]
    fn should_commit_requires_both_request_and_no_errors() {
        let mut ctxt = ctxt();
        assert!(!ctxt.should_commit());
        ctxt.request_commit();
        assert!(ctxt.should_commit());
        ctxt.envelope.resp_error(ErrorKind::InvalidQuery, "x", "bad");
        assert!(!ctxt.should_commit());
    }
}
