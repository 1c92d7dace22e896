//! The response envelope every endpoint returns, and the `resp_error`/
//! `resp_warn` accumulators a handler appends to (spec §4.E/§6).

use slurmrest_core::{Dict, Value};

use crate::errors::ErrorKind;

/// `meta.plugin`/`meta.slurm`/`meta.client` block identifying this build
/// and the calling client, carried on every response.
#[derive(Debug, Clone)]
pub struct Meta {
    /// `meta.plugin.type`, e.g. `"openapi/slurmctld"`.
    pub plugin_type: String,
    /// `meta.plugin.name`.
    pub plugin_name: String,
    /// `meta.slurm.release`.
    pub slurm_release: String,
    /// `meta.slurm.version.{major,minor,micro}`.
    pub slurm_version: (u32, u32, u32),
    /// `meta.client.source` — the originating client identifier used for
    /// log prefixing.
    pub client_source: String,
    /// `meta.client.uid`.
    pub client_uid: u32,
    /// `meta.client.gid`.
    pub client_gid: u32,
}

impl Meta {
    fn to_value(&self) -> Value {
        let mut meta = Dict::new();

        let mut plugin = Dict::new();
        plugin.insert("type", Value::String(self.plugin_type.clone()));
        plugin.insert("name", Value::String(self.plugin_name.clone()));
        meta.insert("plugin", Value::Dict(plugin));

        let mut slurm = Dict::new();
        slurm.insert("release", Value::String(self.slurm_release.clone()));
        let mut version = Dict::new();
        version.insert("major", Value::Int64(i64::from(self.slurm_version.0)));
        version.insert("minor", Value::Int64(i64::from(self.slurm_version.1)));
        version.insert("micro", Value::Int64(i64::from(self.slurm_version.2)));
        slurm.insert("version", Value::Dict(version));
        meta.insert("slurm", Value::Dict(slurm));

        let mut client = Dict::new();
        client.insert("source", Value::String(self.client_source.clone()));
        client.insert("uid", Value::Int64(i64::from(self.client_uid)));
        client.insert("gid", Value::Int64(i64::from(self.client_gid)));
        meta.insert("client", Value::Dict(client));

        Value::Dict(meta)
    }
}

/// Accumulates `errors`/`warnings`/the result code/the response payload
/// for a single request. A [`crate::context::RequestContext`] owns one.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    errors: Vec<Dict>,
    warnings: Vec<Dict>,
    /// The first non-zero code recorded by [`Envelope::resp_error`]; `0`
    /// until then.
    result_code: i64,
    /// Top-level payload fields, written via `DUMP`. Empty until a
    /// handler sets one.
    payload: Dict,
}

impl Envelope {
    /// Start a fresh envelope with no errors, warnings, or payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error entry and, if this is the first error recorded
    /// this request, set the result code to `kind`'s numeric code.
    /// Returns the code, so callers can write `return ctxt.resp_error(...)`.
    pub fn resp_error(&mut self, kind: ErrorKind, source: impl Into<String>, description: impl Into<String>) -> i64 {
        let code = kind.code();
        let mut entry = Dict::new();
        entry.insert("description", Value::String(description.into()));
        entry.insert("error_number", Value::Int64(code));
        entry.insert("error", Value::String(kind.name().to_string()));
        entry.insert("source", Value::String(source.into()));
        self.errors.push(entry);
        if self.result_code == 0 {
            self.result_code = code;
        }
        code
    }

    /// Append a warning entry. Never affects the result code.
    pub fn resp_warn(&mut self, source: impl Into<String>, description: impl Into<String>) {
        let mut entry = Dict::new();
        entry.insert("description", Value::String(description.into()));
        entry.insert("source", Value::String(source.into()));
        self.warnings.push(entry);
    }

    /// The result code: `0` if no error has been recorded yet, else the
    /// first error's code.
    #[must_use]
    pub fn result_code(&self) -> i64 {
        self.result_code
    }

    /// `true` if at least one error has been recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Set a single top-level payload field under `key` (e.g.
    /// `"account"`, `"nodes"`). A handler that errors out before
    /// reaching `DUMP` simply never calls this, and the field is omitted
    /// entirely.
    pub fn set_payload(&mut self, key: impl Into<String>, value: Value) {
        self.payload.insert(key, value);
    }

    /// Merge every entry of `dict` in as top-level payload fields. Used
    /// when a `DUMP` result already carries its own sibling keys — a job
    /// listing's `jobs`/`last_update`/`last_backfill`, or the config-dump
    /// fan-out's per-entity lists — rather than a single wrapped value.
    pub fn merge_payload(&mut self, dict: &Dict) {
        for (key, value) in dict.iter() {
            self.payload.insert(key, value.clone());
        }
    }

    /// Render the full envelope, including `meta`, in insertion order:
    /// `meta`, `errors`, `warnings`, then any payload fields in the order
    /// they were set.
    #[must_use]
    pub fn into_value(self, meta: &Meta) -> Value {
        let mut root = Dict::new();
        root.insert("meta", meta.to_value());
        root.insert(
            "errors",
            Value::List(self.errors.into_iter().map(Value::Dict).collect()),
        );
        root.insert(
            "warnings",
            Value::List(self.warnings.into_iter().map(Value::Dict).collect()),
        );
        for (key, value) in self.payload.iter() {
            root.insert(key, value.clone());
        }
        Value::Dict(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta() -> Meta {
        Meta {
            plugin_type: "openapi/slurmctld".into(),
            plugin_name: "v0.0.39".into(),
            slurm_release: "24.05".into(),
            slurm_version: (24, 5, 0),
            client_source: "cli".into(),
            client_uid: 0,
            client_gid: 0,
        }
    }

    #[test]
    fn resp_error_sets_code_once() {
        let mut env = Envelope::new();
        assert_eq!(env.resp_error(ErrorKind::InvalidQuery, "f", "bad"), ErrorKind::InvalidQuery.code());
        // A second error doesn't overwrite the first code.
        env.resp_error(ErrorKind::DbConnection, "g", "down");
        assert_eq!(env.result_code(), ErrorKind::InvalidQuery.code());
    }

    #[test]
    fn resp_warn_never_sets_result_code() {
        let mut env = Envelope::new();
        env.resp_warn("f", "heads up");
        assert_eq!(env.result_code(), 0);
        assert!(!env.has_errors());
    }

    #[test]
    fn envelope_preserves_error_and_warning_order() {
        let mut env = Envelope::new();
        env.resp_error(ErrorKind::InvalidQuery, "a", "first");
        env.resp_error(ErrorKind::EmptyResult, "b", "second");
        let v = env.into_value(&sample_meta());
        let errors = v.as_dict().unwrap().get("errors").unwrap().as_list().unwrap();
        assert_eq!(errors[0].as_dict().unwrap().get("source").unwrap().as_str().unwrap(), "a");
        assert_eq!(errors[1].as_dict().unwrap().get("source").unwrap().as_str().unwrap(), "b");
    }

    #[test]
    fn payload_omitted_when_never_set() {
        let env = Envelope::new();
        let v = env.into_value(&sample_meta());
        assert!(!v.as_dict().unwrap().contains_key("jobs"));
    }

    #[test]
    fn merge_payload_lifts_sibling_keys_to_root() {
        let mut env = Envelope::new();
        let mut dump = Dict::new();
        dump.insert("jobs", Value::List(vec![]));
        dump.insert("last_update", Value::Int64(42));
        env.merge_payload(&dump);
        let v = env.into_value(&sample_meta());
        let root = v.as_dict().unwrap();
        assert_eq!(root.get("last_update").unwrap().as_int64().unwrap(), 42);
        assert!(root.contains_key("jobs"));
    }
}
