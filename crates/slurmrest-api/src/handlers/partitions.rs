//! `/partitions/`, `/partition/{name}` — read-only (spec §4.I).

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parser_for};

/// `GET /partitions/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.ctld.load_partitions(None).await {
        Ok(partitions) => {
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::PartitionResp, &partitions, ctxt, "load_partitions") {
                if let Ok(dict) = value.as_dict() {
                    ctxt.envelope.merge_payload(dict);
                }
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "load_partitions", description);
        }
    }
}

/// `GET /partition/{name}` — case-insensitive name match (spec §4.I).
pub async fn get(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::InvalidPartitionName, "name", "missing partition name");
        return;
    };
    match state.ctld.load_partitions(None).await {
        Ok(partitions) => {
            let matched: Vec<_> = partitions
                .into_iter()
                .filter(|p| p.name.eq_ignore_ascii_case(&name))
                .collect();
            if matched.is_empty() {
                ctxt.envelope.resp_error(
                    ErrorKind::InvalidPartitionName,
                    "load_partitions",
                    format!("no such partition {name:?}"),
                );
                return;
            }
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::PartitionResp, &matched, ctxt, "load_partitions") {
                if let Ok(dict) = value.as_dict() {
                    ctxt.envelope.merge_payload(dict);
                }
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "load_partitions", description);
        }
    }
}
