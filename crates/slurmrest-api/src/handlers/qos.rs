//! `/qos/`, `/qos/{id}` (spec §4.I). [`slurmrest_backend::DbdBackend`]
//! only exposes a by-id-or-name lookup, not a bulk listing, so `list`
//! degrades to "no filter" which returns at most one record.

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};
use slurmrest_backend::dbd::Qos;
use slurmrest_core::Value;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parse_body, parser_for};

/// `GET /qos/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.dbd.qos_get(None, None).await {
        Ok(found) => {
            let dumped: Vec<Value> = found
                .iter()
                .filter_map(|q| dump_value(parser.as_ref(), TypeTag::Qos, q, ctxt, "qos_get"))
                .collect();
            ctxt.envelope.set_payload("qos", Value::List(dumped));
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "qos_get", description);
        }
    }
}

/// `GET /qos/{id}`.
pub async fn get(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(id) = ctxt
        .params
        .get("id")
        .and_then(|v| v.as_str().ok())
        .and_then(|s| s.parse::<u32>().ok())
    else {
        ctxt.envelope.resp_error(ErrorKind::InvalidQuery, "id", "malformed or missing qos id");
        return;
    };
    match state.dbd.qos_get(Some(id), None).await {
        Ok(Some(qos)) => {
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::Qos, &qos, ctxt, "qos_get") {
                ctxt.envelope.set_payload("qos", value);
            }
        }
        Ok(None) => {
            ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "qos_get", format!("no qos with id {id}"));
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "qos_get", description);
        }
    }
}

/// `POST /qos/` — an id-bearing record is modified in place; an
/// id-less, name-bearing record is created (spec §4.I).
///
/// A modify request that omits `preempt` entirely means "no change", not
/// "clear the list" — the parser can't tell the two apart once it has
/// collapsed the wire sentinel, so this checks the raw body for the key
/// before trusting the parsed field.
pub async fn upsert(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let preempt_in_body = ctxt.body.as_dict().is_ok_and(|d| d.contains_key("preempt"));
    let Some(mut qos) = parse_body::<Qos>(parser.as_ref(), TypeTag::Qos, ctxt, "qos_upsert") else {
        return;
    };
    let result = match qos.id {
        Some(id) => {
            if !preempt_in_body {
                match state.dbd.qos_get(Some(id), None).await {
                    Ok(Some(existing)) => qos.preempt = existing.preempt,
                    Ok(None) => {}
                    Err(e) => {
                        let (kind, description) = classify_backend_error(&e);
                        ctxt.envelope.resp_error(kind, "qos_upsert", description);
                        return;
                    }
                }
            }
            state.dbd.qos_modify(id, qos).await
        }
        None => state.dbd.qos_add(qos).await,
    };
    if let Err(e) = result {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "qos_upsert", description);
        return;
    }
    ctxt.request_commit();
}
