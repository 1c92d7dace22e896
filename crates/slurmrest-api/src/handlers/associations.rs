//! `/associations/` — list/modify-by-diff/remove (spec §4.I).

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};
use slurmrest_backend::dbd::{diff_tres, Association, AssociationDiff};
use slurmrest_core::Value;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parser_for, query_str};

fn filter_cond(ctxt: &RequestContext) -> String {
    let mut parts = Vec::new();
    if let Some(account) = query_str(&ctxt.query, "account") {
        parts.push(format!("account={account}"));
    }
    if let Some(user) = query_str(&ctxt.query, "user") {
        parts.push(format!("user={user}"));
    }
    if let Some(cluster) = query_str(&ctxt.query, "cluster") {
        parts.push(format!("cluster={cluster}"));
    }
    parts.join("&")
}

/// `GET /associations/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let cond = filter_cond(ctxt);
    match state.dbd.associations_get(&cond).await {
        Ok(associations) => {
            let dumped: Vec<Value> = associations
                .iter()
                .filter_map(|a| dump_value(parser.as_ref(), TypeTag::Association, a, ctxt, "associations_get"))
                .collect();
            ctxt.envelope.set_payload("associations", Value::List(dumped));
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "associations_get", description);
        }
    }
}

/// `POST /associations/` — applies the TRES delta between each incoming
/// association and its current state (spec §4.I: fields are a *diff*,
/// not a replacement).
pub async fn modify(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let items: Vec<Value> = match ctxt.body.as_dict().ok().and_then(|d| d.get("associations")).cloned() {
        Some(Value::List(items)) => items,
        _ => vec![ctxt.body.clone()],
    };

    let mut applied_any = false;
    for item in items {
        let mut scratch = slurmrest::Envelope::new();
        let Ok(record) = parser.parse(TypeTag::Association, &item, "", &mut scratch, "associations_modify") else {
            continue;
        };
        let Some(incoming) = record.downcast::<Association>().ok().map(|b| *b) else { continue };
        let Some(id) = incoming.id else {
            ctxt.envelope.resp_error(
                ErrorKind::InvalidQuery,
                "associations_modify",
                "an association to modify must carry its id",
            );
            continue;
        };
        let cond = format!("id={id}");
        let existing = match state.dbd.associations_get(&cond).await {
            Ok(found) if found.len() == 1 => found.into_iter().next().unwrap(),
            Ok(found) if found.is_empty() => {
                ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "associations_get", format!("no association {id}"));
                continue;
            }
            Ok(_) => {
                ctxt.envelope.resp_error(ErrorKind::AmbiguousModify, "associations_get", format!("id {id} matched more than one association"));
                continue;
            }
            Err(e) => {
                let (kind, description) = classify_backend_error(&e);
                ctxt.envelope.resp_error(kind, "associations_get", description);
                continue;
            }
        };
        let delta = diff_tres(&existing.tres, &incoming.tres);
        if let Err(e) = state.dbd.associations_modify(AssociationDiff { id, tres_delta: delta }).await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "associations_modify", description);
            continue;
        }
        applied_any = true;
    }
    if applied_any && !ctxt.envelope.has_errors() {
        ctxt.request_commit();
    }
}

/// `DELETE /associations/`.
pub async fn remove(state: &AppState, ctxt: &mut RequestContext) {
    let cond = filter_cond(ctxt);
    if cond.is_empty() {
        ctxt.envelope.resp_error(ErrorKind::InvalidQuery, "associations_remove", "at least one filter is required");
        return;
    }
    match state.dbd.associations_remove(&cond).await {
        Ok(_removed) => ctxt.request_commit(),
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "associations_remove", description);
        }
    }
}
