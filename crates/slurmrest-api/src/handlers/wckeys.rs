//! `/wckeys/` — list/add/delete (spec §4.I).

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};
use slurmrest_backend::dbd::Wckey;
use slurmrest_core::Value;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parse_body, parser_for};

/// `GET /wckeys/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.dbd.wckeys_get(None).await {
        Ok(wckeys) => {
            let dumped: Vec<Value> = wckeys
                .iter()
                .filter_map(|w| dump_value(parser.as_ref(), TypeTag::Wckey, w, ctxt, "wckeys_get"))
                .collect();
            ctxt.envelope.set_payload("wckeys", Value::List(dumped));
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "wckeys_get", description);
        }
    }
}

/// `POST /wckeys/`.
pub async fn add(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(wckey) = parse_body::<Wckey>(parser.as_ref(), TypeTag::Wckey, ctxt, "wckeys_add") else {
        return;
    };
    if let Err(e) = state.dbd.wckeys_add(wckey).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "wckeys_add", description);
        return;
    }
    ctxt.request_commit();
}

/// `DELETE /wckey/{name}`.
pub async fn delete(state: &AppState, ctxt: &mut RequestContext) {
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "name", "missing wckey name");
        return;
    };
    if let Err(e) = state.dbd.wckeys_remove(&name).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "wckeys_remove", description);
        return;
    }
    ctxt.request_commit();
}
