//! `/tres/` — list/add. `add` is gated by
//! [`slurmrest_backend::BackendCaps::tres_update_enabled`] (spec §9 open
//! question: TRES update is disabled in release builds unless explicitly
//! enabled).

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};
use slurmrest_backend::dbd::TresType;
use slurmrest_core::Value;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parse_body, parser_for};

/// `GET /tres/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.dbd.tres_get().await {
        Ok(tres) => {
            let dumped: Vec<Value> = tres
                .iter()
                .filter_map(|t| dump_value(parser.as_ref(), TypeTag::Tres, t, ctxt, "tres_get"))
                .collect();
            ctxt.envelope.set_payload("tres", Value::List(dumped));
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "tres_get", description);
        }
    }
}

/// `POST /tres/`.
pub async fn add(state: &AppState, ctxt: &mut RequestContext) {
    if !state.caps.tres_update_enabled {
        ctxt.envelope.resp_error(ErrorKind::NotSupported, "tres_add", "TRES update is disabled in this build");
        return;
    }
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(tres) = parse_body::<TresType>(parser.as_ref(), TypeTag::Tres, ctxt, "tres_add") else {
        return;
    };
    if let Err(e) = state.dbd.tres_add(tres).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "tres_add", description);
        return;
    }
    ctxt.request_commit();
}
