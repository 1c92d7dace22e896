//! `/reservations/`, `/reservation/{name}` — read-only (spec §4.I).

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parser_for};

/// `GET /reservations/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.ctld.load_reservations(None).await {
        Ok(reservations) => {
            if let Some(value) =
                dump_value(parser.as_ref(), TypeTag::ReservationResp, &reservations, ctxt, "load_reservations")
            {
                if let Ok(dict) = value.as_dict() {
                    ctxt.envelope.merge_payload(dict);
                }
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "load_reservations", description);
        }
    }
}

/// `GET /reservation/{name}` — case-insensitive name match (spec §4.I).
pub async fn get(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::ReservationInvalid, "name", "missing reservation name");
        return;
    };
    match state.ctld.load_reservations(None).await {
        Ok(reservations) => {
            let matched: Vec<_> = reservations
                .into_iter()
                .filter(|r| r.name.eq_ignore_ascii_case(&name))
                .collect();
            if matched.is_empty() {
                ctxt.envelope.resp_error(
                    ErrorKind::ReservationInvalid,
                    "load_reservations",
                    format!("no such reservation {name:?}"),
                );
                return;
            }
            if let Some(value) =
                dump_value(parser.as_ref(), TypeTag::ReservationResp, &matched, ctxt, "load_reservations")
            {
                if let Ok(dict) = value.as_dict() {
                    ctxt.envelope.merge_payload(dict);
                }
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "load_reservations", description);
        }
    }
}
