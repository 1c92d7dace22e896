//! `/accounts/`, `/account/{name}` — including coordinator reconciliation
//! (spec §4.I: coordinators are granted/revoked via dedicated RPCs, not
//! folded into the account record's own modify call).

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};
use slurmrest_backend::dbd::Account;
use slurmrest_core::Value;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parse_body, parser_for};

/// `GET /accounts/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.dbd.accounts_get(None).await {
        Ok(accounts) => {
            let dumped: Vec<Value> = accounts
                .iter()
                .filter_map(|a| dump_value(parser.as_ref(), TypeTag::Account, a, ctxt, "accounts_get"))
                .collect();
            ctxt.envelope.set_payload("accounts", Value::List(dumped));
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "accounts_get", description);
        }
    }
}

/// `GET /account/{name}`.
pub async fn get(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "name", "missing account name");
        return;
    };
    match state.dbd.accounts_get(Some(&name)).await {
        Ok(accounts) if accounts.is_empty() => {
            ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "accounts_get", format!("no such account {name:?}"));
        }
        Ok(accounts) => {
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::Account, &accounts[0], ctxt, "accounts_get") {
                ctxt.envelope.set_payload("account", value);
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "accounts_get", description);
        }
    }
}

/// `POST /accounts/` — adds each account listed under the body's
/// `accounts` key (or a single bare account if that key is absent).
pub async fn add(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let items: Vec<Value> = match ctxt.body.as_dict().ok().and_then(|d| d.get("accounts")).cloned() {
        Some(Value::List(items)) => items,
        _ => vec![ctxt.body.clone()],
    };
    let mut committed_any = false;
    for item in items {
        let mut scratch = slurmrest::Envelope::new();
        let Ok(record) = parser.parse(TypeTag::Account, &item, "", &mut scratch, "accounts_add") else {
            continue;
        };
        let Some(account) = record.downcast::<Account>().ok().map(|b| *b) else { continue };
        let name = account.name.clone();
        match state.dbd.accounts_add(account).await {
            Ok(()) => committed_any = true,
            Err(e) => {
                let (kind, description) = classify_backend_error(&e);
                ctxt.envelope.resp_error(kind, "accounts_add", format!("{name}: {description}"));
            }
        }
    }
    if committed_any && !ctxt.envelope.has_errors() {
        ctxt.request_commit();
    }
}

/// `POST /account/{name}` — modifies fields and reconciles the
/// coordinator list against the backend's dedicated grant/revoke RPCs.
pub async fn modify(state: &AppState, ctxt: &mut RequestContext) {
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "name", "missing account name");
        return;
    };
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(account) = parse_body::<Account>(parser.as_ref(), TypeTag::Account, ctxt, "accounts_modify") else {
        return;
    };

    let existing_coordinators = match state.dbd.accounts_get(Some(&name)).await {
        Ok(accounts) => accounts.first().map(|a| a.coordinators.clone()).unwrap_or_default(),
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "accounts_get", description);
            return;
        }
    };

    let to_add = account.coordinators.iter().filter(|c| !existing_coordinators.contains(c));
    for user in to_add {
        if let Err(e) = state.dbd.coord_add(&name, user).await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "coord_add", format!("{user}: {description}"));
        }
    }
    let to_remove = existing_coordinators.iter().filter(|c| !account.coordinators.contains(c));
    for user in to_remove {
        if let Err(e) = state.dbd.coord_remove(&name, user).await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "coord_remove", format!("{user}: {description}"));
        }
    }

    if let Err(e) = state.dbd.accounts_modify(&name, account).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "accounts_modify", description);
        return;
    }
    if !ctxt.envelope.has_errors() {
        ctxt.request_commit();
    }
}

/// `DELETE /account/{name}`.
pub async fn delete(state: &AppState, ctxt: &mut RequestContext) {
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "name", "missing account name");
        return;
    };
    if let Err(e) = state.dbd.accounts_remove(&name).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "accounts_remove", description);
        return;
    }
    ctxt.request_commit();
}
