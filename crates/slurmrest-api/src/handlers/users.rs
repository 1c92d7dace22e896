//! `/users/`, `/user/{name}` — including rename (`old_name` → `name`)
//! and default-wckey synthesis (spec §4.I).

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};
use slurmrest_backend::dbd::{User, Wckey};
use slurmrest_core::Value;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parse_body, parser_for};

fn warn_on_ignored_fields(ctxt: &mut RequestContext) {
    let Ok(dict) = ctxt.body.as_dict() else { return };
    if dict.contains_key("associations") {
        ctxt.envelope.resp_warn("users", "associations field ignored; modify via the associations endpoint");
    }
    if dict.contains_key("coord_accts") {
        ctxt.envelope.resp_warn("users", "coord_accts field ignored; modify via the accounts endpoint");
    }
}

async fn synthesize_default_wckey(state: &AppState, ctxt: &mut RequestContext, user: &User) {
    let Some(wckey_name) = user.default_wckey.as_deref() else { return };
    if wckey_name.is_empty() || user.wckey_list.iter().any(|w| w == wckey_name) {
        return;
    }
    let wckey = Wckey {
        name: wckey_name.to_string(),
        user: user.name.clone(),
        cluster: String::new(),
    };
    if let Err(e) = state.dbd.wckeys_add(wckey).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "wckeys_add", format!("synthesizing default wckey: {description}"));
    }
}

/// `GET /users/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.dbd.users_get(None).await {
        Ok(users) => {
            let dumped: Vec<Value> = users
                .iter()
                .filter_map(|u| dump_value(parser.as_ref(), TypeTag::User, u, ctxt, "users_get"))
                .collect();
            ctxt.envelope.set_payload("users", Value::List(dumped));
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "users_get", description);
        }
    }
}

/// `GET /user/{name}`.
pub async fn get(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "name", "missing user name");
        return;
    };
    match state.dbd.users_get(Some(&name)).await {
        Ok(users) if users.is_empty() => {
            ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "users_get", format!("no such user {name:?}"));
        }
        Ok(users) => {
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::User, &users[0], ctxt, "users_get") {
                ctxt.envelope.set_payload("user", value);
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "users_get", description);
        }
    }
}

/// `POST /users/`.
pub async fn add(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    warn_on_ignored_fields(ctxt);
    let Some(user) = parse_body::<User>(parser.as_ref(), TypeTag::User, ctxt, "users_add") else {
        return;
    };
    synthesize_default_wckey(state, ctxt, &user).await;
    if let Err(e) = state.dbd.users_add(user).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "users_add", description);
        return;
    }
    if !ctxt.envelope.has_errors() {
        ctxt.request_commit();
    }
}

/// `POST /user/{name}` — `name` is the pre-rename name; the body's own
/// `name` field carries the new name when this is a rename.
pub async fn modify(state: &AppState, ctxt: &mut RequestContext) {
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "name", "missing user name");
        return;
    };
    let Some(parser) = parser_for(state, ctxt) else { return };
    warn_on_ignored_fields(ctxt);
    let Some(user) = parse_body::<User>(parser.as_ref(), TypeTag::User, ctxt, "users_modify") else {
        return;
    };
    synthesize_default_wckey(state, ctxt, &user).await;
    if let Err(e) = state.dbd.users_modify(&name, user).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "users_modify", description);
        return;
    }
    if !ctxt.envelope.has_errors() {
        ctxt.request_commit();
    }
}
