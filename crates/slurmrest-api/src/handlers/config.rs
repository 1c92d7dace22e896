//! `/config/` — the fan-out accounting dump/replay (spec §4.I:
//! "assembling clusters, TRES, accounts, users, QOS, wckeys, associations
//! into a single envelope").
//!
//! Replay re-adds every entity that has a dedicated add RPC. Associations
//! do not: [`slurmrest_backend::dbd::AssociationDiff`] only carries an id
//! and a TRES delta, not the account/user/cluster triple a fresh
//! association needs, so a config with associations is replayed with a
//! warning rather than silently dropping them.

use slurmrest::context::RequestContext;
use slurmrest::TypeTag;
use slurmrest_backend::dbd::ConfigDump;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parse_body, parser_for};

/// `GET /config/`.
pub async fn get(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.dbd.config_dump().await {
        Ok(config) => {
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::Config, &config, ctxt, "config_dump") {
                if let Ok(dict) = value.as_dict() {
                    ctxt.envelope.merge_payload(dict);
                }
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "config_dump", description);
        }
    }
}

/// `POST /config/` — replays a previously dumped configuration.
pub async fn replay(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(config) = parse_body::<ConfigDump>(parser.as_ref(), TypeTag::Config, ctxt, "config_replay") else {
        return;
    };

    for cluster in config.clusters {
        if let Err(e) = state.dbd.clusters_add(cluster).await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "clusters_add", description);
        }
    }
    for tres in config.tres {
        if let Err(e) = state.dbd.tres_add(tres).await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "tres_add", description);
        }
    }
    for account in config.accounts {
        if let Err(e) = state.dbd.accounts_add(account).await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "accounts_add", description);
        }
    }
    for user in config.users {
        if let Err(e) = state.dbd.users_add(user).await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "users_add", description);
        }
    }
    for qos in config.qos {
        if let Err(e) = state.dbd.qos_add(qos).await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "qos_add", description);
        }
    }
    for wckey in config.wckeys {
        if let Err(e) = state.dbd.wckeys_add(wckey).await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "wckeys_add", description);
        }
    }
    if !config.associations.is_empty() {
        ctxt.envelope.resp_warn(
            "config_replay",
            format!("{} association(s) skipped; replay cannot recreate associations from a diff-shaped RPC", config.associations.len()),
        );
    }

    if !ctxt.envelope.has_errors() {
        if let Err(e) = state.dbd.commit().await {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "commit", description);
            return;
        }
        ctxt.request_commit();
    }
}
