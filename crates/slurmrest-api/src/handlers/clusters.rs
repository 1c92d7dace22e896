//! `/clusters/`, `/cluster/{name}` — list/add/get/modify/delete
//! (spec §4.I).

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};
use slurmrest_backend::dbd::Cluster;
use slurmrest_core::Value;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parse_body, parser_for};

/// `GET /clusters/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.dbd.clusters_get(None).await {
        Ok(clusters) => {
            let dumped: Vec<Value> = clusters
                .iter()
                .filter_map(|c| dump_value(parser.as_ref(), TypeTag::Cluster, c, ctxt, "clusters_get"))
                .collect();
            ctxt.envelope.set_payload("clusters", Value::List(dumped));
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "clusters_get", description);
        }
    }
}

/// `GET /cluster/{name}`.
pub async fn get(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "name", "missing cluster name");
        return;
    };
    match state.dbd.clusters_get(Some(&name)).await {
        Ok(clusters) if clusters.is_empty() => {
            ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "clusters_get", format!("no such cluster {name:?}"));
        }
        Ok(clusters) => {
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::Cluster, &clusters[0], ctxt, "clusters_get") {
                ctxt.envelope.set_payload("cluster", value);
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "clusters_get", description);
        }
    }
}

/// `POST /clusters/`.
pub async fn add(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(cluster) = parse_body::<Cluster>(parser.as_ref(), TypeTag::Cluster, ctxt, "clusters_add") else {
        return;
    };
    if let Err(e) = state.dbd.clusters_add(cluster).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "clusters_add", description);
        return;
    }
    ctxt.request_commit();
}

/// `POST /cluster/{name}`.
pub async fn modify(state: &AppState, ctxt: &mut RequestContext) {
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "name", "missing cluster name");
        return;
    };
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(cluster) = parse_body::<Cluster>(parser.as_ref(), TypeTag::Cluster, ctxt, "clusters_modify") else {
        return;
    };
    if let Err(e) = state.dbd.clusters_modify(&name, cluster).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "clusters_modify", description);
        return;
    }
    ctxt.request_commit();
}

/// `DELETE /cluster/{name}`.
pub async fn delete(state: &AppState, ctxt: &mut RequestContext) {
    let Some(name) = ctxt.params.get("name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "name", "missing cluster name");
        return;
    };
    if let Err(e) = state.dbd.clusters_remove(&name).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "clusters_remove", description);
        return;
    }
    ctxt.request_commit();
}
