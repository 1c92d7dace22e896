//! `/nodes/`, `/node/{node_name}` (spec §4.I).

use slurmrest::context::RequestContext;
use slurmrest::{ErrorKind, TypeTag};
use slurmrest_backend::ctld::NodeUpdate;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parse_body, parser_for};

/// `GET /nodes/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.ctld.load_nodes(None, 0).await {
        Ok(nodes) => {
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::NodesResp, &nodes, ctxt, "load_nodes") {
                if let Ok(dict) = value.as_dict() {
                    ctxt.envelope.merge_payload(dict);
                }
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "load_nodes", description);
        }
    }
}

/// `GET /node/{node_name}`.
pub async fn get(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(name) = ctxt.params.get("node_name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "node_name", "missing node name");
        return;
    };
    match state.ctld.load_nodes(Some(&name), 0).await {
        Ok(nodes) if nodes.is_empty() => {
            ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "load_nodes", format!("no such node {name:?}"));
        }
        Ok(nodes) => {
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::NodesResp, &nodes, ctxt, "load_nodes") {
                if let Ok(dict) = value.as_dict() {
                    ctxt.envelope.merge_payload(dict);
                }
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "load_nodes", description);
        }
    }
}

/// `POST /node/{node_name}`. `node_names` is always forced to the path
/// segment, discarding whatever the parsed body carried (spec §4.I).
pub async fn update(state: &AppState, ctxt: &mut RequestContext) {
    let Some(name) = ctxt.params.get("node_name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "node_name", "missing node name");
        return;
    };
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(mut update) = parse_body::<NodeUpdate>(parser.as_ref(), TypeTag::UpdateNodeMsg, ctxt, "update_node")
    else {
        return;
    };
    update.node_names.clone_from(&name);
    if let Err(e) = state.ctld.update_node(&name, update).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "update_node", description);
        return;
    }
    ctxt.request_commit();
}

/// `DELETE /node/{node_name}`.
pub async fn delete(state: &AppState, ctxt: &mut RequestContext) {
    let Some(name) = ctxt.params.get("node_name").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::UnknownEntity, "node_name", "missing node name");
        return;
    };
    if let Err(e) = state.ctld.delete_node(&name).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "delete_node", description);
        return;
    }
    ctxt.request_commit();
}
