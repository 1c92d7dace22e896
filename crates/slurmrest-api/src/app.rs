//! The Axum transport layer: a single fallback service that resolves
//! every request through [`Routes`] rather than Axum's own router, since
//! the path table already lives in [`crate::operation`] (spec §4.G/§6).

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;

use slurmrest::context::RequestContext;
use slurmrest::errors::ErrorKind;
use slurmrest::router::Method as RestMethod;
use slurmrest::{Envelope, Meta};
use slurmrest_codec::{emit_json, emit_yaml, parse_json, parse_urlform, JsonEmitOptions};
use slurmrest_core::{Dict, Value};

use crate::handlers;
use crate::operation::{Operation, Resolution, Routes};
use crate::state::AppState;

/// The two response encodings content negotiation chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    Json,
    Yaml,
}

/// Picks [`ResponseFormat::Yaml`] only when the client's `Accept` header
/// names `application/yaml` or `text/yaml`; anything else, including an
/// absent header, keeps the JSON critical path.
fn negotiate_format(parts: &axum::http::request::Parts) -> ResponseFormat {
    let accept = parts.headers.get(axum::http::header::ACCEPT).and_then(|v| v.to_str().ok()).unwrap_or("");
    if accept.contains("application/yaml") || accept.contains("text/yaml") {
        ResponseFormat::Yaml
    } else {
        ResponseFormat::Json
    }
}

fn render_body(value: &Value, format: ResponseFormat) -> (&'static str, String) {
    match format {
        ResponseFormat::Json => ("application/json", emit_json(value, JsonEmitOptions::default())),
        ResponseFormat::Yaml => match emit_yaml(value) {
            Ok(body) => ("application/yaml", body),
            Err(e) => {
                tracing::warn!(error = %e, "yaml emission failed, falling back to json");
                ("application/json", emit_json(value, JsonEmitOptions::default()))
            }
        },
    }
}

/// Everything the fallback handler needs beyond the per-request state:
/// the shared app state and the fixed route table, built once at
/// startup.
#[derive(Clone)]
pub struct Service {
    state: AppState,
    routes: Arc<Routes>,
}

impl Service {
    /// Build a [`Service`] over `state`, constructing the route table.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            routes: Arc::new(Routes::build()),
        }
    }

    /// The Axum [`Router`] serving every endpoint through [`dispatch`].
    #[must_use]
    pub fn into_router(self) -> Router {
        Router::new().fallback(dispatch).with_state(self)
    }
}

fn http_method(method: &axum::http::Method) -> Option<RestMethod> {
    match *method {
        axum::http::Method::GET => Some(RestMethod::Get),
        axum::http::Method::POST => Some(RestMethod::Post),
        axum::http::Method::DELETE => Some(RestMethod::Delete),
        axum::http::Method::PATCH => Some(RestMethod::Patch),
        _ => None,
    }
}

fn parse_query(raw: Option<&str>) -> Dict {
    let Some(q) = raw else { return Dict::new() };
    parse_urlform(q).ok().and_then(|v| v.as_dict().ok().cloned()).unwrap_or_default()
}

fn parse_body(bytes: &Bytes) -> Result<Value, ErrorKind> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    parse_json(bytes).map_err(|e| ErrorKind::from(e.kind))
}

async fn dispatch(State(service): State<Service>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let format = negotiate_format(&parts);
    let Some(method) = http_method(&parts.method) else {
        return render_transport_error(ErrorKind::UnsupportedMethod, &service.state, format, "unsupported HTTP method");
    };

    let path = parts.uri.path().to_string();
    let (operation, params) = match service.routes.resolve(method, &path) {
        Resolution::Matched(operation, params) => (operation, params),
        Resolution::MethodMismatch => {
            tracing::debug!(%path, "path matched a different method");
            return render_transport_error(ErrorKind::UnsupportedMethod, &service.state, format, "method not allowed for this path");
        }
        Resolution::NotFound => {
            tracing::debug!(%path, "no route matched");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let query = parse_query(parts.uri.query());
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return render_transport_error(ErrorKind::InvalidQuery, &service.state, format, "failed to read request body"),
    };
    let body_value = match parse_body(&bytes) {
        Ok(value) => value,
        Err(kind) => return render_transport_error(kind, &service.state, format, "request body is not valid JSON"),
    };

    let mut ctxt = RequestContext::new(method, params, query, body_value, client_id(&parts));
    run_operation(operation, &service.state, &mut ctxt).await;

    if ctxt.should_commit() {
        if let Err(e) = service.state.dbd.commit().await {
            tracing::warn!(error = %e, "commit failed after a successful mutation");
        }
    } else if ctxt.envelope.has_errors() {
        tracing::debug!(code = ctxt.envelope.result_code(), "request completed with an error");
    }

    let status = response_status(&ctxt);
    let meta = meta_for(&service.state);
    let (content_type, body) = render_body(&ctxt.finish(&meta), format);
    (status, [("content-type", content_type)], body).into_response()
}

fn client_id(parts: &axum::http::request::Parts) -> String {
    parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

fn meta_for(state: &AppState) -> Meta {
    Meta {
        plugin_type: state.build.plugin_type.clone(),
        plugin_name: state.build.plugin_name.clone(),
        slurm_release: state.build.slurm_release.clone(),
        slurm_version: state.build.slurm_version,
        client_source: "slurmrest".to_string(),
        client_uid: 0,
        client_gid: 0,
    }
}

fn render_transport_error(kind: ErrorKind, state: &AppState, format: ResponseFormat, description: &str) -> Response {
    let mut envelope = Envelope::new();
    envelope.resp_error(kind, "transport", description);
    let status = StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    let (content_type, body) = render_body(&envelope.into_value(&meta_for(state)), format);
    (status, [("content-type", content_type)], body).into_response()
}

/// `200` for any successful request — reads, mutations, and commits
/// alike, matching the source's practice of reporting success through
/// the envelope's empty `errors` list rather than the status line — or
/// the first recorded error's mapped status.
fn response_status(ctxt: &RequestContext) -> StatusCode {
    if !ctxt.envelope.has_errors() {
        return StatusCode::OK;
    }
    status_for_code(ctxt.envelope.result_code())
}

fn status_for_code(code: i64) -> StatusCode {
    for kind in known_kinds() {
        if kind.code() == code {
            return StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

fn known_kinds() -> [ErrorKind; 24] {
    [
        ErrorKind::InvalidQuery,
        ErrorKind::DataPathNotFound,
        ErrorKind::DataExpectedDict,
        ErrorKind::DataExpectedList,
        ErrorKind::DataConvFailed,
        ErrorKind::AmbiguousModify,
        ErrorKind::AmbiguousQuery,
        ErrorKind::EmptyResult,
        ErrorKind::InvalidJobId,
        ErrorKind::InvalidPartitionName,
        ErrorKind::ReservationInvalid,
        ErrorKind::NotSupported,
        ErrorKind::UtfEncodingViolation,
        ErrorKind::UrlFormParse,
        ErrorKind::UnknownEntity,
        ErrorKind::JobAlreadyDone,
        ErrorKind::JobHeld,
        ErrorKind::PreemptionLoop,
        ErrorKind::LicenseUnavailable,
        ErrorKind::DbConnection,
        ErrorKind::BackendRpcFailed,
        ErrorKind::RecursionDepthExceeded,
        ErrorKind::Utf16Or32Body,
        ErrorKind::UnsupportedMethod,
    ]
}

async fn run_operation(operation: Operation, state: &AppState, ctxt: &mut RequestContext) {
    match operation {
        Operation::JobsList | Operation::JobsState => handlers::jobs::list(state, ctxt).await,
        Operation::JobsKill => handlers::jobs::kill(state, ctxt).await,
        Operation::JobGet => handlers::jobs::get(state, ctxt).await,
        Operation::JobUpdate => handlers::jobs::update(state, ctxt).await,
        Operation::JobDelete => handlers::jobs::delete(state, ctxt).await,
        Operation::JobSubmit => handlers::jobs::submit(state, ctxt).await,
        Operation::JobAllocate => handlers::jobs::allocate(state, ctxt).await,

        Operation::NodesList => handlers::nodes::list(state, ctxt).await,
        Operation::NodeGet => handlers::nodes::get(state, ctxt).await,
        Operation::NodeUpdate => handlers::nodes::update(state, ctxt).await,
        Operation::NodeDelete => handlers::nodes::delete(state, ctxt).await,

        Operation::PartitionsList => handlers::partitions::list(state, ctxt).await,
        Operation::PartitionGet => handlers::partitions::get(state, ctxt).await,
        Operation::ReservationsList => handlers::reservations::list(state, ctxt).await,
        Operation::ReservationGet => handlers::reservations::get(state, ctxt).await,

        Operation::Ping => handlers::diag::ping(state, ctxt).await,
        Operation::Diag => handlers::diag::diag(state, ctxt).await,
        Operation::Licenses => handlers::diag::licenses(state, ctxt).await,
        Operation::Shares => handlers::diag::shares(state, ctxt).await,
        Operation::Reconfigure => handlers::diag::reconfigure(state, ctxt).await,

        Operation::AccountsList => handlers::accounts::list(state, ctxt).await,
        Operation::AccountAdd => handlers::accounts::add(state, ctxt).await,
        Operation::AccountGet => handlers::accounts::get(state, ctxt).await,
        Operation::AccountModify => handlers::accounts::modify(state, ctxt).await,
        Operation::AccountDelete => handlers::accounts::delete(state, ctxt).await,

        Operation::AssociationsList => handlers::associations::list(state, ctxt).await,
        Operation::AssociationsModify => handlers::associations::modify(state, ctxt).await,
        Operation::AssociationsDelete => handlers::associations::remove(state, ctxt).await,

        Operation::QosList => handlers::qos::list(state, ctxt).await,
        Operation::QosUpsert => handlers::qos::upsert(state, ctxt).await,
        Operation::QosGet => handlers::qos::get(state, ctxt).await,

        Operation::UsersList => handlers::users::list(state, ctxt).await,
        Operation::UserAdd => handlers::users::add(state, ctxt).await,
        Operation::UserGet => handlers::users::get(state, ctxt).await,
        Operation::UserModify => handlers::users::modify(state, ctxt).await,

        Operation::WckeysList => handlers::wckeys::list(state, ctxt).await,
        Operation::WckeyAdd => handlers::wckeys::add(state, ctxt).await,
        Operation::WckeyDelete => handlers::wckeys::delete(state, ctxt).await,

        Operation::TresList => handlers::tres::list(state, ctxt).await,
        Operation::TresAdd => handlers::tres::add(state, ctxt).await,

        Operation::ClustersList => handlers::clusters::list(state, ctxt).await,
        Operation::ClusterAdd => handlers::clusters::add(state, ctxt).await,
        Operation::ClusterGet => handlers::clusters::get(state, ctxt).await,
        Operation::ClusterModify => handlers::clusters::modify(state, ctxt).await,
        Operation::ClusterDelete => handlers::clusters::delete(state, ctxt).await,

        Operation::DbdDiag => handlers::diag::dbd_diag(state, ctxt).await,
        Operation::DbdPing => handlers::diag::dbd_ping(state, ctxt).await,

        Operation::ConfigGet => handlers::config::get(state, ctxt).await,
        Operation::ConfigReplay => handlers::config::replay(state, ctxt).await,
    }
}
