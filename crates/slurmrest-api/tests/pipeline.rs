//! End-to-end request/response tests driving the Axum app in-process
//! against [`MockBackend`], the way a real client would see it.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use slurmrest_api::{AppState, Service};
use slurmrest_backend::{BackendCaps, CtldBackend, DbdBackend, MockBackend};
use slurmrest_codec::{emit_json, parse_json, JsonEmitOptions};
use slurmrest_core::Value;

fn app_with_caps(caps: BackendCaps) -> axum::Router {
    let backend = Arc::new(MockBackend::new());
    let ctld: Arc<dyn CtldBackend> = backend.clone();
    let dbd: Arc<dyn DbdBackend> = backend;
    let state = AppState::new(ctld, dbd, caps);
    Service::new(state).into_router()
}

fn app() -> axum::Router {
    app_with_caps(BackendCaps::default())
}

fn json_body(value: &Value) -> Body {
    Body::from(emit_json(value, JsonEmitOptions::default()))
}

async fn send(app: axum::Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = parse_json(&bytes).expect("response body should be valid JSON");
    (status, value)
}

#[tokio::test]
async fn job_submit_get_and_kill_round_trip() {
    let app = app();

    let mut submit = slurmrest_core::Dict::new();
    submit.insert("name", Value::String("pipeline-test".to_string()));
    submit.insert("partition", Value::String("debug".to_string()));
    let (status, body) = send(app.clone(), "POST", "/slurm/v0.0.39/job/submit", json_body(&Value::Dict(submit))).await;
    assert_eq!(status, StatusCode::OK);
    let job_id = body.as_dict().unwrap().get("job_id").unwrap().as_int64().unwrap();
    assert!(job_id > 0);

    let (status, body) = send(app.clone(), "GET", &format!("/slurm/v0.0.39/job/{job_id}"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_dict().unwrap().get("jobs").unwrap().as_list().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].as_dict().unwrap().get("name").unwrap().as_str().unwrap(), "pipeline-test");

    let (status, body) = send(app.clone(), "DELETE", &format!("/slurm/v0.0.39/job/{job_id}"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_dict().unwrap().get("errors").unwrap().as_list().unwrap().is_empty());
}

#[tokio::test]
async fn job_get_unknown_id_reports_not_found() {
    let app = app();
    let (status, body) = send(app, "GET", "/slurm/v0.0.39/job/999", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let errors = body.as_dict().unwrap().get("errors").unwrap().as_list().unwrap();
    assert_eq!(errors[0].as_dict().unwrap().get("error").unwrap().as_str().unwrap(), "UnknownEntity");
}

#[tokio::test]
async fn unregistered_data_parser_version_is_rejected() {
    let app = app();
    let (status, body) = send(app, "GET", "/slurm/v9.9.9/jobs/", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body.as_dict().unwrap().get("errors").unwrap().as_list().unwrap();
    assert_eq!(errors[0].as_dict().unwrap().get("error").unwrap().as_str().unwrap(), "InvalidQuery");
}

#[tokio::test]
async fn unknown_route_returns_404_with_no_body_parse_required() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/slurm/v0.0.39/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn method_mismatch_on_a_known_path_is_rejected_not_not_found() {
    let app = app();
    let (status, body) = send(app, "PATCH", "/slurm/v0.0.39/jobs/", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let errors = body.as_dict().unwrap().get("errors").unwrap().as_list().unwrap();
    assert_eq!(errors[0].as_dict().unwrap().get("error").unwrap().as_str().unwrap(), "UnsupportedMethod");
}

#[tokio::test]
async fn patch_job_update_is_equivalent_to_post() {
    let app = app();

    let mut submit = slurmrest_core::Dict::new();
    submit.insert("name", Value::String("patch-test".to_string()));
    submit.insert("partition", Value::String("debug".to_string()));
    let (status, body) = send(app.clone(), "POST", "/slurm/v0.0.39/job/submit", json_body(&Value::Dict(submit))).await;
    assert_eq!(status, StatusCode::OK);
    let job_id = body.as_dict().unwrap().get("job_id").unwrap().as_int64().unwrap();

    let mut update = slurmrest_core::Dict::new();
    update.insert("priority", Value::Int64(5));
    let (status, _) = send(app, "PATCH", &format!("/slurm/v0.0.39/job/{job_id}"), json_body(&Value::Dict(update))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn accept_application_yaml_returns_yaml_content_type() {
    let app = app();
    let request = Request::builder()
        .method("GET")
        .uri("/slurm/v0.0.39/ping/")
        .header("accept", "application/yaml")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "application/yaml");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("meta:"));
}

#[tokio::test]
async fn unsupported_http_method_is_rejected() {
    let app = app();
    let (status, body) = send(app, "PUT", "/slurm/v0.0.39/jobs/", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let errors = body.as_dict().unwrap().get("errors").unwrap().as_list().unwrap();
    assert_eq!(errors[0].as_dict().unwrap().get("error").unwrap().as_str().unwrap(), "UnsupportedMethod");
}

#[tokio::test]
async fn account_add_then_modify_reconciles_coordinators() {
    let app = app();

    let mut account = slurmrest_core::Dict::new();
    account.insert("name", Value::String("acct1".to_string()));
    let (status, _) = send(app.clone(), "POST", "/slurmdb/v0.0.39/accounts/", json_body(&Value::Dict(account))).await;
    assert_eq!(status, StatusCode::OK);

    let mut modify = slurmrest_core::Dict::new();
    modify.insert("name", Value::String("acct1".to_string()));
    modify.insert("coordinators", Value::List(vec![Value::String("alice".to_string())]));
    let (status, _) = send(app.clone(), "POST", "/slurmdb/v0.0.39/account/acct1", json_body(&Value::Dict(modify))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), "GET", "/slurmdb/v0.0.39/account/acct1", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let coords = body.as_dict().unwrap().get("account").unwrap().as_dict().unwrap().get("coordinators").unwrap().as_list().unwrap();
    assert_eq!(coords.len(), 1);
    assert_eq!(coords[0].as_str().unwrap(), "alice");
}

#[tokio::test]
async fn user_add_synthesizes_default_wckey() {
    let app = app();

    let mut user = slurmrest_core::Dict::new();
    user.insert("name", Value::String("bob".to_string()));
    user.insert("default_wckey", Value::String("proj1".to_string()));
    let (status, _) = send(app.clone(), "POST", "/slurmdb/v0.0.39/users/", json_body(&Value::Dict(user))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), "GET", "/slurmdb/v0.0.39/wckeys/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let wckeys = body.as_dict().unwrap().get("wckeys").unwrap().as_list().unwrap();
    assert_eq!(wckeys.len(), 1);
    assert_eq!(wckeys[0].as_dict().unwrap().get("name").unwrap().as_str().unwrap(), "proj1");
}

#[tokio::test]
async fn user_modify_body_with_associations_field_records_warning() {
    let app = app();

    let mut user = slurmrest_core::Dict::new();
    user.insert("name", Value::String("carol".to_string()));
    let (status, _) = send(app.clone(), "POST", "/slurmdb/v0.0.39/users/", json_body(&Value::Dict(user))).await;
    assert_eq!(status, StatusCode::OK);

    let mut modify = slurmrest_core::Dict::new();
    modify.insert("name", Value::String("carol".to_string()));
    modify.insert("associations", Value::List(vec![]));
    let (status, body) = send(app.clone(), "POST", "/slurmdb/v0.0.39/user/carol", json_body(&Value::Dict(modify))).await;
    assert_eq!(status, StatusCode::OK);
    let warnings = body.as_dict().unwrap().get("warnings").unwrap().as_list().unwrap();
    assert!(warnings.iter().any(|w| w.as_dict().unwrap().get("source").unwrap().as_str().unwrap() == "users"));
}

#[tokio::test]
async fn qos_list_degrades_to_single_record() {
    let app = app();

    let mut qos = slurmrest_core::Dict::new();
    qos.insert("name", Value::String("normal".to_string()));
    let (status, _) = send(app.clone(), "POST", "/slurmdb/v0.0.39/qos/", json_body(&Value::Dict(qos))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), "GET", "/slurmdb/v0.0.39/qos/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_dict().unwrap().get("qos").unwrap().as_list().unwrap();
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn qos_modify_omitting_preempt_does_not_clear_it() {
    let app = app();

    let mut qos = slurmrest_core::Dict::new();
    qos.insert("name", Value::String("normal".to_string()));
    qos.insert(
        "preempt",
        Value::List(vec![Value::String("low".to_string()), Value::String("standby".to_string())]),
    );
    let (status, _) = send(app.clone(), "POST", "/slurmdb/v0.0.39/qos/", json_body(&Value::Dict(qos))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), "GET", "/slurmdb/v0.0.39/qos/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_dict().unwrap().get("qos").unwrap().as_list().unwrap();
    let id = list[0].as_dict().unwrap().get("id").unwrap().as_int64().unwrap();

    let mut update = slurmrest_core::Dict::new();
    update.insert("id", Value::Int64(id));
    update.insert("name", Value::String("normal".to_string()));
    let (status, _) = send(app.clone(), "POST", "/slurmdb/v0.0.39/qos/", json_body(&Value::Dict(update))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), "GET", &format!("/slurmdb/v0.0.39/qos/{id}"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let preempt = body.as_dict().unwrap().get("qos").unwrap().as_dict().unwrap().get("preempt").unwrap().as_list().unwrap();
    assert_eq!(preempt.len(), 2);

    let mut clear = slurmrest_core::Dict::new();
    clear.insert("id", Value::Int64(id));
    clear.insert("name", Value::String("normal".to_string()));
    clear.insert("preempt", Value::List(vec![Value::String(String::new())]));
    let (status, _) = send(app.clone(), "POST", "/slurmdb/v0.0.39/qos/", json_body(&Value::Dict(clear))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, "GET", &format!("/slurmdb/v0.0.39/qos/{id}"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let preempt = body.as_dict().unwrap().get("qos").unwrap().as_dict().unwrap().get("preempt").unwrap().as_list().unwrap();
    assert!(preempt.is_empty());
}

#[tokio::test]
async fn tres_add_is_disabled_without_the_capability() {
    let app = app_with_caps(BackendCaps { tres_update_enabled: false });

    let mut tres = slurmrest_core::Dict::new();
    tres.insert("type", Value::String("gres".to_string()));
    let (status, body) = send(app, "POST", "/slurmdb/v0.0.39/tres/", json_body(&Value::Dict(tres))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body.as_dict().unwrap().get("errors").unwrap().as_list().unwrap();
    assert_eq!(errors[0].as_dict().unwrap().get("error").unwrap().as_str().unwrap(), "NotSupported");
}

#[tokio::test]
async fn tres_add_succeeds_when_capability_enabled() {
    let app = app_with_caps(BackendCaps { tres_update_enabled: true });

    let mut tres = slurmrest_core::Dict::new();
    tres.insert("type", Value::String("gres".to_string()));
    let (status, body) = send(app.clone(), "POST", "/slurmdb/v0.0.39/tres/", json_body(&Value::Dict(tres))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_dict().unwrap().get("errors").unwrap().as_list().unwrap().is_empty());

    let (status, body) = send(app, "GET", "/slurmdb/v0.0.39/tres/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_dict().unwrap().get("tres").unwrap().as_list().unwrap().len(), 1);
}

#[tokio::test]
async fn config_replay_skips_associations_with_a_warning() {
    let app = app();

    let mut cluster = slurmrest_core::Dict::new();
    cluster.insert("name", Value::String("cluster1".to_string()));
    let (status, _) = send(app.clone(), "POST", "/slurmdb/v0.0.39/clusters/", json_body(&Value::Dict(cluster))).await;
    assert_eq!(status, StatusCode::OK);

    let mut association = slurmrest_core::Dict::new();
    association.insert("account", Value::String("acct1".to_string()));
    association.insert("cluster", Value::String("cluster1".to_string()));
    let mut replay = slurmrest_core::Dict::new();
    replay.insert("clusters", Value::List(vec![]));
    replay.insert("associations", Value::List(vec![Value::Dict(association)]));
    let (status, body) = send(app.clone(), "POST", "/slurmdb/v0.0.39/config/", json_body(&Value::Dict(replay))).await;
    assert_eq!(status, StatusCode::OK);
    let warnings = body.as_dict().unwrap().get("warnings").unwrap().as_list().unwrap();
    assert!(warnings.iter().any(|w| w.as_dict().unwrap().get("source").unwrap().as_str().unwrap() == "config_replay"));

    let (status, body) = send(app, "GET", "/slurmdb/v0.0.39/config/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_dict().unwrap().get("clusters").unwrap().as_list().unwrap().len(), 1);
}
