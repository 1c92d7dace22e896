//! `/jobs/`, `/job/{job_id}`, `/job/submit`, `/job/allocate` (spec §4.I).

use slurmrest::context::{db_query_list, ListQueryOutcome, RequestContext};
use slurmrest::{ErrorKind, TypeTag};
use slurmrest_backend::ctld::{CompositeJobId, HetJobComponents, JobDescription, JobRecord, KillJobsRequest};
use slurmrest_core::Value;

use crate::state::AppState;
use crate::support::{classify_backend_error, dump_value, parse_body, parser_for, query_i64, query_u32};

/// The default signal a bulk kill uses when the request omits one —
/// `SIGKILL`, which is POSIX-standard and thus safe to hardcode without
/// a verified source value.
const DEFAULT_KILL_SIGNAL: i32 = 9;

/// The default kill flags when the request omits them. No verified
/// source value exists for `FULL_JOB` in the retrieved material; `0`
/// (no special handling) is the conservative default (see DESIGN.md).
const DEFAULT_KILL_FLAGS: u32 = 0;

/// The `uid`/`gid` `/job/allocate` forces onto every submitted
/// component — the standard Linux `nobody` id (see DESIGN.md).
const NOBODY_ID: u32 = 65534;

fn job_info_tree(ctxt: &mut RequestContext, parser: &dyn slurmrest::DataParser, jobs: &[JobRecord]) {
    let now = chrono::Utc::now().timestamp();
    let record = (jobs.to_vec(), now, 0i64);
    if let Some(dumped) = dump_value(parser, TypeTag::JobInfoMsg, &record, ctxt, "load_jobs") {
        if let Ok(dict) = dumped.as_dict() {
            ctxt.envelope.merge_payload(dict);
        }
    }
}

/// `GET /jobs/` and `GET /jobs/state/`.
pub async fn list(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let update_time = query_i64(&ctxt.query, "update_time", 0);
    let flags = query_u32(&ctxt.query, "flags", 0);
    let outcome = match state.ctld.load_jobs(update_time, flags).await {
        Ok(jobs) => ListQueryOutcome::Data(jobs),
        Err(slurmrest_backend::BackendError::NoChangeInData) => ListQueryOutcome::NoChangeInData,
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ListQueryOutcome::Error { kind, description }
        }
    };
    let Some(jobs) = db_query_list(ctxt, "load_jobs", false, || outcome) else { return };
    job_info_tree(ctxt, parser.as_ref(), &jobs);
}

/// `GET /job/{job_id}`.
pub async fn get(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(raw) = ctxt.params.get("job_id").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::InvalidJobId, "job_id", "missing job id");
        return;
    };
    let Some(id) = CompositeJobId::parse(&raw) else {
        ctxt.envelope.resp_error(ErrorKind::InvalidJobId, "job_id", format!("malformed job id {raw:?}"));
        return;
    };
    match state.ctld.load_job(id).await {
        Ok(job) => job_info_tree(ctxt, parser.as_ref(), std::slice::from_ref(&job)),
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "load_job", description);
        }
    }
}

/// `POST /job/{job_id}`.
pub async fn update(state: &AppState, ctxt: &mut RequestContext) {
    let Some(raw) = ctxt.params.get("job_id").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::InvalidJobId, "job_id", "missing job id");
        return;
    };
    let Some(id) = CompositeJobId::parse(&raw) else {
        ctxt.envelope.resp_error(ErrorKind::InvalidJobId, "job_id", format!("malformed job id {raw:?}"));
        return;
    };
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(desc) = parse_body::<JobDescription>(parser.as_ref(), TypeTag::JobDescMsg, ctxt, "update_job") else {
        return;
    };
    if let Err(e) = state.ctld.update_job(id, desc).await {
        let (kind, description) = classify_backend_error(&e);
        ctxt.envelope.resp_error(kind, "update_job", description);
        return;
    }
    ctxt.request_commit();
}

async fn kill_and_report(state: &AppState, ctxt: &mut RequestContext, request: KillJobsRequest) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    match state.ctld.kill_jobs(request).await {
        Ok(results) => {
            if let Some(value) = dump_value(parser.as_ref(), TypeTag::KillJobsMsg, &results, ctxt, "kill_jobs") {
                ctxt.envelope.set_payload("errors", value);
                ctxt.request_commit();
            }
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "kill_jobs", description);
        }
    }
}

/// `DELETE /jobs/` — bulk kill by body-supplied job id list.
pub async fn kill(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(mut request) = parse_body::<KillJobsRequest>(parser.as_ref(), TypeTag::KillJobsMsg, ctxt, "kill_jobs")
    else {
        return;
    };
    if request.signal.is_none() {
        request.signal = Some(DEFAULT_KILL_SIGNAL);
    }
    if request.flags.is_none() {
        request.flags = Some(DEFAULT_KILL_FLAGS);
    }
    kill_and_report(state, ctxt, request).await;
}

/// `DELETE /job/{job_id}` — single-job cancel, modeled as a one-element
/// kill request (this backend surface has no dedicated cancel RPC).
pub async fn delete(state: &AppState, ctxt: &mut RequestContext) {
    let Some(raw) = ctxt.params.get("job_id").and_then(|v| v.as_str().ok()).map(str::to_string) else {
        ctxt.envelope.resp_error(ErrorKind::InvalidJobId, "job_id", "missing job id");
        return;
    };
    let Some(id) = CompositeJobId::parse(&raw) else {
        ctxt.envelope.resp_error(ErrorKind::InvalidJobId, "job_id", format!("malformed job id {raw:?}"));
        return;
    };
    let request = KillJobsRequest {
        job_ids: vec![id.job_id],
        signal: Some(DEFAULT_KILL_SIGNAL),
        flags: Some(DEFAULT_KILL_FLAGS),
        user_name: None,
    };
    kill_and_report(state, ctxt, request).await;
}

fn components_from_body(parser: &dyn slurmrest::DataParser, ctxt: &mut RequestContext, source: &str) -> Option<HetJobComponents> {
    let components = match ctxt.body.as_dict().ok().and_then(|d| d.get("jobs")).cloned() {
        Some(Value::List(items)) => items
            .iter()
            .filter_map(|item| {
                let mut scratch_envelope = slurmrest::Envelope::new();
                match parser.parse(TypeTag::JobDescMsg, item, "", &mut scratch_envelope, source) {
                    Ok(record) => record.downcast::<JobDescription>().ok().map(|b| *b),
                    Err(_) => None,
                }
            })
            .collect(),
        _ => vec![parse_body::<JobDescription>(parser, TypeTag::JobDescMsg, ctxt, source)?],
    };
    Some(components)
}

/// `POST /job/submit`.
pub async fn submit(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(components) = components_from_body(parser.as_ref(), ctxt, "submit_job") else {
        ctxt.envelope.resp_error(ErrorKind::InvalidQuery, "submit_job", "request body did not contain a job description");
        return;
    };
    match state.ctld.submit_job(components).await {
        Ok(ids) => {
            if let Some(&first) = ids.first() {
                ctxt.envelope.set_payload("job_id", Value::Int64(i64::from(first)));
            }
            ctxt.envelope.set_payload("job_ids", Value::List(ids.into_iter().map(|id| Value::Int64(i64::from(id))).collect()));
            ctxt.request_commit();
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "submit_job", description);
        }
    }
}

/// `POST /job/allocate` — like submit, but every component's `user_id`/
/// `group_id` is forced to `nobody` regardless of what the body carried.
pub async fn allocate(state: &AppState, ctxt: &mut RequestContext) {
    let Some(parser) = parser_for(state, ctxt) else { return };
    let Some(mut components) = components_from_body(parser.as_ref(), ctxt, "allocate_job") else {
        ctxt.envelope.resp_error(ErrorKind::InvalidQuery, "allocate_job", "request body did not contain a job description");
        return;
    };
    for component in &mut components {
        component.user_id = Some(NOBODY_ID);
        component.group_id = Some(NOBODY_ID);
    }
    match state.ctld.allocate_job(components).await {
        Ok(ids) => {
            ctxt.envelope.set_payload("job_ids", Value::List(ids.into_iter().map(|id| Value::Int64(i64::from(id))).collect()));
            ctxt.request_commit();
        }
        Err(e) => {
            let (kind, description) = classify_backend_error(&e);
            ctxt.envelope.resp_error(kind, "allocate_job", description);
        }
    }
}
