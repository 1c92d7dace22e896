//! `JOB_DESC_MSG` / `JOB_INFO_MSG` / `KILL_JOBS_MSG` transcoding.

use slurmrest_backend::ctld::{JobDescription, JobRecord, KillJobResult, KillJobsRequest};
use slurmrest_core::{Dict, Value};

use crate::common::{get_i32, get_str, get_u32, get_u32_list, set_i64, set_opt_str, set_str};

pub(crate) fn parse_job_description(dict: &Dict) -> JobDescription {
    JobDescription {
        name: get_str(dict, "name"),
        partition: get_str(dict, "partition"),
        script: get_str(dict, "script"),
        min_nodes: get_u32(dict, "min_nodes"),
        user_id: get_u32(dict, "user_id"),
        group_id: get_u32(dict, "group_id"),
    }
}

pub(crate) fn dump_job_record(job: &JobRecord) -> Value {
    let mut dict = Dict::new();
    set_i64(&mut dict, "job_id", i64::from(job.job_id));
    if let Some(het) = job.het_job_id {
        set_i64(&mut dict, "het_job_id", i64::from(het));
    }
    if let Some(array_job_id) = job.array_job_id {
        set_i64(&mut dict, "array_job_id", i64::from(array_job_id));
    }
    if let Some(array_task_id) = job.array_task_id {
        set_i64(&mut dict, "array_task_id", i64::from(array_task_id));
    }
    set_str(&mut dict, "name", &job.name);
    set_i64(&mut dict, "user_id", i64::from(job.user_id));
    set_str(&mut dict, "job_state", &job.job_state);
    set_str(&mut dict, "partition", &job.partition);
    Value::Dict(dict)
}

pub(crate) fn dump_job_list(jobs: &[JobRecord], last_update: i64, last_backfill: i64) -> Value {
    let mut dict = Dict::new();
    dict.insert("jobs", Value::List(jobs.iter().map(dump_job_record).collect()));
    set_i64(&mut dict, "last_update", last_update);
    set_i64(&mut dict, "last_backfill", last_backfill);
    Value::Dict(dict)
}

pub(crate) fn parse_kill_jobs_request(dict: &Dict) -> KillJobsRequest {
    KillJobsRequest {
        job_ids: get_u32_list(dict, "jobs"),
        signal: get_i32(dict, "signal"),
        flags: get_u32(dict, "flags"),
        user_name: get_str(dict, "user_name"),
    }
}

pub(crate) fn dump_kill_results(results: &[KillJobResult]) -> Value {
    Value::List(
        results
            .iter()
            .map(|r| {
                let mut dict = Dict::new();
                set_i64(&mut dict, "job_id", i64::from(r.job_id));
                dict.insert("error_code", Value::Int64(i64::from(!r.success)));
                set_opt_str(&mut dict, "message", r.message.as_deref());
                Value::Dict(dict)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_job_description_fields() {
        let mut dict = Dict::new();
        dict.insert("name", Value::String("test".into()));
        dict.insert("partition", Value::String("debug".into()));
        dict.insert("min_nodes", Value::Int64(2));
        let desc = parse_job_description(&dict);
        assert_eq!(desc.name.as_deref(), Some("test"));
        assert_eq!(desc.partition.as_deref(), Some("debug"));
        assert_eq!(desc.min_nodes, Some(2));
    }

    #[test]
    fn dump_job_list_carries_last_update_and_backfill() {
        let v = dump_job_list(&[], 100, 200);
        let dict = v.as_dict().unwrap();
        assert_eq!(dict.get("last_update").unwrap().as_int64().unwrap(), 100);
        assert_eq!(dict.get("last_backfill").unwrap().as_int64().unwrap(), 200);
    }

    #[test]
    fn dump_kill_results_marks_failure_nonzero() {
        let results = vec![KillJobResult {
            job_id: 1,
            success: false,
            message: Some("ALREADY_DONE".to_string()),
        }];
        let v = dump_kill_results(&results);
        let list = v.as_list().unwrap();
        let entry = list[0].as_dict().unwrap();
        assert_ne!(entry.get("error_code").unwrap().as_int64().unwrap(), 0);
    }
}
