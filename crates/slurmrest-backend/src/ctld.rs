//! `slurmctld` RPC surface: jobs, nodes, partitions, reservations, and
//! the diag/ping/licenses/shares passthroughs (spec §4.I).

use async_trait::async_trait;

use crate::BackendError;

/// A job as returned by `load_jobs`/`load_job`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    /// The primary job id.
    pub job_id: u32,
    /// The heterogeneous-job leader id, if this job is a het component.
    pub het_job_id: Option<u32>,
    /// The array job id, if this job is an array task.
    pub array_job_id: Option<u32>,
    /// The array task id, if this job is an array task.
    pub array_task_id: Option<u32>,
    /// Job name.
    pub name: String,
    /// Submitting user's uid.
    pub user_id: u32,
    /// Current job state name (`"PENDING"`, `"RUNNING"`, …).
    pub job_state: String,
    /// Partition this job is assigned or was submitted to.
    pub partition: String,
}

/// `JOB_DESC_MSG` — a job submission or update description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDescription {
    /// Job name.
    pub name: Option<String>,
    /// Target partition.
    pub partition: Option<String>,
    /// The batch script, required on submit, optional on update.
    pub script: Option<String>,
    /// Minimum node count.
    pub min_nodes: Option<u32>,
    /// Requested user id (forced to `nobody` for `/job/allocate`).
    pub user_id: Option<u32>,
    /// Requested group id (forced to `nobody` for `/job/allocate`).
    pub group_id: Option<u32>,
}

/// One component of a heterogeneous submission, or the sole entry for a
/// non-het submission.
pub type HetJobComponents = Vec<JobDescription>;

/// A parsed composite job id: `jobid(+het)?(_array)?(\.step)?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositeJobId {
    /// The base job id.
    pub job_id: u32,
    /// The heterogeneous-job component id, if present.
    pub het_job_id: Option<u32>,
    /// The array task id, if present (a single job GET/POST/DELETE warns
    /// and ignores this rather than rejecting the request).
    pub array_task_id: Option<u32>,
    /// The step id, if present (ignored the same way as `array_task_id`).
    pub step_id: Option<u32>,
}

impl CompositeJobId {
    /// Parse the composite job id grammar from spec §6:
    /// `jobid(+het)?(_array)?(\.step)?`, each suffix optional and numeric.
    ///
    /// Returns `None` if `jobid` itself is missing or not a plain
    /// integer, or if a present suffix fails to parse as one.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (head, step_id) = match raw.split_once('.') {
            Some((head, step)) => (head, Some(step.parse().ok()?)),
            None => (raw, None),
        };
        let (head, array_task_id) = match head.split_once('_') {
            Some((head, array)) => (head, Some(array.parse().ok()?)),
            None => (head, None),
        };
        let (job_part, het_job_id) = match head.split_once('+') {
            Some((job, het)) => (job, Some(het.parse().ok()?)),
            None => (head, None),
        };
        let job_id = job_part.parse().ok()?;
        Some(Self {
            job_id,
            het_job_id,
            array_task_id,
            step_id,
        })
    }
}

/// `KILL_JOBS_MSG` — a bulk job-kill request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KillJobsRequest {
    /// The job ids to signal.
    pub job_ids: Vec<u32>,
    /// Signal number; defaults to `SIGKILL` (9) when unset.
    pub signal: Option<i32>,
    /// Kill flags; defaults to `FULL_JOB` when unset.
    pub flags: Option<u32>,
    /// Restrict to jobs owned by this user, resolved to uid before the
    /// RPC is issued.
    pub user_name: Option<String>,
}

/// Per-job result of a kill request.
#[derive(Debug, Clone, PartialEq)]
pub struct KillJobResult {
    /// The job id this result is for.
    pub job_id: u32,
    /// Whether the signal was delivered (or the job was already done,
    /// which callers treat as success with a warning).
    pub success: bool,
    /// A human-readable message, e.g. for the `ALREADY_DONE` case.
    pub message: Option<String>,
}

/// A compute node as returned by `load_node`/`load_node_single`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Node hostname.
    pub name: String,
    /// Current node state name.
    pub state: String,
    /// Partitions this node belongs to, populated by
    /// `populate_node_partitions`.
    pub partitions: Vec<String>,
}

/// `UPDATE_NODE_MSG` — a node update request. `node_names` is always
/// forced to the path's node name by the handler; any value parsed from
/// the body is discarded with a warning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    /// The node name(s) to update. Handlers overwrite this with the path
    /// parameter.
    pub node_names: String,
    /// New node state, if changing it.
    pub state: Option<String>,
    /// Free-form reason string for the state change.
    pub reason: Option<String>,
}

/// A partition as returned by `load_partitions`.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionRecord {
    /// Partition name.
    pub name: String,
    /// Nodes assigned to this partition.
    pub nodes: String,
}

/// A reservation as returned by `load_reservations`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationRecord {
    /// Reservation name.
    pub name: String,
    /// Nodes covered by this reservation.
    pub nodes: String,
}

/// The `slurmctld` RPC surface a request context holds a handle to.
///
/// Implementations are not required to be `Clone`; a fresh handle is
/// obtained per request (spec §5: "the backend connection object is not
/// shared between workers").
#[async_trait]
pub trait CtldBackend: Send + Sync {
    /// `load_jobs(update_time, flags)`. Returns
    /// [`BackendError::NoChangeInData`] when nothing changed since
    /// `update_time`.
    async fn load_jobs(&self, update_time: i64, flags: u32) -> Result<Vec<JobRecord>, BackendError>;

    /// `load_job(jobid|het)`.
    async fn load_job(&self, id: CompositeJobId) -> Result<JobRecord, BackendError>;

    /// `kill_jobs`.
    async fn kill_jobs(&self, request: KillJobsRequest) -> Result<Vec<KillJobResult>, BackendError>;

    /// `update_job`.
    async fn update_job(&self, id: CompositeJobId, desc: JobDescription) -> Result<(), BackendError>;

    /// Submit a new job (single or heterogeneous). Returns the assigned
    /// job id(s) in submission order.
    async fn submit_job(&self, components: HetJobComponents) -> Result<Vec<u32>, BackendError>;

    /// Allocate resources without a batch script.
    async fn allocate_job(&self, components: HetJobComponents) -> Result<Vec<u32>, BackendError>;

    /// `load_node`/`load_node_single`, followed internally by
    /// `load_partitions`/`populate_node_partitions`. `name` of `None`
    /// lists all nodes.
    async fn load_nodes(&self, name: Option<&str>, show_flags: u32) -> Result<Vec<NodeRecord>, BackendError>;

    /// Update a node; `update.node_names` is pre-forced to `name` by the
    /// caller.
    async fn update_node(&self, name: &str, update: NodeUpdate) -> Result<(), BackendError>;

    /// Remove a node from the configuration.
    async fn delete_node(&self, name: &str) -> Result<(), BackendError>;

    /// `load_partitions`; `name` of `None` lists all partitions.
    async fn load_partitions(&self, name: Option<&str>) -> Result<Vec<PartitionRecord>, BackendError>;

    /// List reservations; `name` of `None` lists all.
    async fn load_reservations(&self, name: Option<&str>) -> Result<Vec<ReservationRecord>, BackendError>;

    /// The diag passthrough.
    async fn diag(&self) -> Result<String, BackendError>;

    /// The ping passthrough.
    async fn ping(&self) -> Result<String, BackendError>;

    /// The licenses passthrough.
    async fn licenses(&self) -> Result<String, BackendError>;

    /// The shares passthrough.
    async fn shares(&self) -> Result<String, BackendError>;

    /// Trigger a controller reconfiguration.
    async fn reconfigure(&self) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_job_id() {
        let id = CompositeJobId::parse("42").unwrap();
        assert_eq!(id.job_id, 42);
        assert_eq!(id.het_job_id, None);
        assert_eq!(id.array_task_id, None);
        assert_eq!(id.step_id, None);
    }

    #[test]
    fn parses_all_optional_suffixes() {
        let id = CompositeJobId::parse("100+2_5.3").unwrap();
        assert_eq!(id.job_id, 100);
        assert_eq!(id.het_job_id, Some(2));
        assert_eq!(id.array_task_id, Some(5));
        assert_eq!(id.step_id, Some(3));
    }

    #[test]
    fn rejects_non_numeric_job_id() {
        assert!(CompositeJobId::parse("abc").is_none());
    }

    #[test]
    fn rejects_malformed_suffix() {
        assert!(CompositeJobId::parse("1+x").is_none());
    }
}
