//! An in-memory backend for tests and local development. No real
//! `slurmctld`/`slurmdbd` connection is made; state lives in memory for
//! the lifetime of the process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ctld::{
    CompositeJobId, CtldBackend, HetJobComponents, JobDescription, JobRecord, KillJobResult,
    KillJobsRequest, NodeRecord, NodeUpdate, PartitionRecord, ReservationRecord,
};
use crate::dbd::{
    Account, Association, AssociationDiff, Cluster, ConfigDump, DbdBackend, Qos, TresType, User,
    Wckey,
};
use crate::BackendError;

#[derive(Default)]
struct State {
    jobs: HashMap<u32, JobRecord>,
    last_update: i64,
    next_job_id: u32,
    nodes: HashMap<String, NodeRecord>,
    partitions: HashMap<String, PartitionRecord>,
    reservations: HashMap<String, ReservationRecord>,
    accounts: HashMap<String, Account>,
    associations: HashMap<u32, Association>,
    next_assoc_id: u32,
    qos: HashMap<u32, Qos>,
    next_qos_id: u32,
    users: HashMap<String, User>,
    wckeys: HashMap<String, Wckey>,
    tres: Vec<TresType>,
    clusters: HashMap<String, Cluster>,
}

/// An in-memory stand-in for both [`CtldBackend`] and [`DbdBackend`].
///
/// Guarded by a single [`tokio::sync::Mutex`] rather than per-collection
/// locks: this mock favors simplicity over the fine-grained concurrency a
/// real backend connection would have, since spec §5 states the backend
/// connection object is never shared between concurrent workers anyway.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<State>,
}

impl MockBackend {
    /// An empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CtldBackend for MockBackend {
    async fn load_jobs(&self, update_time: i64, _flags: u32) -> Result<Vec<JobRecord>, BackendError> {
        let state = self.state.lock().await;
        if update_time != 0 && update_time >= state.last_update {
            return Err(BackendError::NoChangeInData);
        }
        Ok(state.jobs.values().cloned().collect())
    }

    async fn load_job(&self, id: CompositeJobId) -> Result<JobRecord, BackendError> {
        let state = self.state.lock().await;
        state
            .jobs
            .get(&id.job_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("job {}", id.job_id)))
    }

    async fn kill_jobs(&self, request: KillJobsRequest) -> Result<Vec<KillJobResult>, BackendError> {
        let mut state = self.state.lock().await;
        let mut results = Vec::with_capacity(request.job_ids.len());
        for job_id in request.job_ids {
            let outcome = if let Some(job) = state.jobs.get_mut(&job_id) {
                job.job_state = "CANCELLED".to_string();
                KillJobResult {
                    job_id,
                    success: true,
                    message: None,
                }
            } else {
                KillJobResult {
                    job_id,
                    success: false,
                    message: Some("ALREADY_DONE".to_string()),
                }
            };
            results.push(outcome);
        }
        Ok(results)
    }

    async fn update_job(&self, id: CompositeJobId, desc: JobDescription) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .get_mut(&id.job_id)
            .ok_or_else(|| BackendError::NotFound(format!("job {}", id.job_id)))?;
        if let Some(name) = desc.name {
            job.name = name;
        }
        if let Some(partition) = desc.partition {
            job.partition = partition;
        }
        Ok(())
    }

    async fn submit_job(&self, components: HetJobComponents) -> Result<Vec<u32>, BackendError> {
        let mut state = self.state.lock().await;
        let mut ids = Vec::with_capacity(components.len());
        for desc in components {
            state.next_job_id += 1;
            let job_id = state.next_job_id;
            state.jobs.insert(
                job_id,
                JobRecord {
                    job_id,
                    het_job_id: None,
                    array_job_id: None,
                    array_task_id: None,
                    name: desc.name.unwrap_or_default(),
                    user_id: desc.user_id.unwrap_or(0),
                    job_state: "PENDING".to_string(),
                    partition: desc.partition.unwrap_or_default(),
                },
            );
            ids.push(job_id);
        }
        state.last_update += 1;
        Ok(ids)
    }

    async fn allocate_job(&self, components: HetJobComponents) -> Result<Vec<u32>, BackendError> {
        self.submit_job(components).await
    }

    async fn load_nodes(&self, name: Option<&str>, _show_flags: u32) -> Result<Vec<NodeRecord>, BackendError> {
        let state = self.state.lock().await;
        match name {
            Some(n) => state
                .nodes
                .get(n)
                .cloned()
                .map(|node| vec![node])
                .ok_or_else(|| BackendError::NotFound(format!("node {n}"))),
            None => Ok(state.nodes.values().cloned().collect()),
        }
    }

    async fn update_node(&self, name: &str, update: NodeUpdate) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        let node = state
            .nodes
            .get_mut(name)
            .ok_or_else(|| BackendError::NotFound(format!("node {name}")))?;
        if let Some(new_state) = update.state {
            node.state = new_state;
        }
        Ok(())
    }

    async fn delete_node(&self, name: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state
            .nodes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("node {name}")))
    }

    async fn load_partitions(&self, name: Option<&str>) -> Result<Vec<PartitionRecord>, BackendError> {
        let state = self.state.lock().await;
        match name {
            Some(n) => {
                let lower = n.to_ascii_lowercase();
                let matches: Vec<PartitionRecord> = state
                    .partitions
                    .values()
                    .filter(|p| p.name.to_ascii_lowercase() == lower)
                    .cloned()
                    .collect();
                if matches.is_empty() {
                    return Err(BackendError::NotFound(format!("partition {n}")));
                }
                Ok(matches)
            }
            None => Ok(state.partitions.values().cloned().collect()),
        }
    }

    async fn load_reservations(&self, name: Option<&str>) -> Result<Vec<ReservationRecord>, BackendError> {
        let state = self.state.lock().await;
        match name {
            Some(n) => {
                let lower = n.to_ascii_lowercase();
                let matches: Vec<ReservationRecord> = state
                    .reservations
                    .values()
                    .filter(|r| r.name.to_ascii_lowercase() == lower)
                    .cloned()
                    .collect();
                if matches.is_empty() {
                    return Err(BackendError::NotFound(format!("reservation {n}")));
                }
                Ok(matches)
            }
            None => Ok(state.reservations.values().cloned().collect()),
        }
    }

    async fn diag(&self) -> Result<String, BackendError> {
        Ok("ok".to_string())
    }

    async fn ping(&self) -> Result<String, BackendError> {
        Ok("UP".to_string())
    }

    async fn licenses(&self) -> Result<String, BackendError> {
        Ok(String::new())
    }

    async fn shares(&self) -> Result<String, BackendError> {
        Ok(String::new())
    }

    async fn reconfigure(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[async_trait]
impl DbdBackend for MockBackend {
    async fn accounts_get(&self, name: Option<&str>) -> Result<Vec<Account>, BackendError> {
        let state = self.state.lock().await;
        match name {
            Some(n) => state
                .accounts
                .get(n)
                .cloned()
                .map(|a| vec![a])
                .ok_or_else(|| BackendError::NotFound(format!("account {n}"))),
            None => Ok(state.accounts.values().cloned().collect()),
        }
    }

    async fn accounts_add(&self, account: Account) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.accounts.insert(account.name.clone(), account);
        Ok(())
    }

    async fn accounts_modify(&self, name: &str, account: Account) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(name) {
            return Err(BackendError::NotFound(format!("account {name}")));
        }
        state.accounts.insert(name.to_string(), account);
        Ok(())
    }

    async fn accounts_remove(&self, name: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state
            .accounts
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("account {name}")))
    }

    async fn coord_add(&self, account: &str, user: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        let acct = state
            .accounts
            .get_mut(account)
            .ok_or_else(|| BackendError::NotFound(format!("account {account}")))?;
        if !acct.coordinators.iter().any(|c| c == user) {
            acct.coordinators.push(user.to_string());
        }
        Ok(())
    }

    async fn coord_remove(&self, account: &str, user: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        let acct = state
            .accounts
            .get_mut(account)
            .ok_or_else(|| BackendError::NotFound(format!("account {account}")))?;
        acct.coordinators.retain(|c| c != user);
        Ok(())
    }

    async fn associations_get(&self, cond: &str) -> Result<Vec<Association>, BackendError> {
        let state = self.state.lock().await;
        if cond.is_empty() {
            return Ok(state.associations.values().cloned().collect());
        }
        Ok(state
            .associations
            .values()
            .filter(|a| a.account == cond || a.cluster == cond)
            .cloned()
            .collect())
    }

    async fn associations_modify(&self, diff: AssociationDiff) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        let assoc = state
            .associations
            .get_mut(&diff.id)
            .ok_or_else(|| BackendError::NotFound(format!("association {}", diff.id)))?;
        for (key, delta) in diff.tres_delta {
            if delta < 0 {
                assoc.tres.remove(&key);
            } else {
                assoc.tres.insert(key, delta);
            }
        }
        Ok(())
    }

    async fn associations_remove(&self, cond: &str) -> Result<Vec<Association>, BackendError> {
        let mut state = self.state.lock().await;
        let matching_ids: Vec<u32> = state
            .associations
            .values()
            .filter(|a| a.account == cond || a.cluster == cond)
            .filter_map(|a| a.id)
            .collect();
        let removed = matching_ids
            .iter()
            .filter_map(|id| state.associations.remove(id))
            .collect();
        Ok(removed)
    }

    async fn qos_get(&self, id: Option<u32>, name: Option<&str>) -> Result<Option<Qos>, BackendError> {
        let state = self.state.lock().await;
        if let Some(id) = id {
            return Ok(state.qos.get(&id).cloned());
        }
        if let Some(name) = name {
            return Ok(state.qos.values().find(|q| q.name == name).cloned());
        }
        Ok(None)
    }

    async fn qos_add(&self, mut qos: Qos) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.next_qos_id += 1;
        qos.id = Some(state.next_qos_id);
        state.qos.insert(state.next_qos_id, qos);
        Ok(())
    }

    async fn qos_modify(&self, id: u32, qos: Qos) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        if !state.qos.contains_key(&id) {
            return Err(BackendError::NotFound(format!("qos {id}")));
        }
        state.qos.insert(id, qos);
        Ok(())
    }

    async fn users_get(&self, name: Option<&str>) -> Result<Vec<User>, BackendError> {
        let state = self.state.lock().await;
        match name {
            Some(n) => state
                .users
                .get(n)
                .cloned()
                .map(|u| vec![u])
                .ok_or_else(|| BackendError::NotFound(format!("user {n}"))),
            None => Ok(state.users.values().cloned().collect()),
        }
    }

    async fn users_add(&self, user: User) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.users.insert(user.name.clone(), user);
        Ok(())
    }

    async fn users_modify(&self, name: &str, user: User) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        if let Some(old_name) = &user.old_name {
            if old_name == name {
                if !state.users.contains_key(name) {
                    return Err(BackendError::NotFound(format!("user {name}")));
                }
                if state.users.contains_key(&user.name) {
                    return Err(BackendError::RpcFailed {
                        rpc: "users_modify".to_string(),
                        code: 1,
                        message: format!("destination user {} already exists", user.name),
                    });
                }
                state.users.remove(name);
                let new_name = user.name.clone();
                state.users.insert(new_name, user);
                return Ok(());
            }
        }
        if !state.users.contains_key(name) {
            return Err(BackendError::NotFound(format!("user {name}")));
        }
        state.users.insert(name.to_string(), user);
        Ok(())
    }

    async fn wckeys_get(&self, name: Option<&str>) -> Result<Vec<Wckey>, BackendError> {
        let state = self.state.lock().await;
        match name {
            Some(n) => state
                .wckeys
                .get(n)
                .cloned()
                .map(|w| vec![w])
                .ok_or_else(|| BackendError::NotFound(format!("wckey {n}"))),
            None => Ok(state.wckeys.values().cloned().collect()),
        }
    }

    async fn wckeys_add(&self, wckey: Wckey) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.wckeys.insert(wckey.name.clone(), wckey);
        Ok(())
    }

    async fn wckeys_remove(&self, name: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state
            .wckeys
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("wckey {name}")))
    }

    async fn tres_get(&self) -> Result<Vec<TresType>, BackendError> {
        let state = self.state.lock().await;
        Ok(state.tres.clone())
    }

    async fn tres_add(&self, tres: TresType) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.tres.push(tres);
        Ok(())
    }

    async fn clusters_get(&self, name: Option<&str>) -> Result<Vec<Cluster>, BackendError> {
        let state = self.state.lock().await;
        match name {
            Some(n) => state
                .clusters
                .get(n)
                .cloned()
                .map(|c| vec![c])
                .ok_or_else(|| BackendError::NotFound(format!("cluster {n}"))),
            None => Ok(state.clusters.values().cloned().collect()),
        }
    }

    async fn clusters_add(&self, cluster: Cluster) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.clusters.insert(cluster.name.clone(), cluster);
        Ok(())
    }

    async fn clusters_modify(&self, name: &str, cluster: Cluster) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        if !state.clusters.contains_key(name) {
            return Err(BackendError::NotFound(format!("cluster {name}")));
        }
        state.clusters.insert(name.to_string(), cluster);
        Ok(())
    }

    async fn clusters_remove(&self, name: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state
            .clusters
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("cluster {name}")))
    }

    async fn config_dump(&self) -> Result<ConfigDump, BackendError> {
        let state = self.state.lock().await;
        Ok(ConfigDump {
            clusters: state.clusters.values().cloned().collect(),
            tres: state.tres.clone(),
            accounts: state.accounts.values().cloned().collect(),
            users: state.users.values().cloned().collect(),
            qos: state.qos.values().cloned().collect(),
            wckeys: state.wckeys.values().cloned().collect(),
            associations: state.associations.values().cloned().collect(),
        })
    }

    async fn commit(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_then_load_job_round_trips() {
        let backend = MockBackend::new();
        let ids = backend
            .submit_job(vec![JobDescription {
                name: Some("test".to_string()),
                partition: Some("debug".to_string()),
                script: Some("#!/bin/sh\necho hi\n".to_string()),
                ..Default::default()
            }])
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
        let job = backend
            .load_job(CompositeJobId {
                job_id: ids[0],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(job.name, "test");
        assert_eq!(job.job_state, "PENDING");
    }

    #[tokio::test]
    async fn load_jobs_reports_no_change_when_up_to_date() {
        let backend = MockBackend::new();
        backend.submit_job(vec![JobDescription::default()]).await.unwrap();
        let err = backend.load_jobs(i64::MAX, 0).await.unwrap_err();
        assert_eq!(err, BackendError::NoChangeInData);
    }

    #[tokio::test]
    async fn kill_jobs_reports_already_done_for_unknown_job() {
        let backend = MockBackend::new();
        let results = backend
            .kill_jobs(KillJobsRequest {
                job_ids: vec![999],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
    }

    #[tokio::test]
    async fn user_rename_fails_when_destination_exists() {
        let backend = MockBackend::new();
        backend
            .users_add(User {
                name: "alice".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        backend
            .users_add(User {
                name: "bob".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let result = backend
            .users_modify(
                "alice",
                User {
                    name: "bob".to_string(),
                    old_name: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());
    }
}
