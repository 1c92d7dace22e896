//! Maps each endpoint in the catalogue (spec §6) to a stable [`Operation`]
//! via the core [`slurmrest::Router`], so the generic tag-based dispatch
//! spec §4.G describes drives a concrete handler function rather than a
//! second, parallel routing table.

use std::collections::HashMap;

use slurmrest::{split_request_path, Method, Router};
use slurmrest_core::Dict;

/// One entry per handler this build exposes. Grouped by entity, in
/// catalogue order (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /slurm/{data_parser}/jobs/`
    JobsList,
    /// `DELETE /slurm/{data_parser}/jobs/`
    JobsKill,
    /// `GET /slurm/{data_parser}/jobs/state/`
    JobsState,
    /// `GET /slurm/{data_parser}/job/{job_id}`
    JobGet,
    /// `POST /slurm/{data_parser}/job/{job_id}`
    JobUpdate,
    /// `DELETE /slurm/{data_parser}/job/{job_id}`
    JobDelete,
    /// `POST /slurm/{data_parser}/job/submit`
    JobSubmit,
    /// `POST /slurm/{data_parser}/job/allocate`
    JobAllocate,
    /// `GET /slurm/{data_parser}/nodes/`
    NodesList,
    /// `GET /slurm/{data_parser}/node/{node_name}`
    NodeGet,
    /// `POST /slurm/{data_parser}/node/{node_name}`
    NodeUpdate,
    /// `DELETE /slurm/{data_parser}/node/{node_name}`
    NodeDelete,
    /// `GET /slurm/{data_parser}/partitions/`
    PartitionsList,
    /// `GET /slurm/{data_parser}/partition/{name}`
    PartitionGet,
    /// `GET /slurm/{data_parser}/reservations/`
    ReservationsList,
    /// `GET /slurm/{data_parser}/reservation/{name}`
    ReservationGet,
    /// `GET /slurm/{data_parser}/ping/`
    Ping,
    /// `GET /slurm/{data_parser}/diag/`
    Diag,
    /// `GET /slurm/{data_parser}/licenses/`
    Licenses,
    /// `GET /slurm/{data_parser}/shares`
    Shares,
    /// `GET /slurm/{data_parser}/reconfigure/`
    Reconfigure,
    /// `GET /slurmdb/{data_parser}/accounts/`
    AccountsList,
    /// `POST /slurmdb/{data_parser}/accounts/`
    AccountAdd,
    /// `GET /slurmdb/{data_parser}/account/{name}`
    AccountGet,
    /// `POST /slurmdb/{data_parser}/account/{name}`
    AccountModify,
    /// `DELETE /slurmdb/{data_parser}/account/{name}`
    AccountDelete,
    /// `GET /slurmdb/{data_parser}/associations/`
    AssociationsList,
    /// `POST /slurmdb/{data_parser}/associations/`
    AssociationsModify,
    /// `DELETE /slurmdb/{data_parser}/associations/`
    AssociationsDelete,
    /// `GET /slurmdb/{data_parser}/qos/`
    QosList,
    /// `POST /slurmdb/{data_parser}/qos/`
    QosUpsert,
    /// `GET /slurmdb/{data_parser}/qos/{id}`
    QosGet,
    /// `GET /slurmdb/{data_parser}/users/`
    UsersList,
    /// `POST /slurmdb/{data_parser}/users/`
    UserAdd,
    /// `GET /slurmdb/{data_parser}/user/{name}`
    UserGet,
    /// `POST /slurmdb/{data_parser}/user/{name}`
    UserModify,
    /// `GET /slurmdb/{data_parser}/wckeys/`
    WckeysList,
    /// `POST /slurmdb/{data_parser}/wckeys/`
    WckeyAdd,
    /// `DELETE /slurmdb/{data_parser}/wckey/{name}`
    WckeyDelete,
    /// `GET /slurmdb/{data_parser}/tres/`
    TresList,
    /// `POST /slurmdb/{data_parser}/tres/`
    TresAdd,
    /// `GET /slurmdb/{data_parser}/clusters/`
    ClustersList,
    /// `POST /slurmdb/{data_parser}/clusters/`
    ClusterAdd,
    /// `GET /slurmdb/{data_parser}/cluster/{name}`
    ClusterGet,
    /// `POST /slurmdb/{data_parser}/cluster/{name}`
    ClusterModify,
    /// `DELETE /slurmdb/{data_parser}/cluster/{name}`
    ClusterDelete,
    /// `GET /slurmdb/{data_parser}/diag/`
    DbdDiag,
    /// `GET /slurmdb/{data_parser}/ping/`
    DbdPing,
    /// `GET /slurmdb/{data_parser}/config/`
    ConfigGet,
    /// `POST /slurmdb/{data_parser}/config/`
    ConfigReplay,
}

/// Outcome of resolving a `(method, path)` pair against [`Routes`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The path and method matched a registered operation.
    Matched(Operation, Dict),
    /// The path matches a pattern registered under a different method.
    MethodMismatch,
    /// Nothing in the table matches the path at all.
    NotFound,
}

/// The complete path table, resolving `(method, path)` to an
/// [`Operation`] plus the path captures (including `data_parser`).
pub struct Routes {
    router: Router,
    dispatch: HashMap<u32, Operation>,
}

impl Routes {
    /// Build the table described by spec §6's endpoint catalogue.
    #[must_use]
    pub fn build() -> Self {
        let router = Router::new();
        let mut dispatch = HashMap::new();
        let mut reg = |method: Method, pattern: &str, op: Operation| {
            let tag = router.register(method, pattern);
            dispatch.insert(tag, op);
        };

        reg(Method::Get, "/slurm/{data_parser}/jobs/", Operation::JobsList);
        reg(Method::Delete, "/slurm/{data_parser}/jobs/", Operation::JobsKill);
        reg(Method::Get, "/slurm/{data_parser}/jobs/state/", Operation::JobsState);
        reg(Method::Get, "/slurm/{data_parser}/job/{job_id}", Operation::JobGet);
        reg(Method::Post, "/slurm/{data_parser}/job/{job_id}", Operation::JobUpdate);
        reg(Method::Patch, "/slurm/{data_parser}/job/{job_id}", Operation::JobUpdate);
        reg(Method::Delete, "/slurm/{data_parser}/job/{job_id}", Operation::JobDelete);
        reg(Method::Post, "/slurm/{data_parser}/job/submit", Operation::JobSubmit);
        reg(Method::Post, "/slurm/{data_parser}/job/allocate", Operation::JobAllocate);

        reg(Method::Get, "/slurm/{data_parser}/nodes/", Operation::NodesList);
        reg(Method::Get, "/slurm/{data_parser}/node/{node_name}", Operation::NodeGet);
        reg(Method::Post, "/slurm/{data_parser}/node/{node_name}", Operation::NodeUpdate);
        reg(Method::Patch, "/slurm/{data_parser}/node/{node_name}", Operation::NodeUpdate);
        reg(Method::Delete, "/slurm/{data_parser}/node/{node_name}", Operation::NodeDelete);

        reg(Method::Get, "/slurm/{data_parser}/partitions/", Operation::PartitionsList);
        reg(Method::Get, "/slurm/{data_parser}/partition/{name}", Operation::PartitionGet);
        reg(Method::Get, "/slurm/{data_parser}/reservations/", Operation::ReservationsList);
        reg(Method::Get, "/slurm/{data_parser}/reservation/{name}", Operation::ReservationGet);

        reg(Method::Get, "/slurm/{data_parser}/ping/", Operation::Ping);
        reg(Method::Get, "/slurm/{data_parser}/diag/", Operation::Diag);
        reg(Method::Get, "/slurm/{data_parser}/licenses/", Operation::Licenses);
        reg(Method::Get, "/slurm/{data_parser}/shares", Operation::Shares);
        reg(Method::Get, "/slurm/{data_parser}/reconfigure/", Operation::Reconfigure);

        reg(Method::Get, "/slurmdb/{data_parser}/accounts/", Operation::AccountsList);
        reg(Method::Post, "/slurmdb/{data_parser}/accounts/", Operation::AccountAdd);
        reg(Method::Get, "/slurmdb/{data_parser}/account/{name}", Operation::AccountGet);
        reg(Method::Post, "/slurmdb/{data_parser}/account/{name}", Operation::AccountModify);
        reg(Method::Patch, "/slurmdb/{data_parser}/account/{name}", Operation::AccountModify);
        reg(Method::Delete, "/slurmdb/{data_parser}/account/{name}", Operation::AccountDelete);

        reg(Method::Get, "/slurmdb/{data_parser}/associations/", Operation::AssociationsList);
        reg(Method::Post, "/slurmdb/{data_parser}/associations/", Operation::AssociationsModify);
        reg(Method::Patch, "/slurmdb/{data_parser}/associations/", Operation::AssociationsModify);
        reg(Method::Delete, "/slurmdb/{data_parser}/associations/", Operation::AssociationsDelete);

        reg(Method::Get, "/slurmdb/{data_parser}/qos/", Operation::QosList);
        reg(Method::Post, "/slurmdb/{data_parser}/qos/", Operation::QosUpsert);
        reg(Method::Patch, "/slurmdb/{data_parser}/qos/", Operation::QosUpsert);
        reg(Method::Get, "/slurmdb/{data_parser}/qos/{id}", Operation::QosGet);

        reg(Method::Get, "/slurmdb/{data_parser}/users/", Operation::UsersList);
        reg(Method::Post, "/slurmdb/{data_parser}/users/", Operation::UserAdd);
        reg(Method::Get, "/slurmdb/{data_parser}/user/{name}", Operation::UserGet);
        reg(Method::Post, "/slurmdb/{data_parser}/user/{name}", Operation::UserModify);
        reg(Method::Patch, "/slurmdb/{data_parser}/user/{name}", Operation::UserModify);

        reg(Method::Get, "/slurmdb/{data_parser}/wckeys/", Operation::WckeysList);
        reg(Method::Post, "/slurmdb/{data_parser}/wckeys/", Operation::WckeyAdd);
        reg(Method::Delete, "/slurmdb/{data_parser}/wckey/{name}", Operation::WckeyDelete);

        reg(Method::Get, "/slurmdb/{data_parser}/tres/", Operation::TresList);
        reg(Method::Post, "/slurmdb/{data_parser}/tres/", Operation::TresAdd);

        reg(Method::Get, "/slurmdb/{data_parser}/clusters/", Operation::ClustersList);
        reg(Method::Post, "/slurmdb/{data_parser}/clusters/", Operation::ClusterAdd);
        reg(Method::Get, "/slurmdb/{data_parser}/cluster/{name}", Operation::ClusterGet);
        reg(Method::Post, "/slurmdb/{data_parser}/cluster/{name}", Operation::ClusterModify);
        reg(Method::Patch, "/slurmdb/{data_parser}/cluster/{name}", Operation::ClusterModify);
        reg(Method::Delete, "/slurmdb/{data_parser}/cluster/{name}", Operation::ClusterDelete);

        reg(Method::Get, "/slurmdb/{data_parser}/diag/", Operation::DbdDiag);
        reg(Method::Get, "/slurmdb/{data_parser}/ping/", Operation::DbdPing);

        reg(Method::Get, "/slurmdb/{data_parser}/config/", Operation::ConfigGet);
        reg(Method::Post, "/slurmdb/{data_parser}/config/", Operation::ConfigReplay);

        Self { router, dispatch }
    }

    /// Resolve a request to its `Operation` and path captures. Returns
    /// [`Resolution::MethodMismatch`] when the path matches a pattern
    /// registered under a different method, and [`Resolution::NotFound`]
    /// only when the path matches nothing at all, per spec §4.G.
    #[must_use]
    pub fn resolve(&self, method: Method, path: &str) -> Resolution {
        let segments = split_request_path(path);
        let (tag, captures) = self.router.find(method, &segments);
        if tag != slurmrest::UNREGISTERED_TAG {
            return match self.dispatch.get(&tag).copied() {
                Some(op) => Resolution::Matched(op, captures),
                None => Resolution::NotFound,
            };
        }
        if self.router.matches_other_method(method, &segments) {
            Resolution::MethodMismatch
        } else {
            Resolution::NotFound
        }
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self::build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_job_get_and_captures_ids() {
        let routes = Routes::build();
        let Resolution::Matched(op, captures) = routes.resolve(Method::Get, "/slurm/v0.0.39/job/1234") else {
            panic!("route should match");
        };
        assert_eq!(op, Operation::JobGet);
        assert_eq!(captures.get("data_parser").unwrap().as_str().unwrap(), "v0.0.39");
        assert_eq!(captures.get("job_id").unwrap().as_str().unwrap(), "1234");
    }

    #[test]
    fn unregistered_path_resolves_to_not_found() {
        let routes = Routes::build();
        assert_eq!(routes.resolve(Method::Get, "/slurm/v0.0.39/nonexistent"), Resolution::NotFound);
    }

    #[test]
    fn distinguishes_list_from_single_job_by_method() {
        let routes = Routes::build();
        let Resolution::Matched(op, _) = routes.resolve(Method::Delete, "/slurm/v0.0.39/jobs/") else {
            panic!("route should match");
        };
        assert_eq!(op, Operation::JobsKill);
    }

    #[test]
    fn method_mismatch_is_distinct_from_not_found() {
        let routes = Routes::build();
        assert_eq!(
            routes.resolve(Method::Patch, "/slurm/v0.0.39/jobs/"),
            Resolution::MethodMismatch
        );
        assert_eq!(
            routes.resolve(Method::Patch, "/slurm/v0.0.39/nonexistent"),
            Resolution::NotFound
        );
    }

    #[test]
    fn patch_aliases_post_for_job_update() {
        let routes = Routes::build();
        let Resolution::Matched(op, _) = routes.resolve(Method::Patch, "/slurm/v0.0.39/job/1234") else {
            panic!("route should match");
        };
        assert_eq!(op, Operation::JobUpdate);
    }
}
