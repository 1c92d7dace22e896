//! `v0.0.39`: the one built-in [`slurmrest::DataParser`], transcoding
//! between the wire data tree and `slurmrest-backend`'s domain records
//! (spec §4.I).
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod common;
mod dbd;
mod job;
mod node;
mod partition;
mod reservation;

use std::any::Any;
use std::sync::Arc;

use slurmrest::{DataParser, ErrorKind, Envelope, ParserRegistry, TypeTag};
use slurmrest_backend::ctld::{JobRecord, KillJobResult, NodeRecord, PartitionRecord, ReservationRecord};
use slurmrest_backend::dbd::{Account, Association, Cluster, ConfigDump, Qos, TresType, User, Wckey};
use slurmrest_core::Value;

use common::dict_or_default;

/// This build's single `data_parser` version segment.
pub const VERSION: &str = "v0.0.39";

/// The `v0.0.39` [`DataParser`] implementation. Stateless: it holds no
/// per-connection attributes, so [`DataParser::assign`] is a no-op.
#[derive(Debug, Default)]
pub struct V0_0_39;

fn boxed<T: Send + 'static>(value: T) -> Box<dyn Any + Send> {
    Box::new(value)
}

fn unsupported_tag(envelope: &mut Envelope, source: &str, tag: TypeTag) -> i64 {
    envelope.resp_error(
        ErrorKind::DataExpectedDict,
        source,
        format!("v0.0.39 has no PARSE rule for {tag:?}"),
    )
}

impl DataParser for V0_0_39 {
    fn version(&self) -> &'static str {
        VERSION
    }

    fn parse(
        &self,
        tag: TypeTag,
        tree_node: &Value,
        _parent_path: &str,
        envelope: &mut Envelope,
        source: &str,
    ) -> Result<Box<dyn Any + Send>, i64> {
        let dict = dict_or_default(tree_node);
        match tag {
            TypeTag::JobDescMsg => Ok(boxed(job::parse_job_description(&dict))),
            TypeTag::KillJobsMsg => Ok(boxed(job::parse_kill_jobs_request(&dict))),
            TypeTag::UpdateNodeMsg => Ok(boxed(node::parse_node_update(&dict))),
            TypeTag::Account => Ok(boxed(dbd::parse_account(&dict))),
            TypeTag::Association => Ok(boxed(dbd::parse_association(&dict))),
            TypeTag::Qos => Ok(boxed(dbd::parse_qos(&dict))),
            TypeTag::User => Ok(boxed(dbd::parse_user(&dict))),
            TypeTag::Wckey => Ok(boxed(dbd::parse_wckey(&dict))),
            TypeTag::Tres => Ok(boxed(dbd::parse_tres_type(&dict))),
            TypeTag::Cluster => Ok(boxed(dbd::parse_cluster(&dict))),
            TypeTag::Config => Ok(boxed(dbd::parse_config(&dict))),
            other => Err(unsupported_tag(envelope, source, other)),
        }
    }

    fn dump(&self, tag: TypeTag, record: &dyn Any, tree_node: &mut Value) -> Result<(), ErrorKind> {
        let value = match tag {
            TypeTag::JobInfoMsg | TypeTag::JobStateResp => {
                let (jobs, last_update, last_backfill) = record
                    .downcast_ref::<(Vec<JobRecord>, i64, i64)>()
                    .ok_or(ErrorKind::DataExpectedDict)?;
                job::dump_job_list(jobs, *last_update, *last_backfill)
            }
            TypeTag::KillJobsMsg => {
                let results = record.downcast_ref::<Vec<KillJobResult>>().ok_or(ErrorKind::DataExpectedList)?;
                job::dump_kill_results(results)
            }
            TypeTag::NodesResp => {
                let nodes = record.downcast_ref::<Vec<NodeRecord>>().ok_or(ErrorKind::DataExpectedList)?;
                node::dump_node_list(nodes)
            }
            TypeTag::PartitionResp => {
                let partitions = record
                    .downcast_ref::<Vec<PartitionRecord>>()
                    .ok_or(ErrorKind::DataExpectedList)?;
                partition::dump_partition_list(partitions)
            }
            TypeTag::ReservationResp => {
                let reservations = record
                    .downcast_ref::<Vec<ReservationRecord>>()
                    .ok_or(ErrorKind::DataExpectedList)?;
                reservation::dump_reservation_list(reservations)
            }
            TypeTag::Account => {
                let account = record.downcast_ref::<Account>().ok_or(ErrorKind::DataExpectedDict)?;
                dbd::dump_account(account)
            }
            TypeTag::Association => {
                let association = record
                    .downcast_ref::<Association>()
                    .ok_or(ErrorKind::DataExpectedDict)?;
                dbd::dump_association(association)
            }
            TypeTag::Qos => {
                let qos = record.downcast_ref::<Qos>().ok_or(ErrorKind::DataExpectedDict)?;
                dbd::dump_qos(qos)
            }
            TypeTag::User => {
                let user = record.downcast_ref::<User>().ok_or(ErrorKind::DataExpectedDict)?;
                dbd::dump_user(user)
            }
            TypeTag::Wckey => {
                let wckey = record.downcast_ref::<Wckey>().ok_or(ErrorKind::DataExpectedDict)?;
                dbd::dump_wckey(wckey)
            }
            TypeTag::Tres => {
                let tres = record.downcast_ref::<TresType>().ok_or(ErrorKind::DataExpectedDict)?;
                dbd::dump_tres_type(tres)
            }
            TypeTag::Cluster => {
                let cluster = record.downcast_ref::<Cluster>().ok_or(ErrorKind::DataExpectedDict)?;
                dbd::dump_cluster(cluster)
            }
            TypeTag::Config => {
                let config = record.downcast_ref::<ConfigDump>().ok_or(ErrorKind::DataExpectedDict)?;
                dbd::dump_config(config)
            }
            _ => return Err(ErrorKind::DataExpectedDict),
        };
        *tree_node = value;
        Ok(())
    }

    fn assign(&mut self, _attribute: &str, _value: Box<dyn Any + Send>) {}

    fn specify(&self, _spec_tree: &mut Value) {}
}

/// Registers the `v0.0.39` parser into `registry`.
pub fn register(registry: &ParserRegistry) {
    registry.register(Arc::new(V0_0_39));
}

#[cfg(test)]
mod tests {
    use super::*;
    use slurmrest_backend::ctld::JobDescription;
    use slurmrest_core::Dict;

    #[test]
    fn parses_job_description_via_trait_object() {
        let parser = V0_0_39;
        let mut dict = Dict::new();
        dict.insert("name", Value::String("demo".into()));
        let mut envelope = Envelope::new();
        let record = parser
            .parse(TypeTag::JobDescMsg, &Value::Dict(dict), "/job", &mut envelope, "test")
            .unwrap();
        let desc = record.downcast_ref::<JobDescription>().unwrap();
        assert_eq!(desc.name.as_deref(), Some("demo"));
    }

    #[test]
    fn dumps_node_list_via_trait_object() {
        let parser = V0_0_39;
        let nodes = vec![NodeRecord {
            name: "node01".into(),
            state: "IDLE".into(),
            partitions: vec![],
        }];
        let mut tree = Value::Null;
        parser.dump(TypeTag::NodesResp, &nodes, &mut tree).unwrap();
        assert!(tree.as_dict().unwrap().contains_key("nodes"));
    }

    #[test]
    fn register_adds_version_to_registry() {
        let registry = ParserRegistry::new();
        register(&registry);
        assert!(registry.get(VERSION).is_some());
    }
}
