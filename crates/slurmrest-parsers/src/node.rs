//! `UPDATE_NODE_MSG` / node listing transcoding.

use slurmrest_backend::ctld::{NodeRecord, NodeUpdate};
use slurmrest_core::{Dict, Value};

use crate::common::{get_str, set_str, set_str_list};

/// Parses the body fields of `UPDATE_NODE_MSG`. `node_names` is left
/// populated from the body if present only so the caller can compare it
/// against the path segment and warn; the handler always overwrites it
/// with the path's node name before issuing the RPC.
pub(crate) fn parse_node_update(dict: &Dict) -> NodeUpdate {
    if let Some(names) = get_str(dict, "node_names") {
        tracing::warn!(body_node_names = %names, "ignoring node_names in request body, using path segment");
    }
    NodeUpdate {
        node_names: get_str(dict, "node_names").unwrap_or_default(),
        state: get_str(dict, "state"),
        reason: get_str(dict, "reason"),
    }
}

pub(crate) fn dump_node_record(node: &NodeRecord) -> Value {
    let mut dict = Dict::new();
    set_str(&mut dict, "name", &node.name);
    set_str(&mut dict, "state", &node.state);
    set_str_list(&mut dict, "partitions", &node.partitions);
    Value::Dict(dict)
}

pub(crate) fn dump_node_list(nodes: &[NodeRecord]) -> Value {
    let mut dict = Dict::new();
    dict.insert("nodes", Value::List(nodes.iter().map(dump_node_record).collect()));
    Value::Dict(dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dumps_node_with_partitions() {
        let node = NodeRecord {
            name: "node01".into(),
            state: "IDLE".into(),
            partitions: vec!["debug".into()],
        };
        let v = dump_node_record(&node);
        let dict = v.as_dict().unwrap();
        assert_eq!(dict.get("name").unwrap().as_str().unwrap(), "node01");
        assert_eq!(dict.get("partitions").unwrap().as_list().unwrap().len(), 1);
    }
}
