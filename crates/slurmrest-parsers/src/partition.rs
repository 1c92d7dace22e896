//! Partition listing transcoding (read-only; PARTITION_INFO_MSG has no
//! PARSE side in this API — partitions are configured out of band).

use slurmrest_backend::ctld::PartitionRecord;
use slurmrest_core::{Dict, Value};

use crate::common::set_str;

pub(crate) fn dump_partition_record(partition: &PartitionRecord) -> Value {
    let mut dict = Dict::new();
    set_str(&mut dict, "name", &partition.name);
    set_str(&mut dict, "nodes", &partition.nodes);
    Value::Dict(dict)
}

pub(crate) fn dump_partition_list(partitions: &[PartitionRecord]) -> Value {
    let mut dict = Dict::new();
    dict.insert(
        "partitions",
        Value::List(partitions.iter().map(dump_partition_record).collect()),
    );
    Value::Dict(dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dumps_partition_list_wrapper() {
        let partitions = vec![PartitionRecord {
            name: "debug".into(),
            nodes: "node[01-04]".into(),
        }];
        let v = dump_partition_list(&partitions);
        let dict = v.as_dict().unwrap();
        let list = dict.get("partitions").unwrap().as_list().unwrap();
        assert_eq!(list.len(), 1);
    }
}
