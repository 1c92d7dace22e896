//! Reservation listing transcoding (read-only).

use slurmrest_backend::ctld::ReservationRecord;
use slurmrest_core::{Dict, Value};

use crate::common::set_str;

pub(crate) fn dump_reservation_record(reservation: &ReservationRecord) -> Value {
    let mut dict = Dict::new();
    set_str(&mut dict, "name", &reservation.name);
    set_str(&mut dict, "node_list", &reservation.nodes);
    Value::Dict(dict)
}

pub(crate) fn dump_reservation_list(reservations: &[ReservationRecord]) -> Value {
    let mut dict = Dict::new();
    dict.insert(
        "reservations",
        Value::List(reservations.iter().map(dump_reservation_record).collect()),
    );
    Value::Dict(dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dumps_reservation_list_wrapper() {
        let reservations = vec![ReservationRecord {
            name: "maint".into(),
            nodes: "node01".into(),
        }];
        let v = dump_reservation_list(&reservations);
        let dict = v.as_dict().unwrap();
        let list = dict.get("reservations").unwrap().as_list().unwrap();
        assert_eq!(list.len(), 1);
    }
}
