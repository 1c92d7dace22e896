//! `slurmdbd` entity transcoding: accounts, associations, QOS, users,
//! wckeys, TRES, clusters, and the config dump envelope (spec §4.I).

use slurmrest_backend::dbd::{
    Account, Association, Cluster, ConfigDump, Qos, TresString, TresType, User, Wckey,
};
use slurmrest_core::{Dict, Value};

use crate::common::{get_str, get_str_list, get_u32, set_i64, set_opt_str, set_str, set_str_list};

/// The wire sentinel for "clear this previously non-empty list" (spec
/// §4.I), distinguished from an absent field meaning "no change".
const CLEAR_SENTINEL: [&str; 1] = [""];

fn parse_tres_string(dict: &Dict, key: &str) -> TresString {
    let mut tres = TresString::new();
    if let Some(Value::Dict(entries)) = dict.get(key) {
        for (name, value) in entries.iter() {
            if let Ok(count) = value.as_int64() {
                tres.insert(name.to_string(), count);
            }
        }
    }
    tres
}

fn dump_tres_string(tres: &TresString) -> Value {
    let mut dict = Dict::new();
    for (name, count) in tres {
        set_i64(&mut dict, name, *count);
    }
    Value::Dict(dict)
}

pub(crate) fn parse_account(dict: &Dict) -> Account {
    Account {
        name: get_str(dict, "name").unwrap_or_default(),
        description: get_str(dict, "description"),
        organization: get_str(dict, "organization"),
        coordinators: get_str_list(dict, "coordinators"),
    }
}

pub(crate) fn dump_account(account: &Account) -> Value {
    let mut dict = Dict::new();
    set_str(&mut dict, "name", &account.name);
    set_opt_str(&mut dict, "description", account.description.as_deref());
    set_opt_str(&mut dict, "organization", account.organization.as_deref());
    set_str_list(&mut dict, "coordinators", &account.coordinators);
    Value::Dict(dict)
}

pub(crate) fn parse_association(dict: &Dict) -> Association {
    Association {
        id: get_u32(dict, "id"),
        account: get_str(dict, "account").unwrap_or_default(),
        user: get_str(dict, "user"),
        cluster: get_str(dict, "cluster").unwrap_or_default(),
        tres: parse_tres_string(dict, "tres"),
    }
}

pub(crate) fn dump_association(association: &Association) -> Value {
    let mut dict = Dict::new();
    if let Some(id) = association.id {
        set_i64(&mut dict, "id", i64::from(id));
    }
    set_str(&mut dict, "account", &association.account);
    set_opt_str(&mut dict, "user", association.user.as_deref());
    set_str(&mut dict, "cluster", &association.cluster);
    dict.insert("tres", dump_tres_string(&association.tres));
    Value::Dict(dict)
}

/// Parses a QOS record, translating the `[""]` wire sentinel into an
/// empty (but present) `preempt` list and an absent `preempt` field into
/// an absent one (callers tell "clear" from "no change" by checking
/// whether the key was present on the dict at all; here we already
/// collapse that, so the handler must inspect `dict.get("preempt")`
/// itself when the distinction matters).
pub(crate) fn parse_qos(dict: &Dict) -> Qos {
    let preempt = get_str_list(dict, "preempt");
    let preempt = if preempt == CLEAR_SENTINEL { Vec::new() } else { preempt };
    Qos {
        id: get_u32(dict, "id"),
        name: get_str(dict, "name").unwrap_or_default(),
        preempt,
    }
}

pub(crate) fn dump_qos(qos: &Qos) -> Value {
    let mut dict = Dict::new();
    if let Some(id) = qos.id {
        set_i64(&mut dict, "id", i64::from(id));
    }
    set_str(&mut dict, "name", &qos.name);
    set_str_list(&mut dict, "preempt", &qos.preempt);
    Value::Dict(dict)
}

pub(crate) fn parse_user(dict: &Dict) -> User {
    User {
        name: get_str(dict, "name").unwrap_or_default(),
        old_name: get_str(dict, "old_name"),
        default_wckey: get_str(dict, "default_wckey"),
        wckey_list: get_str_list(dict, "wckeys"),
        assoc_list: Vec::new(),
        coord_accts: Vec::new(),
    }
}

pub(crate) fn dump_user(user: &User) -> Value {
    let mut dict = Dict::new();
    set_str(&mut dict, "name", &user.name);
    set_opt_str(&mut dict, "default_wckey", user.default_wckey.as_deref());
    set_str_list(&mut dict, "wckeys", &user.wckey_list);
    dict.insert(
        "associations",
        Value::List(user.assoc_list.iter().map(dump_association).collect()),
    );
    set_str_list(&mut dict, "coord_accts", &user.coord_accts);
    Value::Dict(dict)
}

pub(crate) fn parse_wckey(dict: &Dict) -> Wckey {
    Wckey {
        name: get_str(dict, "name").unwrap_or_default(),
        user: get_str(dict, "user").unwrap_or_default(),
        cluster: get_str(dict, "cluster").unwrap_or_default(),
    }
}

pub(crate) fn dump_wckey(wckey: &Wckey) -> Value {
    let mut dict = Dict::new();
    set_str(&mut dict, "name", &wckey.name);
    set_str(&mut dict, "user", &wckey.user);
    set_str(&mut dict, "cluster", &wckey.cluster);
    Value::Dict(dict)
}

pub(crate) fn parse_tres_type(dict: &Dict) -> TresType {
    TresType {
        kind: get_str(dict, "type").unwrap_or_default(),
        name: get_str(dict, "name"),
    }
}

pub(crate) fn dump_tres_type(tres: &TresType) -> Value {
    let mut dict = Dict::new();
    set_str(&mut dict, "type", &tres.kind);
    set_opt_str(&mut dict, "name", tres.name.as_deref());
    Value::Dict(dict)
}

pub(crate) fn parse_cluster(dict: &Dict) -> Cluster {
    Cluster {
        name: get_str(dict, "name").unwrap_or_default(),
        control_host: get_str(dict, "control_host"),
    }
}

pub(crate) fn dump_cluster(cluster: &Cluster) -> Value {
    let mut dict = Dict::new();
    set_str(&mut dict, "name", &cluster.name);
    set_opt_str(&mut dict, "control_host", cluster.control_host.as_deref());
    Value::Dict(dict)
}

pub(crate) fn dump_config(config: &ConfigDump) -> Value {
    let mut dict = Dict::new();
    dict.insert("clusters", Value::List(config.clusters.iter().map(dump_cluster).collect()));
    dict.insert("tres", Value::List(config.tres.iter().map(dump_tres_type).collect()));
    dict.insert("accounts", Value::List(config.accounts.iter().map(dump_account).collect()));
    dict.insert("users", Value::List(config.users.iter().map(dump_user).collect()));
    dict.insert("qos", Value::List(config.qos.iter().map(dump_qos).collect()));
    dict.insert("wckeys", Value::List(config.wckeys.iter().map(dump_wckey).collect()));
    dict.insert(
        "associations",
        Value::List(config.associations.iter().map(dump_association).collect()),
    );
    Value::Dict(dict)
}

/// Parses a full config dump envelope, for `POST /config` replay.
pub(crate) fn parse_config(dict: &Dict) -> ConfigDump {
    let list_of = |key: &str| -> Vec<Dict> {
        dict.get(key)
            .and_then(|v| v.as_list().ok())
            .map(|list| list.iter().filter_map(|v| v.as_dict().ok()).cloned().collect())
            .unwrap_or_default()
    };
    ConfigDump {
        clusters: list_of("clusters").iter().map(parse_cluster).collect(),
        tres: list_of("tres").iter().map(parse_tres_type).collect(),
        accounts: list_of("accounts").iter().map(parse_account).collect(),
        users: list_of("users").iter().map(parse_user).collect(),
        qos: list_of("qos").iter().map(parse_qos).collect(),
        wckeys: list_of("wckeys").iter().map(parse_wckey).collect(),
        associations: list_of("associations").iter().map(parse_association).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_account_coordinators() {
        let mut dict = Dict::new();
        dict.insert("name", Value::String("acct1".into()));
        dict.insert(
            "coordinators",
            Value::List(vec![Value::String("alice".into())]),
        );
        let account = parse_account(&dict);
        assert_eq!(account.name, "acct1");
        assert_eq!(account.coordinators, vec!["alice".to_string()]);
    }

    #[test]
    fn qos_preempt_sentinel_clears_list() {
        let mut dict = Dict::new();
        dict.insert("name", Value::String("normal".into()));
        dict.insert("preempt", Value::List(vec![Value::String(String::new())]));
        let qos = parse_qos(&dict);
        assert!(qos.preempt.is_empty());
    }

    #[test]
    fn tres_string_round_trips_through_dict() {
        let mut tres = TresString::new();
        tres.insert("cpu".to_string(), 4);
        let dumped = dump_tres_string(&tres);
        let mut dict = Dict::new();
        dict.insert("tres", dumped);
        let parsed = parse_tres_string(&dict, "tres");
        assert_eq!(parsed.get("cpu"), Some(&4));
    }

    #[test]
    fn user_rename_carries_old_name() {
        let mut dict = Dict::new();
        dict.insert("name", Value::String("bob2".into()));
        dict.insert("old_name", Value::String("bob".into()));
        let user = parse_user(&dict);
        assert_eq!(user.old_name.as_deref(), Some("bob"));
    }

    #[test]
    fn config_round_trips_accounts() {
        let config = ConfigDump {
            accounts: vec![Account {
                name: "acct1".into(),
                ..Account::default()
            }],
            ..ConfigDump::default()
        };
        let dumped = dump_config(&config);
        let dict = dumped.as_dict().unwrap().clone();
        let parsed = parse_config(&dict);
        assert_eq!(parsed.accounts.len(), 1);
        assert_eq!(parsed.accounts[0].name, "acct1");
    }
}
