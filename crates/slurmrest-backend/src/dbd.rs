//! `slurmdbd` RPC surface: accounts, associations, QOS, users, wckeys,
//! TRES, clusters (spec §4.I).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::BackendError;

/// An account record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    /// Account name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Organization.
    pub organization: Option<String>,
    /// Coordinator user names for this account.
    pub coordinators: Vec<String>,
}

/// A TRES (Trackable Resource) string, keyed by TRES name to a count.
pub type TresString = HashMap<String, i64>;

/// An association record, as returned by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Association {
    /// Association id.
    pub id: Option<u32>,
    /// Account this association grants access to.
    pub account: String,
    /// User this association applies to (absent for an account-only
    /// association).
    pub user: Option<String>,
    /// Cluster this association applies to.
    pub cluster: String,
    /// Resource limits as a TRES string.
    pub tres: TresString,
}

/// A diff record for [`DbdBackend::associations_modify`]: per spec §4.I,
/// fields denote the *change* to apply, not the destination state.
/// Removed TRES keys carry count `-1`; changed keys carry the new count;
/// new keys are added as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationDiff {
    /// The association id being modified.
    pub id: u32,
    /// The TRES changes to apply.
    pub tres_delta: TresString,
}

/// Compute the diff between an existing association's TRES string and
/// the incoming one, per spec §4.I: removed keys get `-1`, changed keys
/// get the new count, new keys are added.
#[must_use]
pub fn diff_tres(existing: &TresString, incoming: &TresString) -> TresString {
    let mut delta = TresString::new();
    for (key, old_count) in existing {
        match incoming.get(key) {
            None => {
                delta.insert(key.clone(), -1);
            }
            Some(new_count) if new_count != old_count => {
                delta.insert(key.clone(), *new_count);
            }
            Some(_) => {}
        }
    }
    for (key, new_count) in incoming {
        if !existing.contains_key(key) {
            delta.insert(key.clone(), *new_count);
        }
    }
    delta
}

/// A QOS (Quality of Service) record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Qos {
    /// QOS id; `None` when this is a to-be-created record identified by
    /// name instead.
    pub id: Option<u32>,
    /// QOS name.
    pub name: String,
    /// Names of QOS this one preempts. An empty, previously-non-empty
    /// list is represented on the wire as the sentinel `[""]` so the
    /// backend can tell "clear" from "no change" (spec §4.I).
    pub preempt: Vec<String>,
}

/// A user record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    /// User name.
    pub name: String,
    /// Previous name, when this update is a rename
    /// (`old_name` → `name`).
    pub old_name: Option<String>,
    /// Default wckey for this user.
    pub default_wckey: Option<String>,
    /// Wckeys already associated with this user.
    pub wckey_list: Vec<String>,
    /// Associations for this user; ignored on write with a warning (must
    /// be set via the associations endpoint).
    pub assoc_list: Vec<Association>,
    /// Coordinator-of-account relationships; ignored on write with a
    /// warning (must be set via the accounts endpoint).
    pub coord_accts: Vec<String>,
}

/// A wckey record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wckey {
    /// Wckey name.
    pub name: String,
    /// Owning user.
    pub user: String,
    /// Cluster this wckey is bound to.
    pub cluster: String,
}

/// A cluster record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cluster {
    /// Cluster name.
    pub name: String,
    /// Control host for this cluster.
    pub control_host: Option<String>,
}

/// A TRES (Trackable Resource) type definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TresType {
    /// TRES type, e.g. `"cpu"`, `"gres"`.
    pub kind: String,
    /// TRES name, e.g. a specific GRES name.
    pub name: Option<String>,
}

/// A complete fan-out snapshot of accounting state, per the config dump
/// GET (spec §4.I: "assembling clusters, TRES, accounts, users, QOS,
/// wckeys, associations into a single envelope").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDump {
    /// Clusters, in registration order.
    pub clusters: Vec<Cluster>,
    /// TRES types, in registration order.
    pub tres: Vec<TresType>,
    /// Accounts, in registration order.
    pub accounts: Vec<Account>,
    /// Users, in registration order.
    pub users: Vec<User>,
    /// QOS, in registration order.
    pub qos: Vec<Qos>,
    /// Wckeys, in registration order.
    pub wckeys: Vec<Wckey>,
    /// Associations, in registration order.
    pub associations: Vec<Association>,
}

/// The `slurmdbd` RPC surface a request context holds a handle to.
#[async_trait]
pub trait DbdBackend: Send + Sync {
    /// List accounts, optionally filtered by name.
    async fn accounts_get(&self, name: Option<&str>) -> Result<Vec<Account>, BackendError>;
    /// Add a new account.
    async fn accounts_add(&self, account: Account) -> Result<(), BackendError>;
    /// Modify an existing account. Coordinators are reconciled by the
    /// caller via [`DbdBackend::coord_add`]/[`DbdBackend::coord_remove`]
    /// before or after this call, not inline.
    async fn accounts_modify(&self, name: &str, account: Account) -> Result<(), BackendError>;
    /// Remove an account.
    async fn accounts_remove(&self, name: &str) -> Result<(), BackendError>;

    /// Grant `user` coordinator status on `account`.
    async fn coord_add(&self, account: &str, user: &str) -> Result<(), BackendError>;
    /// Revoke `user`'s coordinator status on `account`.
    async fn coord_remove(&self, account: &str, user: &str) -> Result<(), BackendError>;

    /// List associations matching `cond` (an account/user/cluster
    /// filter — left opaque to this trait).
    async fn associations_get(&self, cond: &str) -> Result<Vec<Association>, BackendError>;
    /// Apply a diff record (see [`diff_tres`]) rather than overwriting.
    async fn associations_modify(&self, diff: AssociationDiff) -> Result<(), BackendError>;
    /// Remove associations matching `cond`. If `only_one` is set and more
    /// than one record matches, the caller aborts before invoking this
    /// (spec §4.I); this method itself assumes the match count was
    /// already checked.
    async fn associations_remove(&self, cond: &str) -> Result<Vec<Association>, BackendError>;

    /// Fetch a QOS by id or name.
    async fn qos_get(&self, id: Option<u32>, name: Option<&str>) -> Result<Option<Qos>, BackendError>;
    /// Create a new QOS (identified by name; no id yet).
    async fn qos_add(&self, qos: Qos) -> Result<(), BackendError>;
    /// Modify an existing QOS (identified by id).
    async fn qos_modify(&self, id: u32, qos: Qos) -> Result<(), BackendError>;

    /// List users, optionally filtered by name.
    async fn users_get(&self, name: Option<&str>) -> Result<Vec<User>, BackendError>;
    /// Add a new user.
    async fn users_add(&self, user: User) -> Result<(), BackendError>;
    /// Modify an existing user, identified by `name` (the pre-rename name
    /// when this is a rename).
    async fn users_modify(&self, name: &str, user: User) -> Result<(), BackendError>;

    /// List wckeys, optionally filtered by name.
    async fn wckeys_get(&self, name: Option<&str>) -> Result<Vec<Wckey>, BackendError>;
    /// Add a new wckey.
    async fn wckeys_add(&self, wckey: Wckey) -> Result<(), BackendError>;
    /// Remove a wckey.
    async fn wckeys_remove(&self, name: &str) -> Result<(), BackendError>;

    /// List TRES types.
    async fn tres_get(&self) -> Result<Vec<TresType>, BackendError>;
    /// Add a TRES type. Gated by [`crate::BackendCaps::tres_update_enabled`]
    /// at the call site.
    async fn tres_add(&self, tres: TresType) -> Result<(), BackendError>;

    /// List clusters, optionally filtered by name.
    async fn clusters_get(&self, name: Option<&str>) -> Result<Vec<Cluster>, BackendError>;
    /// Add a new cluster.
    async fn clusters_add(&self, cluster: Cluster) -> Result<(), BackendError>;
    /// Modify an existing cluster.
    async fn clusters_modify(&self, name: &str, cluster: Cluster) -> Result<(), BackendError>;
    /// Remove a cluster.
    async fn clusters_remove(&self, name: &str) -> Result<(), BackendError>;

    /// Assemble the full fan-out snapshot for the config dump GET.
    async fn config_dump(&self) -> Result<ConfigDump, BackendError>;

    /// Commit the current transaction.
    async fn commit(&self) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_tres_marks_removed_keys_with_negative_one() {
        let existing = TresString::from([("cpu".to_string(), 4)]);
        let incoming = TresString::new();
        let delta = diff_tres(&existing, &incoming);
        assert_eq!(delta.get("cpu"), Some(&-1));
    }

    #[test]
    fn diff_tres_marks_changed_keys_with_new_count() {
        let existing = TresString::from([("cpu".to_string(), 4)]);
        let incoming = TresString::from([("cpu".to_string(), 8)]);
        let delta = diff_tres(&existing, &incoming);
        assert_eq!(delta.get("cpu"), Some(&8));
    }

    #[test]
    fn diff_tres_adds_new_keys() {
        let existing = TresString::new();
        let incoming = TresString::from([("gres/gpu".to_string(), 2)]);
        let delta = diff_tres(&existing, &incoming);
        assert_eq!(delta.get("gres/gpu"), Some(&2));
    }

    #[test]
    fn diff_tres_omits_unchanged_keys() {
        let existing = TresString::from([("cpu".to_string(), 4)]);
        let incoming = TresString::from([("cpu".to_string(), 4)]);
        let delta = diff_tres(&existing, &incoming);
        assert!(delta.is_empty());
    }
}
