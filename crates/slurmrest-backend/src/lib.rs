//! Opaque `slurmctld`/`slurmdbd` RPC client traits, plus an in-memory mock
//! implementation for tests and local development.
//!
//! This crate owns the domain record shapes the RPCs move (jobs, nodes,
//! partitions, reservations on the `ctld` side; accounts, associations,
//! QOS, users, wckeys, TRES, clusters on the `dbd` side). The data-parser
//! plugin (`slurmrest-parsers`) transcodes these to and from the wire
//! data tree; this crate never sees JSON.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod ctld;
pub mod dbd;
mod mock;

pub use ctld::CtldBackend;
pub use dbd::DbdBackend;
pub use mock::MockBackend;

/// Feature flags describing what this backend build supports.
///
/// `tres_update_enabled` gates the TRES modify/remove RPCs (spec §9 open
/// question: "TRES update is disabled in release builds; preserve that
/// behavior unless explicitly enabled by a build/runtime flag"). Defaults
/// to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCaps {
    /// Whether TRES add/modify/remove RPCs are permitted.
    pub tres_update_enabled: bool,
}

impl Default for BackendCaps {
    fn default() -> Self {
        Self {
            tres_update_enabled: false,
        }
    }
}

/// A backend RPC failure. The calling handler maps a variant to the
/// appropriate envelope [`ErrorKind`](../slurmrest/errors/enum.ErrorKind.html)
/// at the call site, since that mapping depends on which RPC failed.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum BackendError {
    /// The connection to `slurmctld`/`slurmdbd` could not be established
    /// or was lost mid-call.
    #[error("backend connection failed: {0}")]
    Connection(String),
    /// The RPC completed but the backend reported a non-zero return code.
    #[error("backend RPC {rpc} failed with code {code}: {message}")]
    RpcFailed {
        /// The RPC name, for error attribution.
        rpc: String,
        /// The backend's numeric return code.
        code: i64,
        /// A human-readable message.
        message: String,
    },
    /// The backend reported its `NO_CHANGE_IN_DATA` sentinel: nothing has
    /// changed since the caller's timestamp.
    #[error("no change in data since the caller's last update")]
    NoChangeInData,
    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A bulk RPC exceeded its configured timeout.
    #[error("backend RPC {0} timed out")]
    Timeout(String),
}
