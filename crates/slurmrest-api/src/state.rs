//! Shared, read-only state every handler dispatch borrows (spec §5: "a
//! single global registry... initialized once at startup; after
//! initialization it is read-only").

use std::sync::Arc;

use slurmrest::ParserRegistry;
use slurmrest_backend::{BackendCaps, CtldBackend, DbdBackend};

/// Build-identifying fields carried on every response's `meta.plugin`/
/// `meta.slurm` block, independent of any particular request.
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// `meta.plugin.type`, e.g. `"openapi/slurmctld"`.
    pub plugin_type: String,
    /// `meta.plugin.name`, e.g. `"Slurm OpenAPI slurmctld"`.
    pub plugin_name: String,
    /// `meta.slurm.release`, e.g. `"24.05"`.
    pub slurm_release: String,
    /// `meta.slurm.version.{major,minor,micro}`.
    pub slurm_version: (u32, u32, u32),
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            plugin_type: "openapi/slurmctld".to_string(),
            plugin_name: "Slurm OpenAPI slurmctld".to_string(),
            slurm_release: "24.05".to_string(),
            slurm_version: (24, 5, 0),
        }
    }
}

/// Everything a request handler needs beyond its own parsed input: the
/// data-parser registry, the two backend RPC surfaces, and this build's
/// capability/identity fields.
#[derive(Clone)]
pub struct AppState {
    /// The registered `{data_parser}` versions.
    pub parsers: Arc<ParserRegistry>,
    /// The `slurmctld` RPC client.
    pub ctld: Arc<dyn CtldBackend>,
    /// The `slurmdbd` RPC client.
    pub dbd: Arc<dyn DbdBackend>,
    /// Which optional mutation RPCs this build exposes.
    pub caps: BackendCaps,
    /// Identity fields for the response envelope's `meta` block.
    pub build: BuildInfo,
}

impl AppState {
    /// Construct state backed by `ctld`/`dbd`, with the single `v0.0.39`
    /// parser registered.
    #[must_use]
    pub fn new(ctld: Arc<dyn CtldBackend>, dbd: Arc<dyn DbdBackend>, caps: BackendCaps) -> Self {
        let parsers = Arc::new(ParserRegistry::new());
        slurmrest_parsers::register(&parsers);
        Self {
            parsers,
            ctld,
            dbd,
            caps,
            build: BuildInfo::default(),
        }
    }
}
