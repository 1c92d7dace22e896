//! TOML configuration for the server binary: bind address, backend
//! target, default data-parser version, request body limit, RPC timeout,
//! and the TRES-update capability flag.
//!
//! Precedence is file < env (`SLURMREST_*`) < CLI flags — this module
//! covers the first two; the CLI flag overrides are applied by the
//! caller after [`load_config`] returns.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Parsed and validated server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Backend target identifier, logged at startup. Only `"mock"` (the
    /// in-memory backend) is wired up; a real `slurmctld`/`slurmdbd` RPC
    /// client is out of scope.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Default `{data_parser}` version advertised in startup logs. Each
    /// request still names its own version in the path; this does not
    /// override that.
    #[serde(default = "default_data_parser_version")]
    pub data_parser_version: String,
    /// Maximum accepted request body size, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Timeout applied to backend RPCs, in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// Whether TRES add/modify/remove RPCs are permitted.
    #[serde(default)]
    pub tres_update_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:6830".to_string()
}

fn default_backend() -> String {
    "mock".to_string()
}

fn default_data_parser_version() -> String {
    "v0.0.39".to_string()
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

/// Load configuration from `path` (if it exists; an absent file falls
/// back to defaults), apply `SLURMREST_*` environment overrides, then
/// validate the result.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config: Config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?
    } else {
        toml::from_str("").context("failed to build default configuration")?
    };

    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(v) = std::env::var("SLURMREST_BIND") {
        config.bind = v;
    }
    if let Ok(v) = std::env::var("SLURMREST_BACKEND") {
        config.backend = v;
    }
    if let Ok(v) = std::env::var("SLURMREST_DATA_PARSER_VERSION") {
        config.data_parser_version = v;
    }
    if let Ok(v) = std::env::var("SLURMREST_MAX_BODY_BYTES").ok().and_then(|v| v.parse().ok()) {
        config.max_body_bytes = v;
    }
    if let Ok(v) = std::env::var("SLURMREST_RPC_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()) {
        config.rpc_timeout_secs = v;
    }
    if let Ok(v) = std::env::var("SLURMREST_TRES_UPDATE_ENABLED").ok().and_then(|v| v.parse().ok()) {
        config.tres_update_enabled = v;
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.bind.parse::<std::net::SocketAddr>().is_err() {
        anyhow::bail!("bind address {:?} is not a valid host:port", config.bind);
    }
    if config.max_body_bytes == 0 {
        anyhow::bail!("max_body_bytes must be > 0");
    }
    if config.rpc_timeout_secs == 0 {
        anyhow::bail!("rpc_timeout_secs must be > 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn write_temp_file(contents: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("slurmrest-server-test-{}-{n}.toml", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_config_uses_defaults_when_file_is_absent() {
        let config = load_config(Path::new("/nonexistent/slurmrest.toml")).unwrap();
        assert_eq!(config.bind, "127.0.0.1:6830");
        assert_eq!(config.backend, "mock");
        assert!(!config.tres_update_enabled);
    }

    #[test]
    fn load_config_parses_file_fields() {
        let path = write_temp_file(
            "bind = \"0.0.0.0:9000\"\nmax_body_bytes = 2048\ntres_update_enabled = true\n",
        );
        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.max_body_bytes, 2048);
        assert!(config.tres_update_enabled);
    }

    #[test]
    fn load_config_rejects_invalid_bind_address() {
        let path = write_temp_file("bind = \"not-an-address\"\n");
        let result = load_config(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn env_override_wins_over_file() {
        let path = write_temp_file("bind = \"0.0.0.0:9000\"\n");
        std::env::set_var("SLURMREST_BIND", "127.0.0.1:7777");
        let config = load_config(&path).unwrap();
        std::env::remove_var("SLURMREST_BIND");
        std::fs::remove_file(&path).ok();
        assert_eq!(config.bind, "127.0.0.1:7777");
    }
}
