//! Binary entry point: parse CLI flags, load configuration, initialize
//! logging, and serve the REST façade until shutdown.

#![forbid(unsafe_code)]

mod config;
mod server;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use slurmrest::ErrorClass;
use tracing_subscriber::EnvFilter;

/// REST façade for `slurmctld`/`slurmdbd`.
#[derive(Parser, Debug)]
#[command(name = "slurmrest-server", version, about = "REST façade for slurmctld/slurmdbd")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/slurmrest.toml")]
    config: PathBuf,

    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Enable verbose (debug) logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("slurmrest=debug,slurmrest_api=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slurmrest=info,slurmrest_api=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut cfg = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::error!(error = %err, config = %cli.config.display(), "failed to load configuration");
            return ExitCode::from(exit_code_for_class(ErrorClass::Client));
        }
    };
    if let Some(bind) = cli.bind {
        cfg.bind = bind;
    }

    match server::run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server exited with an error");
            ExitCode::from(exit_code_for_class(ErrorClass::Backend))
        }
    }
}

/// Maps a startup failure's broad class to the exit code `main` returns,
/// mirroring `ErrorKind::exit_code`'s per-request mapping for the
/// process-level failures a request-scoped `ErrorKind` can't represent.
fn exit_code_for_class(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::Client => 64,
        ErrorClass::Backend => 69,
        ErrorClass::Domain | ErrorClass::Fatal => 70,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_class() {
        assert_eq!(exit_code_for_class(ErrorClass::Client), 64);
        assert_eq!(exit_code_for_class(ErrorClass::Backend), 69);
        assert_eq!(exit_code_for_class(ErrorClass::Fatal), 70);
    }
}
