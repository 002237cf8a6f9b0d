//! # CLI Interface
//!
//! Command-line argument structure for `educhain-server`, built with `clap`
//! derive. Supports four subcommands: `run`, `keygen`, `status`, and
//! `version`.

use clap::{Parser, Subcommand};

use educhain_core::config;

/// EduChain platform server.
///
/// Serves the REST API for course enrollment, credential issuance and
/// verification on the simulated test network, and credential-based loan
/// scoring. Exposes Prometheus metrics on a separate port.
#[derive(Parser, Debug)]
#[command(
    name = "educhain-server",
    about = "EduChain platform server",
    version,
    propagate_version = true
)]
pub struct EduChainCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the server binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the platform server.
    Run(RunArgs),
    /// Generate a fresh test-network keypair and print it.
    Keygen,
    /// Query the status of a running server via its API endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST API.
    #[arg(long, env = "EDUCHAIN_API_PORT", default_value_t = config::DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "EDUCHAIN_METRICS_PORT", default_value_t = config::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "EDUCHAIN_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// API endpoint of the running server.
    #[arg(long, default_value = "http://127.0.0.1:8745")]
    pub api_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        EduChainCli::command().debug_assert();
    }

    #[test]
    fn run_defaults_match_config() {
        let cli = EduChainCli::parse_from(["educhain-server", "run"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.api_port, config::DEFAULT_API_PORT);
                assert_eq!(args.metrics_port, config::DEFAULT_METRICS_PORT);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }
}
