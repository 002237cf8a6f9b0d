// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # EduChain Platform Server
//!
//! Entry point for the `educhain-server` binary. Parses CLI arguments,
//! initializes logging and metrics, bootstraps the simulated test network,
//! and serves the REST API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     — start the platform server
//! - `keygen`  — generate a test-network keypair and print it
//! - `status`  — query a running server's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use educhain_core::credential::CredentialIssuer;
use educhain_core::ledger::TestnetLedger;
use educhain_core::storage::MemStorage;

use cli::{Commands, EduChainCli};
use logging::LogFormat;
use metrics::ApiMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = EduChainCli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Keygen => {
            generate_keypair();
            Ok(())
        }
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full platform server: API and metrics endpoints over a
/// freshly bootstrapped ledger and seeded store.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "educhain_server=info,educhain_core=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        "starting educhain-server"
    );

    // --- Ledger & platform state ---
    let ledger = Arc::new(TestnetLedger::bootstrap());
    let issuer = Arc::new(CredentialIssuer::new(Arc::clone(&ledger)));
    let store = Arc::new(MemStorage::new());
    let api_metrics = Arc::new(ApiMetrics::new());
    api_metrics.ledger_accounts.set(ledger.account_count() as i64);

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: educhain_core::config::NETWORK_NAME.to_string(),
        store,
        ledger,
        issuer,
        metrics: Arc::clone(&api_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&api_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("educhain-server stopped");
    Ok(())
}

/// Generates a test-network keypair and prints it to stdout.
///
/// The secret seed is printed in the clear. This is a test-network tool;
/// nothing generated here should ever hold real value.
fn generate_keypair() {
    let keypair = TestnetLedger::generate_keypair();
    println!("Keypair generated.");
    println!("  Address     : {}", keypair.address);
    println!("  Secret seed : {}", keypair.secret_seed);
}

/// Queries a running server's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.api_url.trim_end_matches('/'));
    let body = http_get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP GET over a raw TCP stream. Enough for the `status`
/// subcommand without adding an HTTP client dependency.
async fn http_get(url: &str) -> Result<String> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| anyhow::anyhow!("only http:// URLs are supported: {}", url))?;

    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    let (host, port) = match authority.rsplit_once(':') {
        Some((h, p)) => (h, p.parse::<u16>().context("bad port in URL")?),
        None => (authority, 80),
    };

    let addr = format!("{}:{}", host, port);
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Everything after the first blank line is the body.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Prints version information to stdout.
fn print_version() {
    println!("educhain-server {}", env!("CARGO_PKG_VERSION"));
    println!(
        "network         {}",
        educhain_core::config::NETWORK_NAME
    );
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
