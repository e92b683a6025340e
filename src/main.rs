//! Entry point: parse CLI args, wire up logging, and run the session loop
//! over stdio until `exit`.
//!
//! Grounded on the teacher's `main.rs` startup sequence (tracing init to
//! stderr since stdout is the wire transport, binary discovery, building
//! the shared client/state, then driving the transport to completion).

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use super_lazy_clangd::cli::Cli;
use super_lazy_clangd::session::{trace_enabled, Session, SessionState};

fn init_tracing(log_file: Option<&std::path::Path>) {
    // CLANGD_TRACE/SLCLANGD_TRACE gate a per-method debug!() line in the
    // session engine (spec §6); without this, the default "warn" filter
    // would silently swallow it even with the env var set.
    let default_level = if trace_enabled() { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    match log_file {
        Some(path) => {
            if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::sync::Mutex::new(file))
                    .init();
                return;
            }
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            tracing::warn!("failed to open log file {}, logging to stderr", path.display());
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref());

    if which::which(&cli.grep_bin).is_err() {
        tracing::warn!(
            "search binary {:?} not found on PATH; proceeding anyway (spec §4.C)",
            cli.grep_bin
        );
    }

    let state = Arc::new(SessionState::new(cli.grep_bin, cli.files));
    if let Some(root) = cli.root {
        *state
            .root
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(root);
    }

    tracing::info!("starting super-lazy-clangd");

    let session = Session::new(Arc::clone(&state), tokio::io::stdout());
    let shutdown_received = session.run(tokio::io::stdin()).await;

    if shutdown_received {
        Ok(())
    } else {
        Err(anyhow::anyhow!("session ended without a shutdown request"))
            .context("exiting with non-zero status")
    }
}
