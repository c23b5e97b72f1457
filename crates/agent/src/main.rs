// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay worker agent
//!
//! Loads (or mints) its persistent identity, syncs with the server so any
//! command left over from a previous incarnation is requeued, then polls
//! for work until killed.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use relay_agent::{env, identity, poll, ApiClient, ExecutorSet};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let server_url = env::server_url();
    let data_path = env::agent_data_path();

    let agent_id = identity::load_or_create(&data_path)?;
    info!(agent_id = %agent_id, server_url = %server_url, "Starting relay agent");

    let client = ApiClient::new(server_url)?;
    let config = poll::AgentConfig {
        poll_interval: env::poll_interval(),
        kill_after: env::kill_after(),
        random_failures: env::random_failures(),
    };
    let mut agent = poll::AgentLoop::new(client, agent_id, ExecutorSet::new()?, config);

    // Sync before polling: a command owned by our identity from a previous
    // run is requeued server-side and must not be re-executed here
    if let Err(e) = agent.sync().await {
        error!("startup sync failed: {}", e);
        return Err(e.into());
    }

    tokio::select! {
        _ = agent.run() => {
            info!("Agent loop finished");
        }
        _ = shutdown_signal() => {
            // The current command (if any) is abandoned; stale reclamation
            // returns it to Pending once heartbeats stop
            warn!("Shutdown signal received, exiting");
        }
    }

    Ok(())
}

/// Resolve on SIGTERM or SIGINT.
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to install SIGTERM handler: {}", e);
            return std::future::pending::<()>().await;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to install SIGINT handler: {}", e);
            return std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
