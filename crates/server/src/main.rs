// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay control server (relayd)
//!
//! Accepts commands from clients, persists them durably, coordinates worker
//! agents, and reclaims work from dead owners.
//!
//! Architecture:
//! - HTTP surface: axum handlers over the shared store
//! - Store: every transition is one WAL-backed transaction
//! - Background tasks: group-commit flush, checkpoint, stale reclaimer

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;
use std::time::Duration;

use relay_core::SystemClock;
use relay_server::{lifecycle, reclaim, routes, Config};
use relay_storage::{Checkpointer, CommandStore};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Flush interval for group commit (~10ms durability window)
const FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Checkpoint interval (60 seconds)
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

/// Hard deadline for graceful shutdown
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = Config::load();
    let clock = SystemClock;

    info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        "Starting relay server"
    );

    let lifecycle::StartupResult { mut server, listener } =
        lifecycle::startup(config, &clock).await?;

    // Spawn flush task for group commit (~10ms durability window)
    spawn_flush_task(server.store.clone());

    // Spawn checkpoint task for periodic snapshots + WAL truncation
    spawn_checkpoint(
        server.store.clone(),
        server.config.snapshot_path.clone(),
    );

    // Spawn the stale reclaimer
    reclaim::spawn_reclaimer(
        server.store.clone(),
        clock.clone(),
        server.config.command_timeout,
        server.config.stale_check_interval,
    );

    let ctx = Arc::new(routes::AppCtx {
        store: server.store.clone(),
        clock,
    });

    info!("Server ready");

    axum::serve(listener, routes::router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Teardown with a hard deadline: a wedged flush or snapshot must not
    // keep the process alive past the shutdown window
    let teardown = tokio::task::spawn_blocking(move || server.shutdown());
    if tokio::time::timeout(SHUTDOWN_DEADLINE, teardown).await.is_err() {
        error!("shutdown deadline exceeded, forcing exit");
        std::process::exit(1);
    }

    info!("Server stopped");
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
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }
}

/// Spawn a task that periodically flushes buffered WAL entries.
fn spawn_flush_task(store: CommandStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(FLUSH_INTERVAL);

        loop {
            interval.tick().await;

            if store.needs_flush() {
                if let Err(e) = store.flush() {
                    tracing::error!("Failed to flush WAL: {}", e);
                }
            }
        }
    });
}

/// Spawn a task that periodically saves snapshots and truncates the WAL.
///
/// WAL truncation only happens after the snapshot is fully durable (tmp
/// write, file fsync, atomic rename, directory fsync — in that order), so a
/// crash during a checkpoint never loses events.
fn spawn_checkpoint(store: CommandStore, snapshot_path: std::path::PathBuf) {
    let checkpointer = Checkpointer::new(snapshot_path);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);
        // Skip the immediate tick; there is nothing to checkpoint yet
        interval.tick().await;

        loop {
            interval.tick().await;

            let (seq, state) = store.checkpoint_begin();
            if seq == 0 {
                continue;
            }

            let handle = checkpointer.start(seq, &state);
            let result = tokio::task::spawn_blocking(move || handle.wait()).await;

            match result {
                Ok(Ok(checkpoint_result)) => {
                    tracing::debug!(
                        seq = checkpoint_result.seq,
                        size_bytes = checkpoint_result.size_bytes,
                        "checkpoint complete"
                    );

                    // NOW safe to truncate the WAL (snapshot is durable)
                    if let Err(e) = store.truncate_wal(seq) {
                        tracing::warn!(error = %e, "failed to truncate WAL after checkpoint");
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "checkpoint failed, WAL not truncated");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "checkpoint task panicked");
                }
            }
        }
    });
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
