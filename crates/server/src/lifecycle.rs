// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server lifecycle management: startup, recovery, shutdown.

use std::fs::File;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use fs2::FileExt;
use relay_core::Clock;
use relay_storage::{Checkpointer, CommandStore, StoreError};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port
    pub port: u16,
    /// Store directory (WAL, snapshot, and lock file live inside)
    pub data_dir: PathBuf,
    /// Path to the event WAL
    pub wal_path: PathBuf,
    /// Path to the state snapshot
    pub snapshot_path: PathBuf,
    /// Path to the exclusive lock/PID file
    pub lock_path: PathBuf,
    /// Stale threshold for running commands
    pub command_timeout: Duration,
    /// Reclaimer period
    pub stale_check_interval: Duration,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Self {
        let data_dir = crate::env::data_dir();
        Self {
            port: crate::env::port(),
            wal_path: data_dir.join("commands.wal"),
            snapshot_path: data_dir.join("commands.snapshot"),
            lock_path: data_dir.join("relayd.lock"),
            command_timeout: crate::env::command_timeout(),
            stale_check_interval: crate::env::stale_check_interval(),
            data_dir,
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: server already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server state during operation.
pub struct ServerState {
    /// Configuration
    pub config: Config,
    /// The durable command store
    pub store: CommandStore,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

/// Result of server startup.
pub struct StartupResult {
    /// The server state
    pub server: ServerState,
    /// The bound listener, ready to serve
    pub listener: TcpListener,
}

/// Start the server: lock the data dir, recover the store, reclaim crashed
/// running commands, and bind the listener — in that order, so no request
/// is served before recovery completes.
pub async fn startup<C: Clock>(config: Config, clock: &C) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.data_dir)?;

    // Exclusive lock: a second server on the same store would break the
    // transactional guarantees
    let mut lock_file = File::create(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let store = CommandStore::open(&config.wal_path, &config.snapshot_path)?;

    // Commands Running at crash time have indeterminate progress; requeue
    // them for retry before any agent can fetch or report
    let reclaimed = store.reclaim_crashed_running(clock.now())?;
    if reclaimed > 0 {
        info!(count = reclaimed, "requeued commands left running by previous process");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(addr, e))?;

    info!(addr = %addr, "server listening");

    Ok(StartupResult {
        server: ServerState {
            config,
            store,
            lock_file,
        },
        listener,
    })
}

impl ServerState {
    /// Shutdown gracefully: flush buffered WAL entries, write a final
    /// snapshot so the next startup replays an empty tail, and release the
    /// lock file.
    pub fn shutdown(&mut self) {
        info!("Shutting down server...");

        if let Err(e) = self.store.flush() {
            warn!("Failed to flush WAL on shutdown: {}", e);
        }

        let (seq, state) = self.store.checkpoint_begin();
        if seq > 0 {
            let checkpointer = Checkpointer::new(self.config.snapshot_path.clone());
            match checkpointer.checkpoint_sync(seq, &state) {
                Ok(result) => {
                    info!(seq = result.seq, "saved final shutdown snapshot");
                    if let Err(e) = self.store.truncate_wal(seq) {
                        warn!("Failed to truncate WAL after shutdown snapshot: {}", e);
                    }
                }
                Err(e) => warn!("Failed to save shutdown snapshot: {}", e),
            }
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove lock file: {}", e);
            }
        }

        info!("Server shutdown complete");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
