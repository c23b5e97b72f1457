// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic stale reclamation.
//!
//! A Running command whose owner has stopped heartbeating past the stale
//! timeout is returned to Pending for reassignment — the server-side
//! watchdog on execution. One serial interval task; passes never overlap.

use relay_core::Clock;
use relay_storage::CommandStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// One reclamation pass: requeue commands whose owner's last heartbeat is
/// older than `now - timeout`. Returns the number reclaimed.
pub fn run_reclaim_pass<C: Clock>(
    store: &CommandStore,
    clock: &C,
    timeout: Duration,
) -> Result<usize, relay_storage::StoreError> {
    let now = clock.now();
    let cutoff = now - chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::zero());
    store.reclaim_stale(cutoff, now)
}

/// Spawn the reclaimer task.
pub fn spawn_reclaimer<C: Clock + 'static>(
    store: CommandStore,
    clock: C,
    timeout: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would race startup recovery for no benefit
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match run_reclaim_pass(&store, &clock, timeout) {
                Ok(0) => {}
                Ok(count) => info!(count, "reclaimed stale commands"),
                Err(e) => error!("stale reclamation failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
#[path = "reclaim_tests.rs"]
mod tests;
