// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server crate.

use std::path::PathBuf;
use std::time::Duration;

/// Listen port (`PORT`, default 3000)
pub fn port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000)
}

/// Store directory holding the WAL, snapshot, and lock file
/// (`DB_PATH`, default `./data`)
pub fn data_dir() -> PathBuf {
    std::env::var("DB_PATH")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Stale threshold: a Running command whose owner has not heartbeated for
/// this long is reclaimed (`COMMAND_TIMEOUT` in ms, default 60000)
pub fn command_timeout() -> Duration {
    millis_var("COMMAND_TIMEOUT", 60_000)
}

/// Reclaimer period (`STALE_CHECK_INTERVAL` in ms, default 10000)
pub fn stale_check_interval() -> Duration {
    millis_var("STALE_CHECK_INTERVAL", 10_000)
}

fn millis_var(key: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
