// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the agent crate.

use std::path::PathBuf;
use std::time::Duration;

/// Server base URL (`SERVER_URL`, default `http://localhost:3000`)
pub fn server_url() -> String {
    std::env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Idle sleep between polls (`POLL_INTERVAL` in ms, default 1000)
pub fn poll_interval() -> Duration {
    let ms = std::env::var("POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(1000);
    Duration::from_millis(ms)
}

/// Directory holding the persisted identity file
/// (`AGENT_DATA_PATH`, default `./data`)
pub fn agent_data_path() -> PathBuf {
    std::env::var("AGENT_DATA_PATH")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Test hook: exit after this many polls (`KILL_AFTER`, unset = run forever)
pub fn kill_after() -> Option<u64> {
    std::env::var("KILL_AFTER").ok().and_then(|s| s.parse().ok())
}

/// Test hook: 20% chance of exiting at labelled crash points
/// (`RANDOM_FAILURES`, default false)
pub fn random_failures() -> bool {
    std::env::var("RANDOM_FAILURES")
        .map(|s| s == "true" || s == "1")
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
