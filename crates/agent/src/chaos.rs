// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-injection test hook.
//!
//! With `RANDOM_FAILURES` enabled, each labelled crash point gives the
//! process a 20% chance of dying on the spot. Exercises the recovery
//! protocol end to end: sync-on-startup, stale reclamation, and
//! idempotent refetch all get hit by real mid-flight deaths.

use rand::Rng;
use tracing::error;

/// Exit code used by injected crashes, distinguishable from real panics.
const CRASH_EXIT_CODE: i32 = 17;

/// Maybe kill the process at a labelled point.
pub fn maybe_crash(enabled: bool, label: &str) {
    if !enabled {
        return;
    }
    if rand::thread_rng().gen_bool(0.2) {
        error!(label, "RANDOM_FAILURES triggered, exiting");
        std::process::exit(CRASH_EXIT_CODE);
    }
}
