// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Relay control server (relayd).
//!
//! Owns the authoritative command store, serves the client submission/query
//! API and the agent coordination API, and runs the periodic stale
//! reclaimer. All state transitions go through `CommandStore` transactions;
//! the HTTP layer only validates, translates, and reports.

pub mod env;
pub mod lifecycle;
pub mod reclaim;
pub mod routes;

pub use lifecycle::{Config, LifecycleError, ServerState};
pub use routes::{router, AppCtx};
