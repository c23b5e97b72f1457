// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Relay worker agent.
//!
//! A long-lived single-threaded worker that loops
//! {sync-on-startup → poll → execute → report}, heartbeating while it
//! executes. The agent persists nothing but its own identity; every other
//! piece of state lives on the server.

pub mod chaos;
pub mod client;
pub mod env;
pub mod executor;
pub mod identity;
pub mod poll;

pub use client::{ApiClient, ClientError, ControlPlane};
pub use executor::{CommandExecutor, ExecutorError, ExecutorSet};
pub use poll::{AgentConfig, AgentLoop};
