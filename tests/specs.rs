// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral tests for the relay server and agent.
//!
//! These drive the real HTTP surface: an in-process server on an ephemeral
//! port, real agents running their polling loop over reqwest, and raw
//! clients standing in for crashed or frozen agents.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/api.rs"]
mod api;
#[path = "specs/idempotency.rs"]
mod idempotency;
#[path = "specs/lifecycle.rs"]
mod lifecycle;
#[path = "specs/recovery.rs"]
mod recovery;
