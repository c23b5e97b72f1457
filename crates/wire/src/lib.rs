// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! relay-wire: request/response envelopes for the Relay HTTP APIs.
//!
//! Shared between the server and the agent so both sides agree on one
//! serde definition of every body. All keys are camelCase on the wire.

mod agent;
mod client;

pub use agent::{
    FetchRequest, FetchResponse, HeartbeatRequest, HeartbeatResponse, ReportRequest,
    ReportResponse, ReportStatus, SyncRequest, SyncResponse,
};
pub use client::{
    CommandView, ErrorBody, HealthResponse, ListCommandsResponse, SubmitCommandRequest,
    SubmitCommandResponse,
};
