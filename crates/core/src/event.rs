// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable events for the command state machine.
//!
//! Every state transition is recorded as one of these facts in the WAL;
//! server state is the fold of events over an empty store. Folds must be
//! idempotent (see `MaterializedState::apply_event`).

use crate::command::{CommandId, CommandPayload, CommandResult, CommandStatus};
use crate::liveness::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a Running command went back to Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequeueReason {
    /// Server restarted while the command was Running
    ServerRestart,
    /// Owner stopped heartbeating past the stale timeout
    StaleOwner,
    /// Owner resynced after a crash and abandoned the command
    AgentResync,
}

impl fmt::Display for RequeueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequeueReason::ServerRestart => write!(f, "server_restart"),
            RequeueReason::StaleOwner => write!(f, "stale_owner"),
            RequeueReason::AgentResync => write!(f, "agent_resync"),
        }
    }
}

/// Events that drive state transitions.
///
/// Serializes with `{"type": "command:submitted", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A client submitted a new command
    #[serde(rename = "command:submitted")]
    CommandSubmitted {
        id: CommandId,
        payload: CommandPayload,
        at: DateTime<Utc>,
    },

    /// The single-flight fetch handed a Pending command to an agent
    #[serde(rename = "command:assigned")]
    CommandAssigned {
        id: CommandId,
        agent: AgentId,
        at: DateTime<Utc>,
    },

    /// The owning agent reported a terminal outcome
    #[serde(rename = "command:finished")]
    CommandFinished {
        id: CommandId,
        agent: AgentId,
        status: CommandStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<CommandResult>,
        at: DateTime<Utc>,
    },

    /// A Running command went back to Pending for reassignment
    #[serde(rename = "command:requeued")]
    CommandRequeued {
        id: CommandId,
        reason: RequeueReason,
        at: DateTime<Utc>,
    },

    /// An agent checked in
    #[serde(rename = "agent:heartbeat")]
    HeartbeatRecorded {
        agent: AgentId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<CommandId>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The command this event concerns, if any.
    pub fn command_id(&self) -> Option<&CommandId> {
        match self {
            Event::CommandSubmitted { id, .. }
            | Event::CommandAssigned { id, .. }
            | Event::CommandFinished { id, .. }
            | Event::CommandRequeued { id, .. } => Some(id),
            Event::HeartbeatRecorded { command, .. } => command.as_ref(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
