// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command entity and its state machine.

use crate::liveness::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a command.
    ///
    /// Assigned at submission, never reused. Commands are referenced by this
    /// id in queries, assignment, result reports, and logs.
    pub struct CommandId;
}

/// The kind of work a command carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    Delay,
    HttpGetJson,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Delay => write!(f, "DELAY"),
            CommandKind::HttpGetJson => write!(f, "HTTP_GET_JSON"),
        }
    }
}

/// Kind-tagged command input.
///
/// Serializes as `{"type": "DELAY", "payload": {"ms": 500}}`, which is also
/// the client submission body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandPayload {
    Delay { ms: u64 },
    HttpGetJson { url: String },
}

impl CommandPayload {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandPayload::Delay { .. } => CommandKind::Delay,
            CommandPayload::HttpGetJson { .. } => CommandKind::HttpGetJson,
        }
    }
}

/// Where a command is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    /// Submitted, waiting for an agent
    Pending,
    /// Assigned to an agent and executing
    Running,
    /// Terminal: the executor produced a result
    Completed,
    /// Terminal: the executor reported an error
    Failed,
}

impl CommandStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandStatus::Completed | CommandStatus::Failed)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Pending => write!(f, "PENDING"),
            CommandStatus::Running => write!(f, "RUNNING"),
            CommandStatus::Completed => write!(f, "COMPLETED"),
            CommandStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Kind-tagged command outcome.
///
/// `Failure` carries the error message of a FAILED report; the other
/// variants mirror their executor's result shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandResult {
    Delay {
        ok: bool,
        took_ms: u64,
    },
    HttpGetJson {
        status: u16,
        body: Option<serde_json::Value>,
        truncated: bool,
        bytes_returned: u64,
        error: Option<String>,
    },
    Failure {
        error: String,
    },
}

/// A command record.
///
/// The server's store is the single source of truth for these; agents only
/// ever see projections over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub kind: CommandKind,
    pub payload: CommandPayload,
    pub status: CommandStatus,
    /// Non-null only in terminal states
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandResult>,
    /// Agent currently executing this command; non-null iff Running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<AgentId>,
    /// Agent whose report produced the terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<AgentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set on assignment, cleared on requeue; survives into terminal states
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Command {
    /// Create a freshly submitted command in `Pending`.
    pub fn new(id: CommandId, payload: CommandPayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: payload.kind(),
            payload,
            status: CommandStatus::Pending,
            result: None,
            owner: None,
            completed_by: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The agent to surface as `agentId`: the owner while Running, the
    /// reporting agent once terminal.
    pub fn agent_id(&self) -> Option<&AgentId> {
        self.owner.as_ref().or(self.completed_by.as_ref())
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
