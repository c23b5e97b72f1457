// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DTOs for the client-facing API.

use chrono::{DateTime, Utc};
use relay_core::{Command, CommandPayload, CommandResult, CommandStatus};
use serde::{Deserialize, Serialize};

/// `POST /commands` body.
///
/// `CommandPayload` already serializes as `{"type": ..., "payload": ...}`,
/// so the submission body is the payload envelope itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmitCommandRequest {
    pub command: CommandPayload,
}

/// `POST /commands` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCommandResponse {
    pub command_id: String,
}

/// API projection of a command record.
///
/// The flattened payload contributes the `type` and `payload` keys, so a
/// view carries everything an agent needs to execute the command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandView {
    pub id: String,
    #[serde(flatten)]
    pub payload: CommandPayload,
    pub status: CommandStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandResult>,
    /// Owner while Running, the reporting agent once terminal
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Command> for CommandView {
    fn from(cmd: &Command) -> Self {
        CommandView {
            id: cmd.id.as_str().to_string(),
            payload: cmd.payload.clone(),
            status: cmd.status,
            result: cmd.result.clone(),
            agent_id: cmd.agent_id().map(|a| a.as_str().to_string()),
            created_at: cmd.created_at,
            updated_at: cmd.updated_at,
            started_at: cmd.started_at,
            completed_at: cmd.completed_at,
        }
    }
}

/// `GET /commands` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCommandsResponse {
    pub commands: Vec<CommandView>,
}

/// `GET /health` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
