// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity and liveness tracking.

use crate::command::CommandId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a worker agent.
    ///
    /// Generated once per agent installation and persisted locally, so the
    /// same logical agent keeps its identity across restarts.
    pub struct AgentId;
}

/// Per-agent liveness record maintained by the server.
///
/// `last_heartbeat` only ever advances; `current_command` mirrors what the
/// server believes the agent is working on and is kept in lockstep with
/// command ownership by the assignment and completion transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLiveness {
    pub agent_id: AgentId,
    pub last_heartbeat: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_command: Option<CommandId>,
}

impl AgentLiveness {
    pub fn new(agent_id: AgentId, now: DateTime<Utc>) -> Self {
        Self {
            agent_id,
            last_heartbeat: now,
            current_command: None,
        }
    }
}
