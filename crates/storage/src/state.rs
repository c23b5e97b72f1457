// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use relay_core::{AgentId, AgentLiveness, Command, CommandId, CommandStatus, Event};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Materialized state built from WAL events.
///
/// Two tables, keyed independently: the command table and the per-agent
/// liveness table. The cross-references between them (`Command::owner`,
/// `AgentLiveness::current_command`) are plain ids, never pointers.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub commands: HashMap<String, Command>,
    #[serde(default)]
    pub agents: HashMap<String, AgentLiveness>,
}

impl MaterializedState {
    /// Get a command by exact id.
    pub fn get_command(&self, id: &str) -> Option<&Command> {
        self.commands.get(id)
    }

    /// All commands in FIFO order (`created_at` ascending, ties by id).
    pub fn commands_fifo(&self) -> Vec<&Command> {
        let mut all: Vec<&Command> = self.commands.values().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        all
    }

    /// The Pending command next in FIFO order, if any.
    pub fn next_pending(&self) -> Option<&Command> {
        self.commands
            .values()
            .filter(|c| c.status == CommandStatus::Pending)
            .min_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
    }

    /// The Running command owned by the given agent, if any.
    pub fn running_owned_by(&self, agent: &AgentId) -> Option<&Command> {
        self.commands
            .values()
            .find(|c| c.status == CommandStatus::Running && c.owner.as_ref() == Some(agent))
    }

    /// All Running commands (startup and stale reclamation scan these).
    pub fn running_commands(&self) -> Vec<&Command> {
        self.commands
            .values()
            .filter(|c| c.status == CommandStatus::Running)
            .collect()
    }

    /// Apply an event to derive state changes.
    ///
    /// Events are facts about what happened; state is derived from those
    /// facts, both live (inside store transactions) and during WAL replay.
    ///
    /// # Idempotency Requirement
    ///
    /// **All event handlers MUST be idempotent.** Applying the same event
    /// twice must produce the same state as applying it once. Handlers guard
    /// on the transition's precondition (e.g. a finish only applies to the
    /// still-Running record) so replays and duplicated entries are harmless.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::CommandSubmitted { id, payload, at } => {
                // Idempotency: ids are never reused, so an existing record
                // is this same submission
                if !self.commands.contains_key(id.as_str()) {
                    self.commands.insert(
                        id.as_str().to_string(),
                        Command::new(id.clone(), payload.clone(), *at),
                    );
                }
            }

            Event::CommandAssigned { id, agent, at } => {
                // Single-assignment: an agent holding a different Running
                // command cannot claim another
                let held = self.running_owned_by(agent).map(|c| c.id.clone());
                if held.is_some_and(|held| held != *id) {
                    return;
                }

                let Some(cmd) = self.commands.get_mut(id.as_str()) else {
                    return;
                };
                // Only a Pending command can be claimed; a Running record
                // with the same owner is this same assignment replayed
                let replay = cmd.status == CommandStatus::Running
                    && cmd.owner.as_ref() == Some(agent);
                if cmd.status != CommandStatus::Pending && !replay {
                    return;
                }

                cmd.status = CommandStatus::Running;
                cmd.owner = Some(agent.clone());
                cmd.started_at = Some(*at);
                cmd.updated_at = *at;

                let liveness = self
                    .agents
                    .entry(agent.as_str().to_string())
                    .or_insert_with(|| AgentLiveness::new(agent.clone(), *at));
                liveness.last_heartbeat = liveness.last_heartbeat.max(*at);
                liveness.current_command = Some(id.clone());
            }

            Event::CommandFinished {
                id,
                agent,
                status,
                result,
                at,
            } => {
                let Some(cmd) = self.commands.get_mut(id.as_str()) else {
                    return;
                };
                // Terminal states are immutable; only the owning agent's
                // report transitions out of Running
                if cmd.status != CommandStatus::Running || cmd.owner.as_ref() != Some(agent) {
                    return;
                }

                cmd.status = *status;
                cmd.result = result.clone();
                cmd.owner = None;
                cmd.completed_by = Some(agent.clone());
                cmd.completed_at = Some(*at);
                cmd.updated_at = *at;

                clear_current_command(&mut self.agents, agent, id);
            }

            Event::CommandRequeued { id, at, .. } => {
                let Some(cmd) = self.commands.get_mut(id.as_str()) else {
                    return;
                };
                if cmd.status != CommandStatus::Running {
                    return;
                }

                let owner = cmd.owner.take();
                cmd.status = CommandStatus::Pending;
                cmd.started_at = None;
                cmd.updated_at = *at;

                if let Some(owner) = owner {
                    clear_current_command(&mut self.agents, &owner, id);
                }
            }

            Event::HeartbeatRecorded { agent, at, .. } => {
                // The reported command id is advisory; the authoritative
                // current_command comes from the command table so invariant
                // 6 holds at every fold point
                let current = self
                    .running_owned_by(agent)
                    .map(|c| c.id.clone());

                let liveness = self
                    .agents
                    .entry(agent.as_str().to_string())
                    .or_insert_with(|| AgentLiveness::new(agent.clone(), *at));
                // Monotonic: replays never move the heartbeat backwards
                liveness.last_heartbeat = liveness.last_heartbeat.max(*at);
                liveness.current_command = current;
            }
        }
    }
}

fn clear_current_command(
    agents: &mut HashMap<String, AgentLiveness>,
    agent: &AgentId,
    command: &CommandId,
) {
    if let Some(liveness) = agents.get_mut(agent.as_str()) {
        if liveness.current_command.as_ref() == Some(command) {
            liveness.current_command = None;
        }
    }
}

/// Assert the state-machine invariants hold (test support).
///
/// Checks ownership agreement, result gating, single-assignment, and
/// heartbeat correspondence over the whole state.
#[cfg(test)]
pub(crate) fn assert_invariants(state: &MaterializedState) {
    let mut owners_running: HashMap<&str, usize> = HashMap::new();

    for cmd in state.commands.values() {
        // 1. Ownership agreement: Running ⇔ owner set; Running ⇒ started_at set
        assert_eq!(
            cmd.status == CommandStatus::Running,
            cmd.owner.is_some(),
            "ownership agreement violated for {}",
            cmd.id
        );
        if cmd.status == CommandStatus::Running {
            assert!(
                cmd.started_at.is_some(),
                "running command {} has no started_at",
                cmd.id
            );
        }

        // 3. Result gating
        if cmd.result.is_some() {
            assert!(
                cmd.is_terminal(),
                "non-terminal command {} has a result",
                cmd.id
            );
        }
        if cmd.is_terminal() {
            assert!(cmd.completed_at.is_some(), "terminal {} lacks completed_at", cmd.id);
            assert!(cmd.completed_by.is_some(), "terminal {} lacks completed_by", cmd.id);
        }

        if let Some(owner) = &cmd.owner {
            *owners_running.entry(owner.as_str()).or_default() += 1;

            // 6. Heartbeat correspondence
            let liveness = state
                .agents
                .get(owner.as_str())
                .unwrap_or_else(|| panic!("owner {owner} of {} has no liveness record", cmd.id));
            assert_eq!(
                liveness.current_command.as_ref(),
                Some(&cmd.id),
                "liveness of {owner} does not point at {}",
                cmd.id
            );
        }
    }

    // 4. Single-assignment
    for (agent, count) in owners_running {
        assert!(count <= 1, "agent {agent} owns {count} running commands");
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
