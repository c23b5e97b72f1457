// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable command store.
//!
//! One mutex guards the materialized state and the WAL together; every
//! operation below is a single critical section that validates against
//! current state, appends its event, makes it durable, and folds it. That
//! is the transaction: serialization through the mutex, durability through
//! the WAL fsync.
//!
//! Heartbeats are the one exception — they append without an immediate
//! fsync and ride the group-commit flush window, since a lost tail
//! heartbeat only makes stale reclamation marginally more eager after a
//! crash.

use crate::{MaterializedState, Snapshot, SnapshotError, Wal, WalError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use relay_core::{
    AgentId, AgentLiveness, Command, CommandId, CommandPayload, CommandResult, CommandStatus,
    Event, RequeueReason,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate command id: {0}")]
    DuplicateId(CommandId),

    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

struct StoreInner {
    state: MaterializedState,
    wal: Wal,
}

impl StoreInner {
    /// Append an event, make it durable, and fold it into state.
    fn commit(&mut self, event: Event) -> Result<(), StoreError> {
        self.wal.append(&event)?;
        self.wal.flush()?;
        self.state.apply_event(&event);
        Ok(())
    }

    /// Append an event without an immediate fsync (group commit).
    fn commit_buffered(&mut self, event: Event) -> Result<(), StoreError> {
        self.wal.append(&event)?;
        self.state.apply_event(&event);
        Ok(())
    }
}

/// Handle to the durable command store. Cheap to clone; all clones share
/// the same underlying state and WAL.
#[derive(Clone)]
pub struct CommandStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl CommandStore {
    /// Open the store: load the snapshot (if any), replay WAL entries after
    /// the snapshot sequence, and fold them into state.
    pub fn open(wal_path: &Path, snapshot_path: &Path) -> Result<Self, StoreError> {
        let (seq, mut state) = match Snapshot::load(snapshot_path)? {
            Some(snapshot) => (snapshot.seq, snapshot.state),
            None => (0, MaterializedState::default()),
        };

        let mut wal = Wal::open(wal_path)?;
        let entries = wal.entries_after(seq)?;
        let replayed = entries.len();
        for entry in entries {
            state.apply_event(&entry.event);
        }

        if seq > 0 || replayed > 0 {
            info!(
                snapshot_seq = seq,
                replayed_entries = replayed,
                commands = state.commands.len(),
                "store recovered"
            );
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(StoreInner { state, wal })),
        })
    }

    /// Insert a freshly submitted command in `Pending`.
    pub fn insert_command(
        &self,
        id: CommandId,
        payload: CommandPayload,
        now: DateTime<Utc>,
    ) -> Result<Command, StoreError> {
        let mut inner = self.inner.lock();

        if inner.state.commands.contains_key(id.as_str()) {
            return Err(StoreError::DuplicateId(id));
        }

        inner.commit(Event::CommandSubmitted {
            id: id.clone(),
            payload,
            at: now,
        })?;

        // Just inserted under the same lock
        Ok(inner.state.commands[id.as_str()].clone())
    }

    /// Get a command by exact id.
    pub fn get_command(&self, id: &str) -> Option<Command> {
        self.inner.lock().state.get_command(id).cloned()
    }

    /// All commands in FIFO order.
    pub fn list_commands(&self) -> Vec<Command> {
        self.inner
            .lock()
            .state
            .commands_fifo()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Single-flight assignment.
    ///
    /// If the agent already owns a Running command it is returned unchanged,
    /// making a retried fetch idempotent. Otherwise the oldest Pending
    /// command (ties by id) is claimed in the same critical section, so two
    /// agents can never win the same command.
    pub fn assign_next_to(
        &self,
        agent: &AgentId,
        now: DateTime<Utc>,
    ) -> Result<Option<Command>, StoreError> {
        let mut inner = self.inner.lock();

        if let Some(current) = inner.state.running_owned_by(agent) {
            return Ok(Some(current.clone()));
        }

        let Some(next_id) = inner.state.next_pending().map(|c| c.id.clone()) else {
            return Ok(None);
        };

        inner.commit(Event::CommandAssigned {
            id: next_id.clone(),
            agent: agent.clone(),
            at: now,
        })?;

        info!(command_id = %next_id, agent_id = %agent, "command assigned");
        Ok(inner.state.get_command(next_id.as_str()).cloned())
    }

    /// The Running command owned by the given agent, if any.
    pub fn get_running_for(&self, agent: &AgentId) -> Option<Command> {
        self.inner.lock().state.running_owned_by(agent).cloned()
    }

    /// Record a terminal report.
    ///
    /// Returns true iff the record was still Running and owned by the
    /// reporting agent; otherwise state is left untouched. When `error` is
    /// present the stored result is the failure variant carrying it.
    pub fn complete(
        &self,
        id: &CommandId,
        agent: &AgentId,
        terminal: CommandStatus,
        result: Option<CommandResult>,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if !terminal.is_terminal() {
            return Ok(false);
        }

        let mut inner = self.inner.lock();

        let owned = matches!(
            inner.state.get_command(id.as_str()),
            Some(cmd) if cmd.status == CommandStatus::Running && cmd.owner.as_ref() == Some(agent)
        );
        if !owned {
            return Ok(false);
        }

        let stored_result = match error {
            Some(error) => Some(CommandResult::Failure { error }),
            None => result,
        };

        inner.commit(Event::CommandFinished {
            id: id.clone(),
            agent: agent.clone(),
            status: terminal,
            result: stored_result,
            at: now,
        })?;

        info!(command_id = %id, agent_id = %agent, status = %terminal, "command finished");
        Ok(true)
    }

    /// Upsert the agent's liveness record (group-committed).
    pub fn touch_heartbeat(
        &self,
        agent: &AgentId,
        command: Option<CommandId>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.commit_buffered(Event::HeartbeatRecorded {
            agent: agent.clone(),
            command,
            at: now,
        })
    }

    /// Look up the liveness record for an agent.
    pub fn get_liveness(&self, agent: &AgentId) -> Option<AgentLiveness> {
        self.inner.lock().state.agents.get(agent.as_str()).cloned()
    }

    /// Agent-resync recovery: requeue the command still owned by a
    /// restarting agent, if any, and return the requeued record.
    pub fn requeue_unfinished(
        &self,
        agent: &AgentId,
        now: DateTime<Utc>,
    ) -> Result<Option<Command>, StoreError> {
        let mut inner = self.inner.lock();

        let Some(id) = inner.state.running_owned_by(agent).map(|c| c.id.clone()) else {
            return Ok(None);
        };

        inner.commit(Event::CommandRequeued {
            id: id.clone(),
            reason: RequeueReason::AgentResync,
            at: now,
        })?;

        warn!(command_id = %id, agent_id = %agent, "requeued unfinished command after agent resync");
        Ok(inner.state.get_command(id.as_str()).cloned())
    }

    /// Server-startup recovery: every Running command had indeterminate
    /// progress at crash time, so all of them go back to Pending.
    pub fn reclaim_crashed_running(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();

        let ids: Vec<CommandId> = inner
            .state
            .running_commands()
            .into_iter()
            .map(|c| c.id.clone())
            .collect();

        for id in &ids {
            inner.commit(Event::CommandRequeued {
                id: id.clone(),
                reason: RequeueReason::ServerRestart,
                at: now,
            })?;
        }

        if !ids.is_empty() {
            warn!(count = ids.len(), "reclaimed running commands after restart");
        }
        Ok(ids.len())
    }

    /// Periodic stale reclamation: requeue Running commands whose owner has
    /// not heartbeated since `cutoff`. An owner with no liveness record at
    /// all counts as stale.
    pub fn reclaim_stale(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();

        let stale: Vec<(CommandId, AgentId)> = inner
            .state
            .running_commands()
            .into_iter()
            .filter_map(|cmd| {
                let owner = cmd.owner.clone()?;
                let alive = inner
                    .state
                    .agents
                    .get(owner.as_str())
                    .is_some_and(|l| l.last_heartbeat >= cutoff);
                (!alive).then(|| (cmd.id.clone(), owner))
            })
            .collect();

        for (id, owner) in &stale {
            inner.commit(Event::CommandRequeued {
                id: id.clone(),
                reason: RequeueReason::StaleOwner,
                at: now,
            })?;
            warn!(command_id = %id, agent_id = %owner, "reclaimed stale command");
        }

        Ok(stale.len())
    }

    /// Flush buffered WAL entries (the group-commit durability point).
    pub fn flush(&self) -> Result<(), StoreError> {
        Ok(self.inner.lock().wal.flush()?)
    }

    /// Check if the WAL has buffered entries past the flush window.
    pub fn needs_flush(&self) -> bool {
        self.inner.lock().wal.needs_flush()
    }

    /// Snapshot point for a checkpoint: the current WAL sequence and a
    /// clone of state, taken under one lock.
    pub fn checkpoint_begin(&self) -> (u64, MaterializedState) {
        let inner = self.inner.lock();
        (inner.wal.write_seq(), inner.state.clone())
    }

    /// Drop WAL entries covered by a durable snapshot at `seq`.
    pub fn truncate_wal(&self, seq: u64) -> Result<(), StoreError> {
        Ok(self.inner.lock().wal.truncate_through(seq)?)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
