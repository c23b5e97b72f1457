// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent polling loop.
//!
//! Single-threaded cooperative: one command executes at a time, and the
//! in-execution heartbeat is a `select!` arm on the same task, so it is
//! cancelled on every exit path by construction.

use crate::chaos;
use crate::client::{ClientError, ControlPlane};
use crate::executor::ExecutorSet;
use relay_core::AgentId;
use relay_wire::{CommandView, ReportRequest, ReportStatus};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Heartbeat period while a command is executing
const EXEC_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Loop configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Idle sleep between polls
    pub poll_interval: Duration,
    /// Test hook: exit after this many polls
    pub kill_after: Option<u64>,
    /// Test hook: enable labelled crash points
    pub random_failures: bool,
}

/// The agent's {sync → poll → execute → report} state machine.
pub struct AgentLoop<P: ControlPlane> {
    client: P,
    agent_id: AgentId,
    executors: ExecutorSet,
    config: AgentConfig,
    polls: u64,
}

impl<P: ControlPlane> AgentLoop<P> {
    pub fn new(client: P, agent_id: AgentId, executors: ExecutorSet, config: AgentConfig) -> Self {
        Self {
            client,
            agent_id,
            executors,
            config,
            polls: 0,
        }
    }

    /// Startup sync.
    ///
    /// The previous incarnation of this identity may have died mid-command.
    /// The server requeues whatever it still owns; this agent only logs the
    /// abandonment — re-execution happens through normal reassignment, so
    /// the command is never run on stale local state.
    pub async fn sync(&self) -> Result<(), ClientError> {
        match self.client.sync(self.agent_id.as_str()).await? {
            Some(cmd) => {
                warn!(
                    command_id = %cmd.id,
                    "server requeued command left over from previous run; not re-executing"
                );
            }
            None => debug!("sync: no unfinished command"),
        }
        Ok(())
    }

    /// Run the polling loop until the kill-after threshold (if any).
    pub async fn run(&mut self) {
        loop {
            self.polls += 1;
            if let Some(limit) = self.config.kill_after {
                if self.polls > limit {
                    info!(polls = self.polls - 1, "kill-after threshold reached, exiting");
                    return;
                }
            }

            chaos::maybe_crash(self.config.random_failures, "poll:start");

            // Idle heartbeat; during execution the select arm takes over
            self.client.heartbeat(self.agent_id.as_str(), None).await;

            let fetched = self.client.fetch_next(self.agent_id.as_str()).await;

            match fetched {
                Err(e) => {
                    warn!("fetch failed after retries: {}; abandoning this cycle", e);
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Ok(None) => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Ok(Some(command)) => {
                    chaos::maybe_crash(self.config.random_failures, "poll:after-fetch");
                    self.execute_and_report(command).await;
                }
            }
        }
    }

    /// Execute one command and report its terminal outcome.
    async fn execute_and_report(&self, command: CommandView) {
        let command_id = command.id.clone();
        info!(command_id = %command_id, kind = %command.payload.kind(), "executing command");

        let progress_id = command_id.clone();
        let progress = move |msg: &str| debug!(command_id = %progress_id, "{}", msg);

        let exec = self.executors.execute(&command.payload, &progress);
        tokio::pin!(exec);

        let mut heartbeat = tokio::time::interval(EXEC_HEARTBEAT_INTERVAL);

        let outcome = loop {
            tokio::select! {
                outcome = &mut exec => break outcome,
                _ = heartbeat.tick() => {
                    self.client
                        .heartbeat(self.agent_id.as_str(), Some(&command_id))
                        .await;
                }
            }
        };

        chaos::maybe_crash(self.config.random_failures, "execute:before-report");

        let request = match outcome {
            Ok(result) => ReportRequest {
                agent_id: self.agent_id.as_str().to_string(),
                command_id: command_id.clone(),
                status: ReportStatus::Completed,
                result: Some(result),
                error: None,
            },
            Err(e) => ReportRequest {
                agent_id: self.agent_id.as_str().to_string(),
                command_id: command_id.clone(),
                status: ReportStatus::Failed,
                result: None,
                error: Some(e.to_string()),
            },
        };

        match self.client.report(&request).await {
            Ok(response) => {
                if let Some(message) = response.message {
                    info!(command_id = %command_id, "report acknowledged: {}", message);
                }
            }
            Err(ClientError::Conflict(message)) => {
                // The server reclaimed the command while we ran it (restart
                // or stale timeout); the result belongs to whoever runs it next
                warn!(command_id = %command_id, "report rejected: {}", message);
            }
            Err(e) => {
                warn!(
                    command_id = %command_id,
                    "report failed after retries: {}; abandoning this cycle", e
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
