// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent coordination API handlers: fetch, result, sync, heartbeat.

use super::error::ApiError;
use super::AppCtx;
use axum::extract::State;
use axum::Json;
use relay_core::{AgentId, Clock, CommandId, CommandStatus};
use relay_wire::{
    CommandView, FetchRequest, FetchResponse, HeartbeatRequest, HeartbeatResponse, ReportRequest,
    ReportResponse, SyncRequest, SyncResponse,
};
use std::sync::Arc;
use tracing::{info, warn};

fn parse_agent_id(raw: &str) -> Result<AgentId, ApiError> {
    if raw.trim().is_empty() {
        return Err(ApiError::Validation("agentId must not be empty".to_string()));
    }
    Ok(AgentId::new(raw))
}

/// `POST /agent/fetch` — single-flight assignment.
pub(super) async fn fetch<C: Clock>(
    State(ctx): State<Arc<AppCtx<C>>>,
    Json(request): Json<FetchRequest>,
) -> Result<Json<FetchResponse>, ApiError> {
    let agent = parse_agent_id(&request.agent_id)?;

    let command = ctx.store.assign_next_to(&agent, ctx.clock.now())?;

    Ok(Json(FetchResponse {
        command: command.as_ref().map(CommandView::from),
    }))
}

/// `POST /agent/result` — terminal report with idempotent replay.
///
/// A report that no longer matches a Running record is acknowledged as a
/// no-op when the command already reached the requested terminal state via
/// the same agent (the report crossed a retry); anything else conflicts.
pub(super) async fn report_result<C: Clock>(
    State(ctx): State<Arc<AppCtx<C>>>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let agent = parse_agent_id(&request.agent_id)?;
    let command_id = CommandId::new(request.command_id.as_str());
    let terminal: CommandStatus = request.status.into();

    let applied = ctx.store.complete(
        &command_id,
        &agent,
        terminal,
        request.result,
        request.error,
        ctx.clock.now(),
    )?;

    if applied {
        return Ok(Json(ReportResponse {
            acknowledged: true,
            message: None,
        }));
    }

    let cmd = ctx
        .store
        .get_command(command_id.as_str())
        .ok_or_else(|| ApiError::NotFound(format!("unknown command: {command_id}")))?;

    let is_replay = cmd.status == terminal && cmd.completed_by.as_ref() == Some(&agent);
    if is_replay {
        info!(command_id = %command_id, agent_id = %agent, "duplicate result report acknowledged");
        return Ok(Json(ReportResponse {
            acknowledged: true,
            message: Some("duplicate report ignored".to_string()),
        }));
    }

    Err(ApiError::Conflict(format!(
        "command {command_id} is not running under agent {agent}"
    )))
}

/// `POST /agent/sync` — agent-crash recovery.
///
/// Any command still owned by the syncing agent is requeued to Pending in
/// the same transaction and returned so the agent can log what it abandoned.
/// The agent must not re-execute it; reassignment provides the retry.
pub(super) async fn sync<C: Clock>(
    State(ctx): State<Arc<AppCtx<C>>>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    let agent = parse_agent_id(&request.agent_id)?;

    let requeued = ctx.store.requeue_unfinished(&agent, ctx.clock.now())?;

    Ok(Json(SyncResponse {
        unfinished_command: requeued.as_ref().map(CommandView::from),
    }))
}

/// `POST /agent/heartbeat` — liveness signal; never fails hard.
pub(super) async fn heartbeat<C: Clock>(
    State(ctx): State<Arc<AppCtx<C>>>,
    Json(request): Json<HeartbeatRequest>,
) -> Json<HeartbeatResponse> {
    if let Ok(agent) = parse_agent_id(&request.agent_id) {
        let command = request.command_id.map(CommandId::new);
        if let Err(e) = ctx.store.touch_heartbeat(&agent, command, ctx.clock.now()) {
            warn!(agent_id = %agent, "failed to record heartbeat: {}", e);
        }
    }
    Json(HeartbeatResponse { acknowledged: true })
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
