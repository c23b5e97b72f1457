// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client API handlers: submission, queries, health.

use super::error::ApiError;
use super::AppCtx;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use relay_core::{Clock, CommandId, CommandPayload, IdGen, UuidIdGen};
use relay_wire::{
    CommandView, HealthResponse, ListCommandsResponse, SubmitCommandRequest, SubmitCommandResponse,
};
use std::sync::Arc;
use tracing::info;

/// `POST /commands`
pub(super) async fn submit_command<C: Clock>(
    State(ctx): State<Arc<AppCtx<C>>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitCommandResponse>), ApiError> {
    let Json(body) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

    let request: SubmitCommandRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::Validation(format!("invalid submission: {e}")))?;
    validate_payload(&request.command)?;

    let id = CommandId::new(UuidIdGen.next());
    let cmd = ctx
        .store
        .insert_command(id, request.command, ctx.clock.now())?;

    info!(command_id = %cmd.id, kind = %cmd.kind, "command submitted");

    Ok((
        StatusCode::CREATED,
        Json(SubmitCommandResponse {
            command_id: cmd.id.as_str().to_string(),
        }),
    ))
}

/// Reject submissions the executors could never run.
fn validate_payload(payload: &CommandPayload) -> Result<(), ApiError> {
    match payload {
        CommandPayload::Delay { ms } => {
            if *ms == 0 {
                return Err(ApiError::Validation(
                    "ms must be a positive integer".to_string(),
                ));
            }
        }
        CommandPayload::HttpGetJson { url } => {
            let parsed = url::Url::parse(url)
                .map_err(|e| ApiError::Validation(format!("invalid url: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ApiError::Validation(format!(
                    "unsupported url scheme: {}",
                    parsed.scheme()
                )));
            }
        }
    }
    Ok(())
}

/// `GET /commands/{id}`
pub(super) async fn get_command<C: Clock>(
    State(ctx): State<Arc<AppCtx<C>>>,
    Path(id): Path<String>,
) -> Result<Json<CommandView>, ApiError> {
    let cmd = ctx
        .store
        .get_command(&id)
        .ok_or_else(|| ApiError::NotFound(format!("unknown command: {id}")))?;
    Ok(Json(CommandView::from(&cmd)))
}

/// `GET /commands`
pub(super) async fn list_commands<C: Clock>(
    State(ctx): State<Arc<AppCtx<C>>>,
) -> Json<ListCommandsResponse> {
    let commands = ctx
        .store
        .list_commands()
        .iter()
        .map(CommandView::from)
        .collect();
    Json(ListCommandsResponse { commands })
}

/// `GET /health`
pub(super) async fn health<C: Clock>(State(ctx): State<Arc<AppCtx<C>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: ctx.clock.now(),
    })
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
