// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: router construction and request handlers.
//!
//! Handlers validate and translate; every state transition happens inside a
//! `CommandStore` transaction, so concurrent requests need no coordination
//! here.

mod agent;
mod client;
mod error;

pub use error::ApiError;

use axum::routing::{get, post};
use axum::Router;
use relay_core::Clock;
use relay_storage::CommandStore;
use std::sync::Arc;

/// Shared handler context.
pub struct AppCtx<C: Clock> {
    pub store: CommandStore,
    pub clock: C,
}

/// Build the full router: client API plus agent coordination API.
pub fn router<C: Clock + 'static>(ctx: Arc<AppCtx<C>>) -> Router {
    Router::new()
        .route("/commands", post(client::submit_command).get(client::list_commands))
        .route("/commands/{id}", get(client::get_command))
        .route("/health", get(client::health))
        .route("/agent/fetch", post(agent::fetch))
        .route("/agent/result", post(agent::report_result))
        .route("/agent/sync", post(agent::sync))
        .route("/agent/heartbeat", post(agent::heartbeat))
        .with_state(ctx)
}
