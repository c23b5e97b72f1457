// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the server's agent coordination API.
//!
//! All control-plane calls retry with exponential backoff (1s initial, ×2,
//! 3 attempts) on transport failures and server-side errors. Conflicts and
//! client-side rejections are surfaced immediately — retrying a 409 cannot
//! succeed. Heartbeats are fire-and-forget.

use async_trait::async_trait;
use relay_wire::{
    CommandView, ErrorBody, FetchRequest, FetchResponse, HeartbeatRequest, HeartbeatResponse,
    ReportRequest, ReportResponse, SyncRequest, SyncResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Timeout for control-plane calls (fetch/report/sync/heartbeat)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry schedule: 1s, then 2s, then give up
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_INITIAL: Duration = Duration::from_secs(1);

/// Errors from agent→server calls
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl ClientError {
    /// Transport failures and server-side errors are worth retrying;
    /// conflicts and client-side rejections are not.
    fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Conflict(_) => false,
            ClientError::Status { status, .. } => *status >= 500,
        }
    }
}

/// The server-side coordination surface the polling loop depends on.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Single-flight fetch: a fresh assignment or the already-owned command.
    async fn fetch_next(&self, agent_id: &str) -> Result<Option<CommandView>, ClientError>;

    /// Report a terminal outcome.
    async fn report(&self, request: &ReportRequest) -> Result<ReportResponse, ClientError>;

    /// Startup sync: the server requeues and returns any command still
    /// owned by this agent.
    async fn sync(&self, agent_id: &str) -> Result<Option<CommandView>, ClientError>;

    /// Fire-and-forget liveness signal.
    async fn heartbeat(&self, agent_id: &str, command_id: Option<&str>);
}

/// Reqwest-backed client for the agent API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("relay-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { http, base_url })
    }

    async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| status.to_string());

        if status == reqwest::StatusCode::CONFLICT {
            Err(ClientError::Conflict(message))
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn post_with_retry<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ClientError> {
        let mut delay = RETRY_INITIAL;

        for attempt in 1..=RETRY_ATTEMPTS {
            match self.post_json(path, body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < RETRY_ATTEMPTS => {
                    warn!(path, attempt, "request failed, retrying in {:?}: {}", delay, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("retry loop always returns")
    }
}

#[async_trait]
impl ControlPlane for ApiClient {
    async fn fetch_next(&self, agent_id: &str) -> Result<Option<CommandView>, ClientError> {
        let response: FetchResponse = self
            .post_with_retry(
                "/agent/fetch",
                &FetchRequest {
                    agent_id: agent_id.to_string(),
                },
            )
            .await?;
        Ok(response.command)
    }

    async fn report(&self, request: &ReportRequest) -> Result<ReportResponse, ClientError> {
        self.post_with_retry("/agent/result", request).await
    }

    async fn sync(&self, agent_id: &str) -> Result<Option<CommandView>, ClientError> {
        let response: SyncResponse = self
            .post_with_retry(
                "/agent/sync",
                &SyncRequest {
                    agent_id: agent_id.to_string(),
                },
            )
            .await?;
        Ok(response.unfinished_command)
    }

    async fn heartbeat(&self, agent_id: &str, command_id: Option<&str>) {
        let request = HeartbeatRequest {
            agent_id: agent_id.to_string(),
            command_id: command_id.map(str::to_string),
        };

        // Best-effort: a missed heartbeat only nudges stale reclamation
        let result: Result<HeartbeatResponse, ClientError> =
            self.post_json("/agent/heartbeat", &request).await;
        if let Err(e) = result {
            debug!("heartbeat failed: {}", e);
        }
    }
}
