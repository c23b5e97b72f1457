// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor contract and the built-in command kinds.
//!
//! One command executes at a time per agent. An `Err` from an executor
//! becomes a FAILED report; soft failures (non-200 responses, parse
//! errors, truncation) are ordinary results and flow back as COMPLETED.

mod delay;
mod http_get;

pub use delay::DelayExecutor;
pub use http_get::{HttpGetJsonExecutor, MAX_BODY_SIZE};

use async_trait::async_trait;
use relay_core::{CommandKind, CommandPayload, CommandResult};
use thiserror::Error;

/// Callback invoked as an executor makes observable progress.
pub type Progress<'a> = &'a (dyn Fn(&str) + Send + Sync);

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("unsupported command kind: {0}")]
    Unsupported(CommandKind),

    #[error("{0}")]
    Failed(String),
}

/// A runnable command kind.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(
        &self,
        payload: &CommandPayload,
        progress: Progress<'_>,
    ) -> Result<CommandResult, ExecutorError>;
}

/// The built-in executors, dispatched by payload kind.
pub struct ExecutorSet {
    delay: DelayExecutor,
    http_get: HttpGetJsonExecutor,
}

impl ExecutorSet {
    pub fn new() -> Result<Self, ExecutorError> {
        Ok(Self {
            delay: DelayExecutor,
            http_get: HttpGetJsonExecutor::new()?,
        })
    }

    pub async fn execute(
        &self,
        payload: &CommandPayload,
        progress: Progress<'_>,
    ) -> Result<CommandResult, ExecutorError> {
        match payload.kind() {
            CommandKind::Delay => self.delay.execute(payload, progress).await,
            CommandKind::HttpGetJson => self.http_get.execute(payload, progress).await,
        }
    }
}
