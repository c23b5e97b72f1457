// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delay executor: sleep for a requested number of milliseconds.

use super::{CommandExecutor, ExecutorError, Progress};
use async_trait::async_trait;
use relay_core::{CommandPayload, CommandResult};
use std::time::{Duration, Instant};

/// Sleep in chunks no longer than this, reporting progress between chunks
const MAX_CHUNK_MS: u64 = 1000;

pub struct DelayExecutor;

#[async_trait]
impl CommandExecutor for DelayExecutor {
    async fn execute(
        &self,
        payload: &CommandPayload,
        progress: Progress<'_>,
    ) -> Result<CommandResult, ExecutorError> {
        let CommandPayload::Delay { ms } = payload else {
            return Err(ExecutorError::Unsupported(payload.kind()));
        };

        let started = Instant::now();
        let mut remaining = *ms;

        while remaining > 0 {
            let chunk = remaining.min(MAX_CHUNK_MS);
            tokio::time::sleep(Duration::from_millis(chunk)).await;
            remaining -= chunk;
            progress(&format!("slept {}ms, {}ms remaining", chunk, remaining));
        }

        Ok(CommandResult::Delay {
            ok: true,
            took_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
#[path = "delay_tests.rs"]
mod tests;
