// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP GET executor.
//!
//! The HTTP call is the command's purpose, so a non-200 response, a parse
//! failure, or a truncated body are all valid outcomes reported as
//! COMPLETED. Only the agent itself failing (never the target) produces a
//! FAILED report, and transport errors are not that either — they complete
//! with `status: 0` and the error message.

use super::{CommandExecutor, ExecutorError, Progress};
use async_trait::async_trait;
use relay_core::{CommandPayload, CommandResult};
use std::time::Duration;

/// Bodies beyond this are truncated to the prefix (10 KiB)
pub const MAX_BODY_SIZE: usize = 10 * 1024;

/// Overall deadline for the GET (connect + body)
const HTTP_DEADLINE: Duration = Duration::from_secs(30);

pub struct HttpGetJsonExecutor {
    http: reqwest::Client,
}

impl HttpGetJsonExecutor {
    pub fn new() -> Result<Self, ExecutorError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_DEADLINE)
            .user_agent(concat!(
                "relay-agent/",
                env!("CARGO_PKG_VERSION"),
                " (+https://github.com/alfredjean/relay)"
            ))
            .build()
            .map_err(|e| ExecutorError::Failed(format!("failed to build http client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl CommandExecutor for HttpGetJsonExecutor {
    async fn execute(
        &self,
        payload: &CommandPayload,
        progress: Progress<'_>,
    ) -> Result<CommandResult, ExecutorError> {
        let CommandPayload::HttpGetJson { url } = payload else {
            return Err(ExecutorError::Unsupported(payload.kind()));
        };

        let response = match self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(transport_failure(e)),
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Ok(transport_failure(e)),
        };

        let bytes_returned = bytes.len() as u64;
        let truncated = bytes.len() > MAX_BODY_SIZE;
        let prefix = &bytes[..bytes.len().min(MAX_BODY_SIZE)];
        let text = String::from_utf8_lossy(prefix).into_owned();

        // Parse when the target claims JSON; a truncated prefix usually
        // fails to parse and falls back to marked text
        let body = if content_type.contains("application/json") {
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => Some(value),
                Err(_) => Some(serde_json::Value::String(marked_text(text, truncated))),
            }
        } else {
            Some(serde_json::Value::String(marked_text(text, truncated)))
        };

        progress(&format!("GET {url} -> {status} ({bytes_returned} bytes)"));

        Ok(CommandResult::HttpGetJson {
            status,
            body,
            truncated,
            bytes_returned,
            error: None,
        })
    }
}

fn marked_text(text: String, truncated: bool) -> String {
    if truncated {
        format!("{text}... [truncated]")
    } else {
        text
    }
}

fn transport_failure(e: reqwest::Error) -> CommandResult {
    CommandResult::HttpGetJson {
        status: 0,
        body: None,
        truncated: false,
        bytes_returned: 0,
        error: Some(e.to_string()),
    }
}

#[cfg(test)]
#[path = "http_get_tests.rs"]
mod tests;
