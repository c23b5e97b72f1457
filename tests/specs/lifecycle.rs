// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end execution: a real agent working a real server.

use crate::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn delay_command_completes_end_to_end() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);
    let agent_dir = TempDir::new().unwrap();

    let id = raw.submit_delay(500).await;
    let (agent_id, agent_task) = spawn_agent(&server.base_url, agent_dir.path(), None);

    let body = raw
        .wait_for_status(&id, "COMPLETED", Duration::from_secs(5))
        .await;

    assert_eq!(body["result"]["ok"], true);
    assert!(body["result"]["took_ms"].as_u64().unwrap() >= 500);
    assert_eq!(body["agentId"], agent_id.as_str());
    assert!(body["startedAt"].is_string());
    assert!(body["completedAt"].is_string());

    agent_task.abort();
}

#[tokio::test]
async fn commands_execute_in_submission_order() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);
    let agent_dir = TempDir::new().unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(raw.submit_delay(100).await);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let (_, agent_task) = spawn_agent(&server.base_url, agent_dir.path(), None);

    let mut started_at = Vec::new();
    for id in &ids {
        let body = raw
            .wait_for_status(id, "COMPLETED", Duration::from_secs(5))
            .await;
        started_at.push(body["startedAt"].as_str().unwrap().to_string());
    }

    // FIFO: each command started strictly after the one submitted before it
    assert!(started_at[0] < started_at[1], "{started_at:?}");
    assert!(started_at[1] < started_at[2], "{started_at:?}");

    agent_task.abort();
}

#[tokio::test]
async fn oversized_http_body_truncates() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);
    let agent_dir = TempDir::new().unwrap();

    // 20 KiB JSON document; the 10 KiB prefix cannot parse
    let filler = "a".repeat(20 * 1024 - 12);
    let target = stub_http_target(
        "application/json",
        format!("{{\"data\": \"{filler}\"}}").into_bytes(),
    );

    let (status, body) = raw
        .post(
            "/commands",
            serde_json::json!({"type": "HTTP_GET_JSON", "payload": {"url": target}}),
        )
        .await;
    assert_eq!(status, 201);
    let id = body["commandId"].as_str().unwrap().to_string();

    let (_, agent_task) = spawn_agent(&server.base_url, agent_dir.path(), None);

    let body = raw
        .wait_for_status(&id, "COMPLETED", Duration::from_secs(5))
        .await;

    assert_eq!(body["result"]["status"], 200);
    assert_eq!(body["result"]["truncated"], true);
    assert_eq!(body["result"]["bytes_returned"], 20 * 1024);
    let text = body["result"]["body"].as_str().unwrap();
    assert!(text.ends_with("... [truncated]"));

    agent_task.abort();
}
