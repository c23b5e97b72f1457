// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duplicate-request safety: double fetch, replayed result reports.

use crate::prelude::*;
use serde_json::json;

#[tokio::test]
async fn double_fetch_returns_the_same_assignment() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    let id = raw.submit_delay(10_000).await;
    raw.submit_delay(10_000).await;

    let first = raw.fetch_as("agent-a").await.unwrap();
    assert_eq!(first["id"], id.as_str());

    // The same agent fetching again gets the same command, not the second one
    let retry = raw.fetch_as("agent-a").await.unwrap();
    assert_eq!(retry["id"], id.as_str());
    assert_eq!(retry["startedAt"], first["startedAt"]);
}

#[tokio::test]
async fn replayed_result_report_is_acknowledged_without_mutation() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    let id = raw.submit_delay(100).await;
    raw.fetch_as("agent-a").await.unwrap();

    let report = json!({
        "agentId": "agent-a",
        "commandId": id,
        "status": "COMPLETED",
        "result": {"kind": "DELAY", "ok": true, "took_ms": 104}
    });

    let (status, body) = raw.post("/agent/result", report.clone()).await;
    assert_eq!(status, 200);
    assert_eq!(body["acknowledged"], true);

    let (_, before) = raw.get(&format!("/commands/{id}")).await;

    // Resend the exact same body (the report crossed a retry)
    let (status, body) = raw.post("/agent/result", report).await;
    assert_eq!(status, 200);
    assert_eq!(body["acknowledged"], true);
    assert!(body["message"].is_string());

    let (_, after) = raw.get(&format!("/commands/{id}")).await;
    assert_eq!(after["completedAt"], before["completedAt"]);
    assert_eq!(after, before);
}

#[tokio::test]
async fn report_from_non_owner_conflicts() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    let id = raw.submit_delay(10_000).await;
    raw.fetch_as("agent-a").await.unwrap();

    let (status, body) = raw
        .post(
            "/agent/result",
            json!({
                "agentId": "agent-b",
                "commandId": id,
                "status": "COMPLETED",
                "result": {"kind": "DELAY", "ok": true, "took_ms": 1}
            }),
        )
        .await;

    assert_eq!(status, 409);
    assert!(body["error"].is_string());

    let (_, current) = raw.get(&format!("/commands/{id}")).await;
    assert_eq!(current["status"], "RUNNING");
    assert_eq!(current["agentId"], "agent-a");
}
