// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery: server restart, agent resync, stale reclamation.

use crate::prelude::*;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn server_restart_requeues_running_commands() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    let id = raw.submit_delay(10_000).await;
    raw.fetch_as("agent-a").await.unwrap();

    let (_, running) = raw.get(&format!("/commands/{id}")).await;
    assert_eq!(running["status"], "RUNNING");

    // Kill the server mid-execution and restart over the same store
    let dir = server.crash();
    let server = TestServer::start_with(dir, None).await;
    let raw = Raw::new(&server.base_url);

    let (_, body) = raw.get(&format!("/commands/{id}")).await;
    assert_eq!(body["status"], "PENDING");
    assert!(body["agentId"].is_null());
    assert!(body["startedAt"].is_null());

    // The old agent's report is now rejected
    let (status, _) = raw
        .post(
            "/agent/result",
            json!({
                "agentId": "agent-a",
                "commandId": id,
                "status": "COMPLETED",
                "result": {"kind": "DELAY", "ok": true, "took_ms": 10000}
            }),
        )
        .await;
    assert_eq!(status, 409);

    // On its next poll the same agent fetches the same command again
    let refetched = raw.fetch_as("agent-a").await.unwrap();
    assert_eq!(refetched["id"], id.as_str());
}

#[tokio::test]
async fn agent_resync_requeues_without_reexecution() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    let id = raw.submit_delay(30_000).await;

    // An agent fetched the command, then died mid-execution
    raw.fetch_as("agent-reborn").await.unwrap();

    // Its replacement (same persisted identity) syncs on startup
    let (status, body) = raw
        .post("/agent/sync", json!({"agentId": "agent-reborn"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["unfinishedCommand"]["id"], id.as_str());
    assert_eq!(body["unfinishedCommand"]["status"], "PENDING");

    // The command is back in the queue, not terminal, and unowned
    let (_, current) = raw.get(&format!("/commands/{id}")).await;
    assert_eq!(current["status"], "PENDING");
    assert!(current["agentId"].is_null());

    // A second sync has nothing to hand back
    let (_, body) = raw
        .post("/agent/sync", json!({"agentId": "agent-reborn"}))
        .await;
    assert!(body["unfinishedCommand"].is_null());

    // Reassignment provides the retry (possibly to the same agent)
    let refetched = raw.fetch_as("agent-reborn").await.unwrap();
    assert_eq!(refetched["id"], id.as_str());
}

#[tokio::test]
async fn frozen_agent_loses_its_command_to_stale_reclaim() {
    let server = TestServer::start_with_reclaimer(
        Duration::from_millis(300),
        Duration::from_millis(50),
    )
    .await;
    let raw = Raw::new(&server.base_url);

    let id = raw.submit_delay(30_000).await;

    // The agent fetches, then freezes: no heartbeats from here on
    raw.fetch_as("agent-frozen").await.unwrap();
    let (_, running) = raw.get(&format!("/commands/{id}")).await;
    assert_eq!(running["status"], "RUNNING");

    // Past the timeout, the next reclaimer tick requeues it
    raw.wait_for_status(&id, "PENDING", Duration::from_secs(3))
        .await;

    let (_, body) = raw.get(&format!("/commands/{id}")).await;
    assert!(body["agentId"].is_null());
    assert!(body["startedAt"].is_null());
}

#[tokio::test]
async fn heartbeats_keep_a_slow_command_alive() {
    let server = TestServer::start_with_reclaimer(
        Duration::from_millis(400),
        Duration::from_millis(50),
    )
    .await;
    let raw = Raw::new(&server.base_url);

    let id = raw.submit_delay(30_000).await;
    raw.fetch_as("agent-steady").await.unwrap();

    // Heartbeat faster than the timeout for a full second
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let (status, _) = raw
            .post(
                "/agent/heartbeat",
                json!({"agentId": "agent-steady", "commandId": id}),
            )
            .await;
        assert_eq!(status, 200);
    }

    let (_, body) = raw.get(&format!("/commands/{id}")).await;
    assert_eq!(body["status"], "RUNNING");
    assert_eq!(body["agentId"], "agent-steady");
}

#[tokio::test]
async fn state_survives_restart_bit_for_bit() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    let id = raw.submit_delay(100).await;
    raw.fetch_as("agent-a").await.unwrap();
    raw.post(
        "/agent/result",
        json!({
            "agentId": "agent-a",
            "commandId": id,
            "status": "COMPLETED",
            "result": {"kind": "DELAY", "ok": true, "took_ms": 104}
        }),
    )
    .await;

    let (_, before) = raw.get(&format!("/commands/{id}")).await;

    let dir = server.crash();
    let server = TestServer::start_with(dir, None).await;
    let raw = Raw::new(&server.base_url);

    // Terminal commands are untouched by restart recovery
    let (_, after) = raw.get(&format!("/commands/{id}")).await;
    assert_eq!(after, before);
}
