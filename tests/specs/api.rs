// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client API surface: validation, queries, health.

use crate::prelude::*;
use serde_json::json;

#[tokio::test]
async fn health_reports_ok() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    let (status, body) = raw.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_command_is_404_with_error_body() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    let (status, body) = raw.get("/commands/no-such-id").await;
    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("no-such-id"));
}

#[tokio::test]
async fn invalid_submissions_are_400_with_error_body() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    for body in [
        json!({"type": "SHELL", "payload": {"cmd": "true"}}),
        json!({"type": "DELAY", "payload": {"ms": 0}}),
        json!({"type": "DELAY", "payload": {}}),
        json!({"type": "HTTP_GET_JSON", "payload": {"url": "not a url"}}),
        json!({"type": "HTTP_GET_JSON", "payload": {"url": "ftp://example.com"}}),
    ] {
        let (status, response) = raw.post("/commands", body.clone()).await;
        assert_eq!(status, 400, "accepted invalid body: {body}");
        assert!(response["error"].is_string());
    }

    let (_, listed) = raw.get("/commands").await;
    assert_eq!(listed["commands"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn submitted_commands_list_in_creation_order() {
    let server = TestServer::start().await;
    let raw = Raw::new(&server.base_url);

    let mut ids = Vec::new();
    for ms in [100, 200, 300] {
        ids.push(raw.submit_delay(ms).await);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let (status, body) = raw.get("/commands").await;
    assert_eq!(status, 200);
    let listed: Vec<&str> = body["commands"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(listed, ids.iter().map(String::as_str).collect::<Vec<_>>());

    // Fresh submissions are PENDING and unowned
    for command in body["commands"].as_array().unwrap() {
        assert_eq!(command["status"], "PENDING");
        assert!(command["agentId"].is_null());
    }
}
