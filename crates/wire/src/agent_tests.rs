// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::{Command, CommandId, CommandPayload};

#[test]
fn fetch_round_trip_uses_camel_case() {
    let req = FetchRequest {
        agent_id: "agent-a".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&req).unwrap(),
        serde_json::json!({"agentId": "agent-a"})
    );

    let resp: FetchResponse = serde_json::from_str(r#"{"command": null}"#).unwrap();
    assert!(resp.command.is_none());
}

#[test]
fn fetch_response_carries_a_command_view() {
    let cmd = Command::new(
        CommandId::new("c-1"),
        CommandPayload::Delay { ms: 100 },
        chrono::Utc::now(),
    );
    let resp = FetchResponse {
        command: Some(CommandView::from(&cmd)),
    };

    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["command"]["id"], "c-1");
    assert_eq!(json["command"]["status"], "PENDING");
}

#[test]
fn report_status_wire_spelling() {
    assert_eq!(
        serde_json::to_string(&ReportStatus::Completed).unwrap(),
        "\"COMPLETED\""
    );
    assert_eq!(
        serde_json::to_string(&ReportStatus::Failed).unwrap(),
        "\"FAILED\""
    );
    assert_eq!(
        CommandStatus::from(ReportStatus::Failed),
        CommandStatus::Failed
    );
}

#[test]
fn report_request_round_trips_with_optional_fields_elided() {
    let req = ReportRequest {
        agent_id: "agent-a".to_string(),
        command_id: "c-1".to_string(),
        status: ReportStatus::Completed,
        result: Some(CommandResult::Delay {
            ok: true,
            took_ms: 512,
        }),
        error: None,
    };

    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["agentId"], "agent-a");
    assert_eq!(json["commandId"], "c-1");
    assert_eq!(json["status"], "COMPLETED");
    assert!(json.get("error").is_none());

    let back: ReportRequest = serde_json::from_value(json).unwrap();
    assert_eq!(back, req);
}

#[test]
fn sync_response_key_is_unfinished_command() {
    let resp = SyncResponse {
        unfinished_command: None,
    };
    assert_eq!(
        serde_json::to_value(&resp).unwrap(),
        serde_json::json!({"unfinishedCommand": null})
    );
}

#[test]
fn heartbeat_command_id_is_optional() {
    let idle: HeartbeatRequest = serde_json::from_str(r#"{"agentId": "agent-a"}"#).unwrap();
    assert!(idle.command_id.is_none());

    let busy: HeartbeatRequest =
        serde_json::from_str(r#"{"agentId": "agent-a", "commandId": "c-1"}"#).unwrap();
    assert_eq!(busy.command_id.as_deref(), Some("c-1"));

    let resp = HeartbeatResponse { acknowledged: true };
    assert_eq!(
        serde_json::to_value(&resp).unwrap(),
        serde_json::json!({"acknowledged": true})
    );
}
