// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{Clock, FakeClock};

#[test]
fn events_tag_with_domain_prefixed_type() {
    let clock = FakeClock::new();
    let event = Event::CommandSubmitted {
        id: CommandId::new("c-1"),
        payload: CommandPayload::Delay { ms: 250 },
        at: clock.now(),
    };

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "command:submitted");
    assert_eq!(json["payload"]["type"], "DELAY");
}

#[test]
fn events_round_trip() {
    let clock = FakeClock::new();
    let events = vec![
        Event::CommandSubmitted {
            id: CommandId::new("c-1"),
            payload: CommandPayload::HttpGetJson {
                url: "https://example.com".into(),
            },
            at: clock.now(),
        },
        Event::CommandAssigned {
            id: CommandId::new("c-1"),
            agent: AgentId::new("agent-a"),
            at: clock.now(),
        },
        Event::CommandFinished {
            id: CommandId::new("c-1"),
            agent: AgentId::new("agent-a"),
            status: CommandStatus::Failed,
            result: Some(CommandResult::Failure {
                error: "boom".into(),
            }),
            at: clock.now(),
        },
        Event::CommandRequeued {
            id: CommandId::new("c-1"),
            reason: RequeueReason::StaleOwner,
            at: clock.now(),
        },
        Event::HeartbeatRecorded {
            agent: AgentId::new("agent-a"),
            command: None,
            at: clock.now(),
        },
    ];

    for event in events {
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}

#[test]
fn command_id_accessor_covers_all_variants() {
    let clock = FakeClock::new();
    let assigned = Event::CommandAssigned {
        id: CommandId::new("c-9"),
        agent: AgentId::new("agent-a"),
        at: clock.now(),
    };
    assert_eq!(assigned.command_id().map(CommandId::as_str), Some("c-9"));

    let idle_heartbeat = Event::HeartbeatRecorded {
        agent: AgentId::new("agent-a"),
        command: None,
        at: clock.now(),
    };
    assert!(idle_heartbeat.command_id().is_none());
}

#[test]
fn requeue_reason_wire_spelling() {
    let json = serde_json::to_string(&RequeueReason::AgentResync).unwrap();
    assert_eq!(json, "\"agent_resync\"");
    assert_eq!(RequeueReason::ServerRestart.to_string(), "server_restart");
}
