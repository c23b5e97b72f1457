// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the behavioral tests.

use relay_agent::{ApiClient, ExecutorSet};
use relay_core::{AgentId, SystemClock};
use relay_server::{lifecycle, reclaim, routes};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// An in-process server over a real TCP port.
pub struct TestServer {
    pub base_url: String,
    state: Option<relay_server::ServerState>,
    serve_task: JoinHandle<()>,
    // NOTE(lifetime): Keeps the store directory alive across restarts
    pub dir: Arc<TempDir>,
}

impl TestServer {
    /// Start a server over a fresh store directory.
    pub async fn start() -> Self {
        Self::start_with(Arc::new(TempDir::new().unwrap()), None).await
    }

    /// Start a server with a stale reclaimer (timeout, check interval).
    pub async fn start_with_reclaimer(timeout: Duration, interval: Duration) -> Self {
        Self::start_with(Arc::new(TempDir::new().unwrap()), Some((timeout, interval))).await
    }

    /// Start (or restart) a server over an existing store directory.
    pub async fn start_with(dir: Arc<TempDir>, reclaimer: Option<(Duration, Duration)>) -> Self {
        let data_dir = dir.path().to_path_buf();
        let config = lifecycle::Config {
            port: 0,
            wal_path: data_dir.join("commands.wal"),
            snapshot_path: data_dir.join("commands.snapshot"),
            lock_path: data_dir.join("relayd.lock"),
            command_timeout: reclaimer.map(|(t, _)| t).unwrap_or(Duration::from_secs(60)),
            stale_check_interval: reclaimer
                .map(|(_, i)| i)
                .unwrap_or(Duration::from_secs(10)),
            data_dir,
        };

        let clock = SystemClock;
        let lifecycle::StartupResult { server, listener } =
            lifecycle::startup(config, &clock).await.unwrap();

        if let Some((timeout, interval)) = reclaimer {
            reclaim::spawn_reclaimer(server.store.clone(), clock.clone(), timeout, interval);
        }

        let addr = listener.local_addr().unwrap();
        let ctx = Arc::new(routes::AppCtx {
            store: server.store.clone(),
            clock,
        });

        let serve_task = tokio::spawn(async move {
            axum::serve(listener, routes::router(ctx)).await.unwrap();
        });

        TestServer {
            base_url: format!("http://{addr}"),
            state: Some(server),
            serve_task,
            dir,
        }
    }

    /// Kill the server without any graceful teardown, releasing the store
    /// lock so a restart over the same directory can proceed.
    pub fn crash(mut self) -> Arc<TempDir> {
        self.serve_task.abort();
        self.state.take();
        Arc::clone(&self.dir)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.serve_task.abort();
    }
}

/// Run a real agent loop against the server, in-process.
///
/// The identity persists under `data_dir`, so restarting an agent over the
/// same directory keeps its id. Returns the agent id and the loop task.
pub fn spawn_agent(
    base_url: &str,
    data_dir: &std::path::Path,
    kill_after: Option<u64>,
) -> (AgentId, JoinHandle<()>) {
    let agent_id = relay_agent::identity::load_or_create(data_dir).unwrap();
    let client = ApiClient::new(base_url).unwrap();
    let config = relay_agent::AgentConfig {
        poll_interval: Duration::from_millis(20),
        kill_after,
        random_failures: false,
    };

    let id = agent_id.clone();
    let task = tokio::spawn(async move {
        let mut agent =
            relay_agent::AgentLoop::new(client, id, ExecutorSet::new().unwrap(), config);
        agent.sync().await.unwrap();
        agent.run().await;
    });

    (agent_id, task)
}

/// Raw HTTP helpers standing in for clients and (crashed) agents.
pub struct Raw {
    http: reqwest::Client,
    base_url: String,
}

impl Raw {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (u16, serde_json::Value) {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    /// Submit a DELAY command, returning its id.
    pub async fn submit_delay(&self, ms: u64) -> String {
        let (status, body) = self
            .post(
                "/commands",
                serde_json::json!({"type": "DELAY", "payload": {"ms": ms}}),
            )
            .await;
        assert_eq!(status, 201, "submit failed: {body}");
        body["commandId"].as_str().unwrap().to_string()
    }

    /// Fetch as the given agent, returning the assigned command (if any).
    pub async fn fetch_as(&self, agent_id: &str) -> Option<serde_json::Value> {
        let (status, body) = self
            .post("/agent/fetch", serde_json::json!({"agentId": agent_id}))
            .await;
        assert_eq!(status, 200, "fetch failed: {body}");
        (!body["command"].is_null()).then(|| body["command"].clone())
    }

    /// Poll `GET /commands/{id}` until it reaches `status` or the deadline.
    pub async fn wait_for_status(
        &self,
        command_id: &str,
        status: &str,
        deadline: Duration,
    ) -> serde_json::Value {
        let started = std::time::Instant::now();
        loop {
            let (code, body) = self.get(&format!("/commands/{command_id}")).await;
            if code == 200 && body["status"] == status {
                return body;
            }
            assert!(
                started.elapsed() < deadline,
                "command {command_id} never reached {status}; last: {body}"
            );
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

/// Serve one canned HTTP response on an ephemeral port (target for the
/// HTTP_GET_JSON executor). Returns the URL.
pub fn stub_http_target(content_type: &str, body: Vec<u8>) -> String {
    use std::io::{Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = vec![0u8; 4096];
        let mut read = 0;
        loop {
            let n = stream.read(&mut buf[read..]).unwrap();
            read += n;
            if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        stream.write_all(head.as_bytes()).unwrap();
        stream.write_all(&body).unwrap();
    });

    format!("http://{addr}/feed")
}
