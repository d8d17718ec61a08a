//! Public tunnel to the local HTTP port
//!
//! Drives an ngrok agent through its local API. If no agent is listening, one is
//! spawned with `kill_on_drop` so it cannot outlive the process. Tunnels already
//! registered with the agent are disconnected before ours is opened, and again
//! on `close`.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};

use crate::config::TunnelConfig;

const LOCAL_API: &str = "http://127.0.0.1:4040";
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(250);
const STARTUP_ATTEMPTS: usize = 40;

#[derive(Debug, Deserialize)]
struct TunnelList {
    #[serde(default)]
    tunnels: Vec<TunnelInfo>,
}

#[derive(Debug, Deserialize)]
struct TunnelInfo {
    name: String,
    public_url: String,
}

#[derive(Debug, Serialize)]
struct StartTunnel<'a> {
    addr: String,
    proto: &'a str,
    name: &'a str,
}

/// An open ngrok tunnel; call `close` on shutdown
pub struct NgrokTunnel {
    client: Client,
    api_base: String,
    name: String,
    public_url: String,
    /// Present only when this process started the agent
    child: Option<Child>,
}

impl NgrokTunnel {
    /// Expose `port` publicly through the local ngrok agent
    pub async fn open(port: u16, config: &TunnelConfig) -> Result<Self> {
        Self::open_with_api(port, config, LOCAL_API).await
    }

    async fn open_with_api(port: u16, config: &TunnelConfig, api_base: &str) -> Result<Self> {
        let client = Client::new();
        let api_base = api_base.trim_end_matches('/').to_string();

        let child = if agent_running(&client, &api_base).await {
            tracing::info!("[Tunnel] Using ngrok agent already running at {}", api_base);
            None
        } else {
            Some(spawn_agent(&client, &api_base, config).await?)
        };

        let mut tunnel = Self {
            client,
            api_base,
            name: format!("assistant-{}", port),
            public_url: String::new(),
            child,
        };

        tunnel.disconnect_all().await?;
        tunnel.public_url = tunnel.connect(port).await?;

        tracing::info!("[Tunnel] {} -> localhost:{}", tunnel.public_url, port);
        Ok(tunnel)
    }

    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    /// Disconnect all tunnels and stop the agent if this process started it
    pub async fn close(mut self) -> Result<()> {
        tracing::info!("[Tunnel] Closing tunnels");
        let disconnected = self.disconnect_all().await;

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::warn!("[Tunnel] Failed to stop ngrok: {}", e);
            }
        }

        tracing::info!("[Tunnel] Tunnels closed");
        disconnected
    }

    async fn list(&self) -> Result<Vec<TunnelInfo>> {
        let list: TunnelList = self
            .client
            .get(format!("{}/api/tunnels", self.api_base))
            .send()
            .await
            .context("Failed to reach the ngrok API")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse ngrok tunnel list")?;
        Ok(list.tunnels)
    }

    async fn disconnect_all(&self) -> Result<()> {
        for tunnel in self.list().await? {
            tracing::info!("[Tunnel] Disconnecting {} ({})", tunnel.name, tunnel.public_url);
            self.client
                .delete(format!("{}/api/tunnels/{}", self.api_base, tunnel.name))
                .send()
                .await
                .with_context(|| format!("Failed to disconnect tunnel {}", tunnel.name))?
                .error_for_status()?;
        }
        Ok(())
    }

    async fn connect(&self, port: u16) -> Result<String> {
        let created: TunnelInfo = self
            .client
            .post(format!("{}/api/tunnels", self.api_base))
            .json(&StartTunnel {
                addr: port.to_string(),
                proto: "http",
                name: &self.name,
            })
            .send()
            .await
            .context("Failed to request a tunnel from ngrok")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse ngrok tunnel")?;
        Ok(created.public_url)
    }
}

async fn agent_running(client: &Client, api_base: &str) -> bool {
    client
        .get(format!("{}/api/tunnels", api_base))
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false)
}

async fn spawn_agent(client: &Client, api_base: &str, config: &TunnelConfig) -> Result<Child> {
    tracing::info!("[Tunnel] Starting {}", config.binary);

    let mut child = Command::new(&config.binary)
        .args(["start", "--none", "--log", "stdout"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to start {}", config.binary))?;

    for _ in 0..STARTUP_ATTEMPTS {
        if let Some(status) = child.try_wait()? {
            anyhow::bail!("{} exited during startup: {}", config.binary, status);
        }
        if agent_running(client, api_base).await {
            return Ok(child);
        }
        tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
    }

    anyhow::bail!(
        "{} did not expose its API at {} in time",
        config.binary,
        api_base
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{delete, get};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockAgent {
        tunnels: Vec<(String, String)>,
        deleted: Vec<String>,
    }

    type Shared = Arc<Mutex<MockAgent>>;

    async fn list(State(state): State<Shared>) -> Json<Value> {
        let state = state.lock().unwrap();
        let tunnels: Vec<Value> = state
            .tunnels
            .iter()
            .map(|(name, url)| json!({"name": name, "public_url": url}))
            .collect();
        Json(json!({ "tunnels": tunnels }))
    }

    async fn create(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        assert_eq!(body["proto"], "http");
        assert_eq!(body["addr"], "8080");
        let name = body["name"].as_str().unwrap().to_string();
        let url = "https://abc123.ngrok.app".to_string();
        state.lock().unwrap().tunnels.push((name.clone(), url.clone()));
        (
            StatusCode::CREATED,
            Json(json!({"name": name, "public_url": url})),
        )
    }

    async fn remove(State(state): State<Shared>, Path(name): Path<String>) -> StatusCode {
        let mut state = state.lock().unwrap();
        state.tunnels.retain(|(n, _)| n != &name);
        state.deleted.push(name);
        StatusCode::NO_CONTENT
    }

    async fn serve(state: Shared) -> String {
        let router = Router::new()
            .route("/api/tunnels", get(list).post(create))
            .route("/api/tunnels/{name}", delete(remove))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config() -> TunnelConfig {
        TunnelConfig {
            enabled: true,
            binary: "/nonexistent/ngrok".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_replaces_existing_tunnels() {
        let state: Shared = Arc::new(Mutex::new(MockAgent::default()));
        state
            .lock()
            .unwrap()
            .tunnels
            .push(("stale".into(), "https://old.ngrok.app".into()));
        let api = serve(state.clone()).await;

        let tunnel = NgrokTunnel::open_with_api(8080, &config(), &api).await.unwrap();
        assert_eq!(tunnel.public_url(), "https://abc123.ngrok.app");
        assert!(tunnel.child.is_none());

        {
            let state = state.lock().unwrap();
            assert_eq!(state.deleted, vec!["stale"]);
            assert_eq!(state.tunnels.len(), 1);
        }

        tunnel.close().await.unwrap();

        let state = state.lock().unwrap();
        assert!(state.tunnels.is_empty());
        assert_eq!(state.deleted, vec!["stale", "assistant-8080"]);
    }

    #[tokio::test]
    async fn test_open_fails_without_agent_or_binary() {
        let result = NgrokTunnel::open_with_api(8080, &config(), "http://127.0.0.1:1").await;
        let err = result.err().unwrap();
        assert!(err.to_string().contains("/nonexistent/ngrok"));
    }
}
