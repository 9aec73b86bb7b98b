use std::fmt;

use poll_promise::Promise;
use serde::Deserialize;

pub const HEALTH_PATH: &str = "/md-to-docx/health";

#[derive(Deserialize, Debug, Clone)]
struct HealthResponse {
    status: String,
}

/// Reachability of the conversion server, as last probed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServerHealth {
    #[default]
    Unknown,
    Checking,
    Online,
    Offline(String),
}

impl fmt::Display for ServerHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerHealth::Unknown => write!(f, "unknown"),
            ServerHealth::Checking => write!(f, "checking..."),
            ServerHealth::Online => write!(f, "online"),
            ServerHealth::Offline(reason) => write!(f, "offline ({})", reason),
        }
    }
}

pub fn health_endpoint(server_url: &str) -> String {
    format!("{}{}", server_url.trim_end_matches('/'), HEALTH_PATH)
}

/// Interprets a health-check answer: a 2xx with `{"status": "ok"}`.
pub fn parse_health(ok: bool, status: u16, body: &[u8]) -> ServerHealth {
    if !ok {
        return ServerHealth::Offline(format!("status {}", status));
    }
    match serde_json::from_slice::<HealthResponse>(body) {
        Ok(response) if response.status == "ok" => ServerHealth::Online,
        Ok(response) => ServerHealth::Offline(format!("reported {:?}", response.status)),
        Err(e) => {
            log::warn!("Unexpected health response: {}", e);
            ServerHealth::Offline("unexpected response".to_owned())
        }
    }
}

/// Sends `GET {server_url}/md-to-docx/health` in the background.
pub fn probe(server_url: &str) -> Promise<ServerHealth> {
    let request = ehttp::Request::get(health_endpoint(server_url));
    log::info!("Probing server health at {}", request.url);

    #[cfg(not(target_arch = "wasm32"))]
    {
        Promise::spawn_thread("ehttp_health_probe", move || {
            futures::executor::block_on(fetch_health(request))
        })
    }
    #[cfg(target_arch = "wasm32")]
    {
        Promise::spawn_local(fetch_health(request))
    }
}

async fn fetch_health(request: ehttp::Request) -> ServerHealth {
    match ehttp::fetch_async(request).await {
        Ok(response) => parse_health(response.ok, response.status, &response.bytes),
        Err(e) => {
            log::warn!("Health probe failed: {}", e);
            ServerHealth::Offline(e)
        }
    }
}
