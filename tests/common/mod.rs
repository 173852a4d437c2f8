//! Shared utilities for integration testing: mock meta and config servers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use apollo_sync::{ClientConfig, EventSink, SyncEvent};

/// A request as seen by a mock server.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    /// Path including the query string.
    pub path: String,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
}

impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Programmable HTTP server on an ephemeral port.
pub struct MockServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<MockRequest>>>,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Start a server answering every request with `handler`'s `(status, body)`.
    pub async fn start<F, Fut>(handler: F) -> Self
    where
        F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = (u16, String)> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let recorded = requests.clone();
        let task = tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let handler = handler.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    recorded.lock().unwrap().push(request.clone());

                    let (status, body) = handler(request).await;
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason(status),
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    /// Start a server whose response can be changed while it runs.
    pub async fn scripted(status: u16, body: impl Into<String>) -> (Self, Script) {
        let script = Script {
            response: Arc::new(Mutex::new((status, body.into()))),
        };
        let current = script.response.clone();
        let server = Self::start(move |_| {
            let response = current.lock().unwrap().clone();
            async move { response }
        })
        .await;
        (server, script)
    }

    /// `http://127.0.0.1:{port}`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Homepage URL as a meta server would report it.
    pub fn homepage(&self) -> String {
        format!("{}/", self.url())
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Handle changing a scripted server's response.
#[derive(Clone)]
pub struct Script {
    response: Arc<Mutex<(u16, String)>>,
}

impl Script {
    pub fn set(&self, status: u16, body: impl Into<String>) {
        *self.response.lock().unwrap() = (status, body.into());
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    Some(MockRequest {
        method,
        path,
        headers,
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        304 => "Not Modified",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Meta server listing `homepages` in order.
pub async fn meta_server(homepages: Vec<String>) -> MockServer {
    let body = services_body(&homepages);
    MockServer::start(move |_| {
        let body = body.clone();
        async move { (200, body) }
    })
    .await
}

pub fn services_body(homepages: &[String]) -> String {
    let services: Vec<_> = homepages
        .iter()
        .enumerate()
        .map(|(i, url)| {
            serde_json::json!({
                "appName": "APOLLO-CONFIGSERVICE",
                "instanceId": format!("config-{}", i),
                "homepageUrl": url,
            })
        })
        .collect();
    serde_json::Value::Array(services).to_string()
}

/// Config server success body.
pub fn config_body(entries: &[(&str, &str)], release_key: &str) -> String {
    let configurations: HashMap<&str, &str> = entries.iter().copied().collect();
    serde_json::json!({
        "appId": "demo",
        "cluster": "default",
        "namespaceName": "application",
        "configurations": configurations,
        "releaseKey": release_key,
    })
    .to_string()
}

/// An address nothing listens on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Client configuration suited to local mock servers.
pub fn test_config(meta_url: &str, cache_dir: &Path) -> ClientConfig {
    ClientConfig::new(meta_url, "demo")
        .with_ip("10.0.0.5")
        .with_timeout_secs(2)
        .with_cycle_time_secs(3600)
        .with_cache_directory(cache_dir)
        .with_system_proxy(false)
}

/// Sink keeping every event for assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, predicate: impl Fn(&SyncEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(predicate)
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &SyncEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
