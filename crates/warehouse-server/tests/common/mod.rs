//! Common test utilities for integration tests.
//!
//! A [`TestServer`] runs the real router on a local port. The orchestration
//! and authentication services are a single wiremock server mounted under
//! `/api/amaretti` and `/api/auth`; secondary content lives in a temp dir.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wiremock::MockServer;

use warehouse_client::{AmarettiClient, AuthClient, ServiceClient};
use warehouse_server::{
    AppState, JwtVerifier, LocalStorage, SecondaryContent, SecondaryStorage, Server, ServerConfig,
};
use warehouse_store::ProjectStore;
use warehouse_types::{EventPublisher, Project, PublishError};

pub const SECRET: &[u8] = b"integration-secret";
pub const SERVICE_JWT: &str = "warehouse-service-jwt";
pub const GA_GID: i64 = 1;

/// Publisher that hands every event to the test.
struct ChannelPublisher(mpsc::UnboundedSender<(String, Value)>);

#[async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, topic: &str, payload: &Value) -> Result<(), PublishError> {
        let _ = self.0.send((topic.to_string(), payload.clone()));
        Ok(())
    }
}

/// Local storage that counts how often it was opened.
pub struct CountingStorage {
    pub opens: AtomicUsize,
}

#[async_trait]
impl SecondaryStorage for CountingStorage {
    async fn open(&self, path: &Path) -> io::Result<SecondaryContent> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        LocalStorage.open(path).await
    }
}

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client for this server.
    pub client: Client,
    /// Stand-in for the orchestration and authentication services.
    pub upstream: MockServer,
    /// Secondary archive root.
    pub archive: TempDir,
    /// Published download events.
    pub events: mpsc::UnboundedReceiver<(String, Value)>,
    /// Storage handle, to assert on access.
    pub storage: Arc<CountingStorage>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server whose project store holds `projects`.
    pub async fn start(projects: Vec<Project>) -> Result<Self> {
        let upstream = MockServer::start().await;
        let archive = TempDir::new()?;
        let addr = find_available_port().await?;

        let store = ProjectStore::open_in_memory()?;
        for project in &projects {
            store.upsert(project)?;
        }

        let amaretti = ServiceClient::builder()
            .base_url(format!("{}/api/amaretti", upstream.uri()))
            .timeout(Duration::from_secs(5))
            .build()?;
        let auth = ServiceClient::builder()
            .base_url(format!("{}/api/auth", upstream.uri()))
            .timeout(Duration::from_secs(5))
            .build()?;

        let config = ServerConfig::new(archive.path(), GA_GID)
            .with_bind_address(addr)
            .with_request_logging(false);

        let (tx, events) = mpsc::unbounded_channel();
        let storage = Arc::new(CountingStorage {
            opens: AtomicUsize::new(0),
        });

        let state = AppState::new(
            config,
            AmarettiClient::new(amaretti),
            AuthClient::new(auth),
            JwtVerifier::from_secret(SECRET),
            SERVICE_JWT,
            Arc::new(store),
        )
        .with_publisher(Arc::new(ChannelPublisher(tx)))
        .with_storage(storage.clone());

        let server = Server::from_state(state);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            upstream,
            archive,
            events,
            storage,
            _handle: handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Unauthenticated GET.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// POST with a bearer token.
    pub fn post_as(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .bearer_auth(token)
    }

    /// Write `contents` to `relative` under the archive root.
    pub fn write_archive(&self, relative: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.archive.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Absolute archive root, as the server sees it.
    pub fn archive_root(&self) -> String {
        std::path::absolute(self.archive.path())
            .unwrap_or_else(|_| self.archive.path().to_path_buf())
            .to_string_lossy()
            .into_owned()
    }

    /// Next published event, or `None` after a short wait.
    pub async fn next_event(&mut self) -> Option<(String, Value)> {
        timeout(Duration::from_secs(2), self.events.recv())
            .await
            .ok()
            .flatten()
    }

    /// Number of storage opens so far.
    pub fn storage_opens(&self) -> usize {
        self.storage.opens.load(Ordering::SeqCst)
    }
}

/// Sign a caller token.
pub fn token(sub: &str, gids: &[i64]) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &json!({"sub": sub, "gids": gids}),
        &EncodingKey::from_secret(SECRET),
    )
    .expect("sign token")
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
