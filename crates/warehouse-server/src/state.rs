//! Application state shared across handlers.

use std::sync::Arc;

use warehouse_client::{AmarettiClient, AuthClient};
use warehouse_store::ProjectRepository;
use warehouse_types::SharedEventPublisher;

use crate::auth::JwtVerifier;
use crate::config::ServerConfig;
use crate::events::LogPublisher;
use crate::storage::{LocalStorage, SharedStorage};

/// Application state shared across all handlers.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Orchestration service client.
    pub amaretti: AmarettiClient,

    /// Authentication service client.
    pub auth: AuthClient,

    /// Caller token verifier.
    pub verifier: Arc<JwtVerifier>,

    /// This service's own credential for privileged upstream calls.
    pub service_jwt: Arc<str>,

    /// Project lookups.
    pub projects: Arc<dyn ProjectRepository>,

    /// Download event sink.
    pub publisher: SharedEventPublisher,

    /// Secondary content backend.
    pub storage: SharedStorage,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Events go to the log and content is read from the local filesystem
    /// until replaced with [`with_publisher`](Self::with_publisher) or
    /// [`with_storage`](Self::with_storage).
    pub fn new(
        config: ServerConfig,
        amaretti: AmarettiClient,
        auth: AuthClient,
        verifier: JwtVerifier,
        service_jwt: impl Into<Arc<str>>,
        projects: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            amaretti,
            auth,
            verifier: Arc::new(verifier),
            service_jwt: service_jwt.into(),
            projects,
            publisher: Arc::new(LogPublisher),
            storage: Arc::new(LocalStorage),
        }
    }

    /// Replace the event publisher.
    pub fn with_publisher(mut self, publisher: SharedEventPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    /// Replace the storage backend.
    pub fn with_storage(mut self, storage: SharedStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Get a reference to the server config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
