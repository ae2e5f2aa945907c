//! HTTP API for the warehouse secondary-output service.
//!
//! Three endpoints under `/secondary`:
//!
//! - `GET /list/{projectid}` flattens the archived outputs of a project's group
//! - `GET /{task_id}/{*path}` streams secondary content to the task's owner or group
//! - `POST /launchga` submits a group-analysis launcher on the caller's behalf
//!
//! # Example
//!
//! ```ignore
//! use warehouse_server::{AppState, Server};
//!
//! let state = AppState::new(config, amaretti, auth, verifier, service_jwt, projects);
//! Server::from_state(state).run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod middleware;
pub mod routes;
pub mod secondary;
pub mod state;
pub mod storage;

pub use auth::{AuthError, Caller, JwtVerifier, auth_middleware, download_auth_middleware};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use events::{HttpPublisher, LogPublisher, NoopPublisher, spawn_publish};
pub use secondary::{LaunchRequest, SecondaryOutput};
pub use state::AppState;
pub use storage::{DirEntry, LocalStorage, SecondaryContent, SecondaryStorage, SharedStorage};

use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// The warehouse HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let router = Router::new()
            .merge(routes::health_routes())
            .route("/api/openapi.json", get(routes::openapi_json))
            .nest("/secondary", self.secondary_routes())
            .layer(axum::middleware::from_fn_with_state(
                self.state.clone(),
                middleware::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size));

        let router = match cors_layer(&self.state.config.cors_origins) {
            Some(cors) => router.layer(cors),
            None => router,
        };

        router.with_state(self.state.clone())
    }

    /// Secondary routes. Listing is public; download and launch need a token.
    fn secondary_routes(&self) -> Router<AppState> {
        let download = Router::new()
            .route("/{task_id}", get(routes::download_handler))
            .route("/{task_id}/{*path}", get(routes::download_handler))
            .layer(axum::middleware::from_fn_with_state(
                self.state.clone(),
                auth::download_auth_middleware,
            ));

        let launch = Router::new()
            .route("/launchga", post(routes::launch_handler))
            .layer(axum::middleware::from_fn_with_state(
                self.state.clone(),
                auth::auth_middleware,
            ));

        Router::new()
            .route("/list/{projectid}", get(routes::list_handler))
            .merge(launch)
            .merge(download)
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

/// `None` disables CORS; `"*"` allows any origin.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any),
    )
}
