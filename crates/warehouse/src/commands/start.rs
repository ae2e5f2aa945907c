//! Start command - runs the warehouse server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;

use warehouse_client::{AmarettiClient, AuthClient, ServiceClient};
use warehouse_config::{EventSink, WarehouseConfig};
use warehouse_server::{
    AppState, HttpPublisher, JwtVerifier, LogPublisher, NoopPublisher, Server, ServerConfig,
};
use warehouse_store::ProjectStore;
use warehouse_types::SharedEventPublisher;

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let config = &ctx.loaded.config;

    if ctx.verbose {
        for path in ctx.loaded.loaded_from() {
            eprintln!("config: {}", path.display());
        }
    }

    config.validate()?;

    let server_section = config.server();
    let bind = args.bind.unwrap_or(server_section.bind);
    let bind_address: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {}", bind))?;

    // ── Credentials ─────────────────────────────────────────────────────

    let verifier = build_verifier(config)?;
    let auth_section = config.auth.clone().unwrap_or_default();
    let service_jwt = warehouse_config::resolve_service_jwt(&auth_section)?;
    tracing::info!(source = %service_jwt.source, "Resolved service credential");

    // ── Collaborators ───────────────────────────────────────────────────

    let amaretti_timeout = config
        .amaretti
        .as_ref()
        .map_or(warehouse_config::defaults::TIMEOUT_SECS, |a| a.timeout_secs);
    let amaretti = ServiceClient::builder()
        .base_url(config.amaretti_api()?)
        .timeout(Duration::from_secs(amaretti_timeout))
        .build()?;
    let auth = ServiceClient::builder()
        .base_url(config.auth_api()?)
        .timeout(Duration::from_secs(auth_section.timeout_secs))
        .build()?;

    let projects = ProjectStore::open(&ctx.database)
        .with_context(|| format!("opening project store {}", ctx.database.display()))?;

    // ── Server ──────────────────────────────────────────────────────────

    let secondary = config.secondary();
    let ga = config.groupanalysis();
    let server_config = ServerConfig::new(config.archive_dir()?, config.groupanalysis_gid()?)
        .with_bind_address(bind_address)
        .with_request_logging(server_section.request_logging)
        .with_cors_origins(server_section.cors_origins)
        .with_archive_service(secondary.archive_service)
        .with_list_limit(secondary.list_limit)
        .with_launcher_service(ga.launcher_service)
        .with_service_branch(ga.service_branch)
        .with_max_runtime(Duration::from_secs(ga.max_runtime_secs));

    tracing::info!(
        archive = %server_config.archive_dir.display(),
        database = %ctx.database.display(),
        "Configured secondary service"
    );

    let state = AppState::new(
        server_config,
        AmarettiClient::new(amaretti),
        AuthClient::new(auth),
        verifier,
        service_jwt.value,
        Arc::new(projects),
    )
    .with_publisher(build_publisher(config));

    if !ctx.json_output {
        println!("warehouse listening on http://{}", bind_address);
    }

    Server::from_state(state).run().await?;
    Ok(())
}

/// RS256 from the public key file when configured, else HS256.
fn build_verifier(config: &WarehouseConfig) -> Result<JwtVerifier> {
    let auth = config.auth.as_ref().context("[auth] section is missing")?;

    if let Some(ref path) = auth.public_key_path {
        let pem = std::fs::read(path)
            .with_context(|| format!("reading public key {}", path.display()))?;
        return Ok(JwtVerifier::from_rsa_pem(&pem)?);
    }

    let secret = auth
        .jwt_secret
        .as_deref()
        .context("auth.public_key_path or auth.jwt_secret is required")?;
    tracing::warn!("Verifying caller tokens with a shared HS256 secret");
    Ok(JwtVerifier::from_secret(secret.as_bytes()))
}

fn build_publisher(config: &WarehouseConfig) -> SharedEventPublisher {
    let events = config.events();
    match (events.sink, events.url) {
        (EventSink::Http, Some(url)) => {
            tracing::info!(%url, "Publishing download events over HTTP");
            Arc::new(HttpPublisher::new(url, Duration::from_secs(events.timeout_secs)))
        }
        (EventSink::None, _) => Arc::new(NoopPublisher),
        _ => Arc::new(LogPublisher),
    }
}
