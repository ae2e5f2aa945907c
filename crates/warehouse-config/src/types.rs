//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [server]          # listener and middleware
//! [amaretti]        # orchestration service
//! [auth]            # authentication service and token verification
//! [secondary]       # secondary archive layout
//! [groupanalysis]   # group-analysis launcher
//! [events]          # download audit sink
//! [database]        # local project store
//! [logging]         # log file location
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use warehouse_types::GroupId;

use crate::{ConfigError, Result};

/// Defaults shared by the config types and the server.
pub mod defaults {
    /// Default bind address.
    pub const BIND: &str = "127.0.0.1:8080";
    /// Default timeout for outbound calls, in seconds.
    pub const TIMEOUT_SECS: u64 = 30;
    /// Service name of archival tasks whose outputs are listed.
    pub const ARCHIVE_SERVICE: &str = "brainlife/app-archive-secondary";
    /// Maximum number of archival tasks fetched for one listing.
    pub const LIST_LIMIT: u32 = 20_000;
    /// Service name of the group-analysis launcher.
    pub const LAUNCHER_SERVICE: &str = "brainlife/ga-launcher";
    /// Branch of the launcher service.
    pub const SERVICE_BRANCH: &str = "master";
    /// Maximum runtime of a launched group analysis (24 hours).
    pub const MAX_RUNTIME_SECS: u64 = 24 * 3600;
    /// Default project database filename.
    pub const DATABASE_FILE: &str = "warehouse.db";
}

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub server: Option<ServerSection>,
    pub amaretti: Option<AmarettiSection>,
    pub auth: Option<AuthSection>,
    pub secondary: Option<SecondarySection>,
    pub groupanalysis: Option<GroupAnalysisSection>,
    pub events: Option<EventsSection>,
    pub database: Option<DatabaseSection>,
    pub logging: Option<LoggingSection>,
}

impl WarehouseConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not field by field.
    pub fn merge(&mut self, other: WarehouseConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.amaretti.is_some() {
            self.amaretti = other.amaretti;
        }
        if other.auth.is_some() {
            self.auth = other.auth;
        }
        if other.secondary.is_some() {
            self.secondary = other.secondary;
        }
        if other.groupanalysis.is_some() {
            self.groupanalysis = other.groupanalysis;
        }
        if other.events.is_some() {
            self.events = other.events;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Server section, or defaults.
    pub fn server(&self) -> ServerSection {
        self.server.clone().unwrap_or_default()
    }

    /// Secondary section, or defaults.
    pub fn secondary(&self) -> SecondarySection {
        self.secondary.clone().unwrap_or_default()
    }

    /// Group-analysis section, or defaults.
    pub fn groupanalysis(&self) -> GroupAnalysisSection {
        self.groupanalysis.clone().unwrap_or_default()
    }

    /// Events section, or defaults.
    pub fn events(&self) -> EventsSection {
        self.events.clone().unwrap_or_default()
    }

    /// Project database path.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .and_then(|d| d.path.clone())
            .unwrap_or_else(|| PathBuf::from(defaults::DATABASE_FILE))
    }

    /// Orchestration service base URL.
    pub fn amaretti_api(&self) -> Result<&str> {
        self.amaretti
            .as_ref()
            .and_then(|a| a.api.as_deref())
            .ok_or_else(|| ConfigError::missing("amaretti", "api"))
    }

    /// Authentication service base URL.
    pub fn auth_api(&self) -> Result<&str> {
        self.auth
            .as_ref()
            .and_then(|a| a.api.as_deref())
            .ok_or_else(|| ConfigError::missing("auth", "api"))
    }

    /// Root directory of the secondary archive.
    pub fn archive_dir(&self) -> Result<PathBuf> {
        self.secondary
            .as_ref()
            .and_then(|s| s.archive_dir.clone())
            .ok_or_else(|| ConfigError::missing("secondary", "archive_dir"))
    }

    /// Group id granted to launcher tokens.
    pub fn groupanalysis_gid(&self) -> Result<GroupId> {
        self.groupanalysis
            .as_ref()
            .and_then(|g| g.gid)
            .ok_or_else(|| ConfigError::missing("groupanalysis", "gid"))
    }

    /// Check that everything needed to serve requests is configured.
    ///
    /// Secrets are checked for presence only; they are read at startup.
    pub fn validate(&self) -> Result<()> {
        self.amaretti_api()?;
        self.auth_api()?;
        self.archive_dir()?;
        self.groupanalysis_gid()?;

        let auth = self
            .auth
            .as_ref()
            .ok_or_else(|| ConfigError::missing("auth", "api"))?;
        if auth.public_key_path.is_none() && auth.jwt_secret.is_none() {
            return Err(ConfigError::missing("auth", "public_key_path"));
        }

        let events = self.events();
        if events.sink == EventSink::Http && events.url.is_none() {
            return Err(ConfigError::missing("events", "url"));
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// `[server]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to.
    pub bind: String,
    /// Enable request logging.
    pub request_logging: bool,
    /// CORS allowed origins (empty = no CORS layer).
    pub cors_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: defaults::BIND.to_string(),
            request_logging: true,
            cors_origins: Vec::new(),
        }
    }
}

/// `[amaretti]`: the orchestration service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmarettiSection {
    /// Base URL, e.g. `https://brainlife.io/api/amaretti`.
    pub api: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AmarettiSection {
    fn default() -> Self {
        Self {
            api: None,
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }
}

/// `[auth]`: the authentication service and token verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Base URL, e.g. `https://brainlife.io/api/auth`.
    pub api: Option<String>,
    /// PEM file with the RS256 public key used to verify caller tokens.
    pub public_key_path: Option<PathBuf>,
    /// HS256 shared secret (alternative to `public_key_path`).
    pub jwt_secret: Option<String>,
    /// File holding the warehouse's own service token.
    pub service_jwt_path: Option<PathBuf>,
    /// Inline service token (plaintext; prefer the file or env var).
    pub service_jwt: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            api: None,
            public_key_path: None,
            jwt_secret: None,
            service_jwt_path: None,
            service_jwt: None,
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }
}

/// `[secondary]`: secondary archive layout and listing query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondarySection {
    /// Root of the secondary archive (`<root>/<group>/<instance>/<task>`).
    pub archive_dir: Option<PathBuf>,
    /// Service name of archival tasks.
    pub archive_service: String,
    /// Maximum number of archival tasks fetched per listing.
    pub list_limit: u32,
}

impl Default for SecondarySection {
    fn default() -> Self {
        Self {
            archive_dir: None,
            archive_service: defaults::ARCHIVE_SERVICE.to_string(),
            list_limit: defaults::LIST_LIMIT,
        }
    }
}

/// `[groupanalysis]`: group-analysis launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupAnalysisSection {
    /// Group granted to the caller's escalated token.
    pub gid: Option<GroupId>,
    /// Launcher service name.
    pub launcher_service: String,
    /// Launcher service branch.
    pub service_branch: String,
    /// Maximum runtime of the launcher task, in seconds.
    pub max_runtime_secs: u64,
}

impl Default for GroupAnalysisSection {
    fn default() -> Self {
        Self {
            gid: None,
            launcher_service: defaults::LAUNCHER_SERVICE.to_string(),
            service_branch: defaults::SERVICE_BRANCH.to_string(),
            max_runtime_secs: defaults::MAX_RUNTIME_SECS,
        }
    }
}

/// Where download audit events go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSink {
    /// Write events to the log.
    #[default]
    Log,
    /// POST events to `events.url`.
    Http,
    /// Drop events.
    None,
}

/// `[events]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsSection {
    pub sink: EventSink,
    /// Endpoint for the `http` sink.
    pub url: Option<String>,
    /// Per-request timeout in seconds for the `http` sink.
    pub timeout_secs: u64,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            sink: EventSink::default(),
            url: None,
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }
}

/// `[database]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
}

/// `[logging]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Directory for the rolling JSON log file.
    pub dir: Option<PathBuf>,
}
