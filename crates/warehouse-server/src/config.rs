//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use warehouse_types::GroupId;

/// Default max body size for REST requests (10 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default service whose finished tasks hold secondary outputs.
pub const DEFAULT_ARCHIVE_SERVICE: &str = "brainlife/app-archive-secondary";

/// Default service submitted by the group-analysis launcher.
pub const DEFAULT_LAUNCHER_SERVICE: &str = "brainlife/ga-launcher";

/// Default cap on archival tasks fetched per listing.
pub const DEFAULT_LIST_LIMIT: u32 = 20_000;

/// Default runtime ceiling for launched group-analysis tasks (1 day).
pub const DEFAULT_MAX_RUNTIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Enable request logging.
    pub request_logging: bool,

    /// CORS allowed origins (empty = no CORS, `"*"` = any).
    pub cors_origins: Vec<String>,

    /// Maximum REST request body size in bytes.
    pub max_body_size: usize,

    /// Root of the secondary archive. Lexically normalized, absolute.
    pub archive_dir: PathBuf,

    /// Orchestration service name of archival tasks.
    pub archive_service: String,

    /// Upper bound on tasks requested per listing.
    pub list_limit: u32,

    /// Group granted to callers for group-analysis launches.
    pub groupanalysis_gid: GroupId,

    /// Orchestration service name of the launcher task.
    pub launcher_service: String,

    /// Branch of the launcher service.
    pub service_branch: String,

    /// Runtime ceiling of launched tasks.
    pub max_runtime: Duration,
}

impl ServerConfig {
    /// Create a config for the given archive root and group-analysis group.
    pub fn new(archive_dir: impl Into<PathBuf>, groupanalysis_gid: GroupId) -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            request_logging: true,
            cors_origins: Vec::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            archive_dir: normalize_root(archive_dir.into()),
            archive_service: DEFAULT_ARCHIVE_SERVICE.to_string(),
            list_limit: DEFAULT_LIST_LIMIT,
            groupanalysis_gid,
            launcher_service: DEFAULT_LAUNCHER_SERVICE.to_string(),
            service_branch: "master".to_string(),
            max_runtime: DEFAULT_MAX_RUNTIME,
        }
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the maximum REST request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the archival service name.
    pub fn with_archive_service(mut self, service: impl Into<String>) -> Self {
        self.archive_service = service.into();
        self
    }

    /// Set the listing task limit.
    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = limit;
        self
    }

    /// Set the launcher service name.
    pub fn with_launcher_service(mut self, service: impl Into<String>) -> Self {
        self.launcher_service = service.into();
        self
    }

    /// Set the launcher service branch.
    pub fn with_service_branch(mut self, branch: impl Into<String>) -> Self {
        self.service_branch = branch.into();
        self
    }

    /// Set the runtime ceiling of launched tasks.
    pub fn with_max_runtime(mut self, max_runtime: Duration) -> Self {
        self.max_runtime = max_runtime;
        self
    }

    /// The archive root as the string prefix used by the traversal guard.
    pub fn archive_root(&self) -> String {
        self.archive_dir.to_string_lossy().into_owned()
    }
}

/// Make the root absolute and strip `.`/`..` segments without touching the disk.
fn normalize_root(dir: PathBuf) -> PathBuf {
    let absolute = std::path::absolute(&dir).unwrap_or(dir);
    let joined = absolute.to_string_lossy();
    PathBuf::from(crate::secondary::path::normalize(&joined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new("/mnt/secondary", 7);
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.list_limit, 20_000);
        assert_eq!(config.groupanalysis_gid, 7);
        assert_eq!(config.service_branch, "master");
        assert_eq!(config.max_runtime.as_millis(), 86_400_000);
        assert_eq!(config.archive_root(), "/mnt/secondary");
    }

    #[test]
    fn test_archive_root_is_normalized() {
        let config = ServerConfig::new("/mnt//secondary/./x/../", 1);
        assert_eq!(config.archive_root(), "/mnt/secondary");
    }

    #[test]
    fn test_relative_archive_root_becomes_absolute() {
        let config = ServerConfig::new("secondary", 1);
        assert!(config.archive_dir.is_absolute());
        assert!(config.archive_root().ends_with("/secondary"));
    }

    #[test]
    fn test_builder() {
        let config = ServerConfig::new("/data", 1)
            .with_bind_address("0.0.0.0:9000".parse().unwrap())
            .with_request_logging(false)
            .with_list_limit(5)
            .with_archive_service("x/archive")
            .with_max_runtime(Duration::from_secs(60));

        assert_eq!(config.bind_address.port(), 9000);
        assert!(!config.request_logging);
        assert_eq!(config.list_limit, 5);
        assert_eq!(config.archive_service, "x/archive");
        assert_eq!(config.max_runtime.as_millis(), 60_000);
    }
}
