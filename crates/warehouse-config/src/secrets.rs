//! Service credential resolution.
//!
//! Resolution order:
//! 1. `WAREHOUSE_SERVICE_JWT` environment variable
//! 2. `auth.service_jwt_path` file
//! 3. `auth.service_jwt` inline value

use crate::{AuthSection, ConfigError, Result};

/// Environment variable holding the service token.
pub const SERVICE_JWT_ENV: &str = "WAREHOUSE_SERVICE_JWT";

/// Resolved secret with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    pub value: String,
    pub source: SecretSource,
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    EnvVar(String),
    File(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::File(path) => write!(f, "file {}", path),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve the warehouse's own service token.
pub fn resolve_service_jwt(auth: &AuthSection) -> Result<ResolvedSecret> {
    resolve_with_env(auth, std::env::var(SERVICE_JWT_ENV).ok())
}

fn resolve_with_env(auth: &AuthSection, env_value: Option<String>) -> Result<ResolvedSecret> {
    if let Some(value) = env_value
        && !value.trim().is_empty()
    {
        return Ok(ResolvedSecret {
            value: value.trim().to_string(),
            source: SecretSource::EnvVar(SERVICE_JWT_ENV.to_string()),
        });
    }

    if let Some(ref path) = auth.service_jwt_path {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadSecret {
            path: path.display().to_string(),
            source: e,
        })?;
        let value = contents.trim().to_string();
        if value.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "auth.service_jwt_path".to_string(),
                reason: format!("{} is empty", path.display()),
            });
        }
        return Ok(ResolvedSecret {
            value,
            source: SecretSource::File(path.display().to_string()),
        });
    }

    auth.service_jwt
        .as_ref()
        .map(|v| ResolvedSecret {
            value: v.clone(),
            source: SecretSource::ConfigFile,
        })
        .ok_or_else(|| ConfigError::missing("auth", "service_jwt_path"))
}
