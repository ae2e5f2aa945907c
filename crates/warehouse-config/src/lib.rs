//! Configuration system for the warehouse secondary-output service.
//!
//! Provides TOML-based configuration with:
//! - One section per collaborator (`[amaretti]`, `[auth]`, `[events]`, ...)
//! - Config file layering (XDG user config + project-local overrides)
//! - Secret resolution for the service credential (env var → file → inline)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    LoadedConfig, load_config, load_config_file, load_config_with_options, xdg_config_dir,
    xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretSource, resolve_service_jwt};
pub use types::*;
