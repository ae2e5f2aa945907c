//! CLI command handlers.

pub mod projects;
pub mod start;

use std::path::{Path, PathBuf};

use anyhow::Result;
use warehouse_config::LoadedConfig;
use warehouse_config::discovery::ConfigSource;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Project database path (flag, else config, else default).
    pub database: PathBuf,
    /// Merged configuration and where it came from.
    pub loaded: LoadedConfig,
}

/// Load an explicit config file, or discover the layered config.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let Some(path) = explicit else {
        return Ok(warehouse_config::load_config(None)?);
    };

    let config = warehouse_config::load_config_file(path)?;
    Ok(LoadedConfig {
        config,
        sources: vec![ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        }],
        warnings: Vec::new(),
    })
}
