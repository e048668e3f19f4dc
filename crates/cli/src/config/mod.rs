//! Locating and loading the resolver config for a CLI invocation

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;
use xcresolve_core::ResolverConfig;

/// Load `explicit` if given, otherwise search upwards from the working directory
pub fn load_config(explicit: Option<&Path>) -> Result<ResolverConfig> {
    let config = match explicit {
        Some(path) => {
            debug!("Using config file {}", path.display());
            ResolverConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            ResolverConfig::load(&cwd).context("Failed to load config")?
        }
    };

    config.validate().context("Invalid config")?;
    Ok(config)
}
