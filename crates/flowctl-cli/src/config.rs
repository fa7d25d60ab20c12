//! Config file loading
//!
//! An explicitly passed path must exist; the default location
//! (`<config dir>/flowctl/config.toml`) is optional and falls back to
//! built-in defaults, so `flowctl --gateway-url ... --api-version v2`
//! works without any file at all. Flag and environment overrides are
//! applied in `main` after loading.

use crate::error::CliResult;
use flowctl_client::Config;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file location under the platform config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("flowctl").join("config.toml"))
}

/// Load configuration from `path`, or from the default location, or fall
/// back to defaults when no file exists.
pub fn load(path: Option<&Path>) -> CliResult<Config> {
    if let Some(path) = path {
        debug!(path = %path.display(), "loading config file");
        let raw = std::fs::read_to_string(path)?;
        return Ok(toml::from_str(&raw)?);
    }

    if let Some(path) = default_path() {
        if path.exists() {
            debug!(path = %path.display(), "loading default config file");
            let raw = std::fs::read_to_string(&path)?;
            return Ok(toml::from_str(&raw)?);
        }
    }

    debug!("no config file found, using defaults");
    Ok(Config::default())
}
