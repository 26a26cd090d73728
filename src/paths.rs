//! Bin and cache directory resolution.
//!
//! The host tool decides where the driver goes. Each setting is taken from
//! the first source that has it:
//!
//! 1. Command-line flag
//! 2. Environment variable
//! 3. Config file
//! 4. Default
//!
//! # Environment Variables
//!
//! - `CHROMEDRIVER_BIN_DIR` - Directory the executable is installed into
//! - `CHROMEDRIVER_CACHE_DIR` - Host cache directory
//! - `CHROMEDRIVER_CACHE` - `0`, `false`, `no` or `off` disables archive reuse

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for the bin directory
pub const ENV_BIN_DIR: &str = "CHROMEDRIVER_BIN_DIR";

/// Environment variable for the cache directory
pub const ENV_CACHE_DIR: &str = "CHROMEDRIVER_CACHE_DIR";

/// Environment variable for the cache switch
pub const ENV_CACHE: &str = "CHROMEDRIVER_CACHE";

/// Default bin directory, relative to the working directory
pub const DEFAULT_BIN_DIR: &str = "vendor/bin";

/// Resolve the bin directory from the process environment.
pub fn bin_dir(flag: Option<&Path>, config: Option<&str>) -> PathBuf {
    resolve_bin_dir(flag, std::env::var(ENV_BIN_DIR).ok(), config)
}

/// Resolve the cache directory from the process environment.
pub fn cache_dir(flag: Option<&Path>, config: Option<&str>) -> Result<PathBuf> {
    resolve_cache_dir(
        flag,
        std::env::var(ENV_CACHE_DIR).ok(),
        config,
        dirs::cache_dir(),
    )
}

/// Resolve the cache switch from the process environment.
pub fn cache_enabled(no_cache_flag: bool, config: Option<bool>) -> bool {
    resolve_cache_enabled(no_cache_flag, std::env::var(ENV_CACHE).ok(), config)
}

fn resolve_bin_dir(flag: Option<&Path>, env: Option<String>, config: Option<&str>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Some(dir) = env.filter(|d| !d.is_empty()) {
        let path = expand(&dir);
        log::debug!("Using bin dir from {}: {}", ENV_BIN_DIR, path.display());
        return path;
    }
    if let Some(dir) = config {
        return expand(dir);
    }
    PathBuf::from(DEFAULT_BIN_DIR)
}

fn resolve_cache_dir(
    flag: Option<&Path>,
    env: Option<String>,
    config: Option<&str>,
    platform_cache: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(dir) = env.filter(|d| !d.is_empty()) {
        let path = expand(&dir);
        log::debug!("Using cache dir from {}: {}", ENV_CACHE_DIR, path.display());
        return Ok(path);
    }
    if let Some(dir) = config {
        return Ok(expand(dir));
    }

    let path = platform_cache
        .context("Could not determine the cache directory, set CHROMEDRIVER_CACHE_DIR")?
        .join("chromedriver-installer");
    log::debug!("Using default cache dir: {}", path.display());
    Ok(path)
}

fn resolve_cache_enabled(no_cache_flag: bool, env: Option<String>, config: Option<bool>) -> bool {
    if no_cache_flag {
        return false;
    }
    if let Some(value) = env {
        return !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        );
    }
    config.unwrap_or(true)
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
