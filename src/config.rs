//! Project configuration file.
//!
//! Read from `chromedriver.toml` in the working directory, or from the path
//! given with `--config`. Every key is optional:
//!
//! ```toml
//! chromedriver-version = "2.41"
//! bin-dir = "vendor/bin"
//! cache-dir = "~/.cache/chromedriver-installer"
//! cache = true
//! base-url = "https://chromedriver.storage.googleapis.com"
//! platform = "linux64"
//! ```

use anyhow::{Context, Result};
use driverkit::PlatformId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "chromedriver.toml";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Explicit version override
    pub chromedriver_version: Option<String>,
    /// Legacy version key, used when `chromedriver-version` is absent
    pub version: Option<String>,
    pub bin_dir: Option<String>,
    pub cache_dir: Option<String>,
    pub cache: Option<bool>,
    pub base_url: Option<String>,
    pub platform: Option<PlatformId>,
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, a missing default file
    /// yields an empty configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load_from(&path)
                } else {
                    log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load the configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The requested version, if any.
    ///
    /// `chromedriver-version` wins over the legacy `version` key. Empty
    /// values count as absent.
    pub fn requested_version(&self) -> Option<&str> {
        self.chromedriver_version
            .as_deref()
            .filter(|v| !v.is_empty())
            .or_else(|| self.version.as_deref().filter(|v| !v.is_empty()))
    }
}
