//! Core types for driver installation.
//!
//! This module contains the platform identifier, the artifact descriptor
//! derived from it, the options an installation run takes, and the outcome
//! it reports.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Platforms ChromeDriver is published for.
///
/// Derived once from the host OS name and pointer width, see
/// [`crate::platform::resolve`].
///
/// # Example
///
/// ```
/// use driverkit::PlatformId;
///
/// let platform: PlatformId = "linux64".parse().unwrap();
/// assert_eq!(platform, PlatformId::Linux64);
/// assert_eq!(platform.to_string(), "linux64");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    /// 32-bit Linux.
    Linux32,
    /// 64-bit Linux.
    Linux64,
    /// macOS (64-bit).
    Mac64,
    /// Windows (the 32-bit build runs on all Windows hosts).
    Win32,
    /// Host could not be matched to a published build.
    #[default]
    Unknown,
}

impl PlatformId {
    /// Get the platform identifier as used in archive names.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Linux32 => "linux32",
            Self::Linux64 => "linux64",
            Self::Mac64 => "mac64",
            Self::Win32 => "win32",
            Self::Unknown => "unknown",
        }
    }

    /// Get the human-readable platform name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Linux32 => "Linux 32Bits",
            Self::Linux64 => "Linux 64Bits",
            Self::Mac64 => "Mac OS X",
            Self::Win32 => "Windows",
            Self::Unknown => "Unknown platform",
        }
    }

    /// Whether this is the Windows build.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Win32)
    }

    /// Whether a published build exists for this platform.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for PlatformId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linux32" => Ok(Self::Linux32),
            "linux64" => Ok(Self::Linux64),
            "mac64" => Ok(Self::Mac64),
            "win32" => Ok(Self::Win32),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// Everything needed to fetch and install one driver build.
///
/// Derived from a [`PlatformId`] and a version; it has no lifecycle of its
/// own and is recomputed whenever it is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    /// Target platform.
    pub platform: PlatformId,
    /// Resolved version string.
    pub version: String,
    /// Archive name on the release server, e.g. `chromedriver_linux64.zip`.
    pub remote_file_name: String,
    /// Executable name inside the archive, e.g. `chromedriver`.
    pub executable_file_name: String,
    /// Fully expanded download URL.
    pub download_url: String,
}

/// Options for an installation run.
///
/// # Example
///
/// ```
/// use driverkit::{InstallOptions, PlatformId};
///
/// let options = InstallOptions::new("vendor/bin", "/tmp/cache")
///     .version("2.41")
///     .platform(PlatformId::Linux64)
///     .cache(false);
///
/// assert_eq!(options.version.as_deref(), Some("2.41"));
/// assert!(!options.cache_enabled);
/// ```
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Version to install (None = resolve latest).
    pub version: Option<String>,
    /// Directory the executable is extracted into.
    pub bin_dir: PathBuf,
    /// Host cache directory; archives live under a fixed sub-path of it.
    pub cache_dir: PathBuf,
    /// Whether previously downloaded archives may be reused.
    pub cache_enabled: bool,
    /// Platform override (None = detect from the host).
    pub platform: Option<PlatformId>,
}

impl InstallOptions {
    /// Create options for the given bin and cache directories.
    #[must_use]
    pub fn new(bin_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            version: None,
            bin_dir: bin_dir.into(),
            cache_dir: cache_dir.into(),
            cache_enabled: true,
            platform: None,
        }
    }

    /// Set the version to install.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Enable or disable archive reuse.
    #[must_use]
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Install the build for a specific platform instead of the host's.
    #[must_use]
    pub fn platform(mut self, platform: PlatformId) -> Self {
        self.platform = Some(platform);
        self
    }
}

/// States of an installation run, in the order they can be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallState {
    /// Pinning the version to install.
    ResolvingVersion,
    /// Probing the executable already in the bin directory.
    CheckingInstalled,
    /// Locating the archive in the cache.
    ResolvingCache,
    /// A previously verified archive is reused.
    UsingCachedArchive,
    /// Fetching the archive from the release server.
    Downloading,
    /// Comparing the archive checksum with the server's tag.
    Verifying,
    /// The checksum did not match; the archive was discarded.
    FailedVerification,
    /// Unpacking the archive into the bin directory.
    Extracting,
    /// Marking the executable as executable.
    SettingPermissions,
    /// Finished.
    Done,
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolvingVersion => "resolving version",
            Self::CheckingInstalled => "checking installed driver",
            Self::ResolvingCache => "resolving cache",
            Self::UsingCachedArchive => "using cached archive",
            Self::Downloading => "downloading",
            Self::Verifying => "verifying",
            Self::FailedVerification => "verification failed",
            Self::Extracting => "extracting",
            Self::SettingPermissions => "setting permissions",
            Self::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Where the installed executable came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallSource {
    /// The right version was already installed; nothing was touched.
    AlreadyInstalled,
    /// Extracted from a cached archive.
    Cache,
    /// Downloaded, verified and extracted.
    Download,
}

/// Result of a completed installation run.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
    /// The version that is now installed.
    pub version: String,
    /// Platform the executable was installed for.
    pub platform: PlatformId,
    /// Path to the installed executable.
    pub path: PathBuf,
    /// Where the executable came from.
    pub source: InstallSource,
    /// States visited, in order.
    pub states: Vec<InstallState>,
}

impl InstallOutcome {
    /// Whether the run visited the given state.
    #[must_use]
    pub fn visited(&self, state: InstallState) -> bool {
        self.states.contains(&state)
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            InstallSource::AlreadyInstalled => write!(
                f,
                "ChromeDriver {} already installed at {}",
                self.version,
                self.path.display()
            ),
            InstallSource::Cache => write!(
                f,
                "ChromeDriver {} installed from cache at {}",
                self.version,
                self.path.display()
            ),
            InstallSource::Download => write!(
                f,
                "ChromeDriver {} installed at {}",
                self.version,
                self.path.display()
            ),
        }
    }
}
