//! The installation pipeline.
//!
//! A run walks an explicit state machine:
//!
//! ```text
//! ResolvingVersion -> CheckingInstalled -> Done
//!                                       -> ResolvingCache -> UsingCachedArchive -> Extracting
//!                                                         -> Downloading -> Verifying -> Extracting
//!                                                                                     -> FailedVerification
//! Extracting -> SettingPermissions -> Done        (Windows builds skip SettingPermissions)
//! ```
//!
//! Each state is handled by one method returning the next state, so every
//! transition's error path can be exercised on its own. Nothing is retried:
//! the first error ends the run.

use crate::archive;
use crate::cache::CacheStore;
use crate::checksum;
use crate::error::{Error, Result};
use crate::installed::InstalledDriverChecker;
use crate::platform;
use crate::remote::http::HttpRemote;
use crate::remote::{Endpoints, Remote};
use crate::types::{
    ArtifactDescriptor, InstallOptions, InstallOutcome, InstallSource, InstallState, PlatformId,
};
use crate::version;
use std::fs;
use std::path::{Path, PathBuf};

/// Downloads, verifies, caches and installs the driver.
///
/// # Example
///
/// ```no_run
/// use driverkit::{InstallOptions, Installer};
///
/// let installer = Installer::new();
/// let outcome = installer
///     .install(&InstallOptions::new("vendor/bin", "/tmp/cache").version("2.41"))
///     .unwrap();
/// println!("{outcome}");
/// ```
pub struct Installer {
    remote: Box<dyn Remote>,
    endpoints: Endpoints,
    checker: InstalledDriverChecker,
}

impl Installer {
    /// Create an installer talking to the public release server.
    #[must_use]
    pub fn new() -> Self {
        Self::with_remote(Box::new(HttpRemote::new()))
    }

    /// Create an installer with a custom remote (useful for testing).
    #[must_use]
    pub fn with_remote(remote: Box<dyn Remote>) -> Self {
        Self {
            remote,
            endpoints: Endpoints::default(),
            checker: InstalledDriverChecker::new(),
        }
    }

    /// Use different release server endpoints.
    #[must_use]
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Use a differently configured installed-driver checker.
    #[must_use]
    pub fn checker(mut self, checker: InstalledDriverChecker) -> Self {
        self.checker = checker;
        self
    }

    /// Describe the artifact for a version and platform.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedPlatform` for [`PlatformId::Unknown`].
    pub fn artifact(&self, version: &str, platform: PlatformId) -> Result<ArtifactDescriptor> {
        let remote_file_name = platform::remote_file_name(platform)?;
        let executable_file_name = platform::executable_file_name(platform)?;

        Ok(ArtifactDescriptor {
            platform,
            version: version.to_string(),
            remote_file_name: remote_file_name.to_string(),
            executable_file_name: executable_file_name.to_string(),
            download_url: self.endpoints.download_url(version, remote_file_name),
        })
    }

    /// Run the pipeline to completion.
    ///
    /// # Errors
    ///
    /// Any failing step ends the run with its error. On an integrity
    /// mismatch the downloaded archive is removed from the cache first.
    pub fn install(&self, options: &InstallOptions) -> Result<InstallOutcome> {
        let mut run = Run::new(self, options);
        let mut state = InstallState::ResolvingVersion;

        loop {
            run.states.push(state);
            log::trace!("Installer state: {state}");

            if state == InstallState::Done {
                break;
            }
            state = run.step(state)?;
        }

        Ok(run.into_outcome())
    }
}

impl Default for Installer {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable context of one installation run.
struct Run<'a> {
    installer: &'a Installer,
    options: &'a InstallOptions,
    cache: CacheStore,
    states: Vec<InstallState>,
    artifact: ArtifactDescriptor,
    target: PathBuf,
    archive: PathBuf,
    remote_tag: String,
    local_tag: String,
    source: InstallSource,
}

impl<'a> Run<'a> {
    fn new(installer: &'a Installer, options: &'a InstallOptions) -> Self {
        Self {
            installer,
            options,
            cache: CacheStore::new(&options.cache_dir, options.cache_enabled),
            states: Vec::new(),
            artifact: ArtifactDescriptor::default(),
            target: PathBuf::new(),
            archive: PathBuf::new(),
            remote_tag: String::new(),
            local_tag: String::new(),
            source: InstallSource::Download,
        }
    }

    fn step(&mut self, state: InstallState) -> Result<InstallState> {
        match state {
            InstallState::ResolvingVersion => self.resolve_version(),
            InstallState::CheckingInstalled => Ok(self.check_installed()),
            InstallState::ResolvingCache => self.resolve_cache(),
            InstallState::UsingCachedArchive => Ok(self.use_cached_archive()),
            InstallState::Downloading => self.download(),
            InstallState::Verifying => self.verify(),
            InstallState::FailedVerification => self.fail_verification(),
            InstallState::Extracting => self.extract(),
            InstallState::SettingPermissions => self.set_permissions(),
            InstallState::Done => Ok(InstallState::Done),
        }
    }

    fn resolve_version(&mut self) -> Result<InstallState> {
        let version = version::resolve(
            self.options.version.as_deref(),
            self.installer.remote.as_ref(),
            &self.installer.endpoints,
        );
        version::validate(&version)?;
        log::info!("Using version {version}");

        let platform = self.options.platform.unwrap_or_else(platform::detect);
        let artifact = self.installer.artifact(&version, platform)?;

        self.target = self.options.bin_dir.join(&artifact.executable_file_name);
        self.artifact = artifact;
        Ok(InstallState::CheckingInstalled)
    }

    fn check_installed(&mut self) -> InstallState {
        let version = &self.artifact.version;
        if self.installer.checker.is_up_to_date(&self.target, version) {
            log::info!("The right version {version} of ChromeDriver is already installed");
            self.source = InstallSource::AlreadyInstalled;
            InstallState::Done
        } else {
            InstallState::ResolvingCache
        }
    }

    fn resolve_cache(&mut self) -> Result<InstallState> {
        let artifact = &self.artifact;
        let archive = self
            .cache
            .path(&artifact.version, &artifact.remote_file_name)?;

        let bin_dir = &self.options.bin_dir;
        fs::create_dir_all(bin_dir).map_err(|e| Error::fs(bin_dir, e))?;

        let next = if self.cache.enabled() && self.cache.exists(&archive) {
            InstallState::UsingCachedArchive
        } else {
            InstallState::Downloading
        };
        self.archive = archive;
        Ok(next)
    }

    fn use_cached_archive(&mut self) -> InstallState {
        log::info!(
            "Using cached version of {}",
            self.artifact.remote_file_name
        );
        self.source = InstallSource::Cache;
        InstallState::Extracting
    }

    fn download(&mut self) -> Result<InstallState> {
        let artifact = &self.artifact;
        let url = artifact.download_url.clone();

        let headers = self.installer.remote.fetch_headers(&url)?;
        let remote_tag = headers.integrity_tag(&url)?;

        log::info!(
            "Downloading ChromeDriver version {} for {} ({})",
            artifact.version,
            artifact.platform.display_name(),
            remote_tag
        );

        if let Err(e) = self.installer.remote.download_to(&url, &self.archive) {
            // Never leave a half-written archive where the cache would trust it.
            if let Err(cleanup) = self.cache.remove(&self.archive) {
                log::warn!("Could not remove partial download: {cleanup}");
            }
            return Err(e);
        }

        self.remote_tag = remote_tag;
        self.source = InstallSource::Download;
        Ok(InstallState::Verifying)
    }

    fn verify(&mut self) -> Result<InstallState> {
        self.local_tag = checksum::md5_file(&self.archive)?;

        if self.local_tag == self.remote_tag {
            Ok(InstallState::Extracting)
        } else {
            Ok(InstallState::FailedVerification)
        }
    }

    fn fail_verification(&mut self) -> Result<InstallState> {
        self.cache.remove(&self.archive)?;
        Err(Error::IntegrityMismatch {
            local: self.local_tag.clone(),
            remote: self.remote_tag.clone(),
        })
    }

    fn extract(&mut self) -> Result<InstallState> {
        archive::extract_all(&self.archive, &self.options.bin_dir)?;

        if self.artifact.platform.is_windows() {
            Ok(InstallState::Done)
        } else {
            Ok(InstallState::SettingPermissions)
        }
    }

    fn set_permissions(&mut self) -> Result<InstallState> {
        make_executable(&self.target)?;
        Ok(InstallState::Done)
    }

    fn into_outcome(self) -> InstallOutcome {
        InstallOutcome {
            version: self.artifact.version,
            platform: self.artifact.platform,
            path: self.target,
            source: self.source,
            states: self.states,
        }
    }
}

/// Set mode 0755 on unix hosts; other hosts have no mode bits to set.
fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(path)
            .map_err(|e| Error::fs(path, e))?
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).map_err(|e| Error::fs(path, e))?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}
