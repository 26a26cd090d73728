//! # driverkit
//!
//! Pure Rust library for installing ChromeDriver.
//!
//! This crate provides functionality for:
//! - Resolving the latest ChromeDriver release or validating a requested one
//! - Detecting the host platform and the matching archive
//! - Downloading the archive and verifying it against the server's ETag
//! - Caching verified archives per version
//! - Skipping the install when the right version is already in place
//!
//! ## Example
//!
//! ```no_run
//! use driverkit::{InstallOptions, InstallSource, Installer};
//!
//! let installer = Installer::new();
//! let outcome = installer
//!     .install(&InstallOptions::new("vendor/bin", "/tmp/cache"))
//!     .expect("installation failed");
//!
//! if outcome.source == InstallSource::AlreadyInstalled {
//!     println!("nothing to do");
//! }
//! println!("{outcome}");
//! ```
//!
//! ## Supported Platforms
//!
//! | Platform  | Archive                    | Executable         |
//! |-----------|----------------------------|--------------------|
//! | `linux32` | `chromedriver_linux32.zip` | `chromedriver`     |
//! | `linux64` | `chromedriver_linux64.zip` | `chromedriver`     |
//! | `mac64`   | `chromedriver_mac64.zip`   | `chromedriver`     |
//! | `win32`   | `chromedriver_win32.zip`   | `chromedriver.exe` |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod cache;
pub mod checksum;
pub mod error;
pub mod installed;
pub mod installer;
pub mod platform;
pub mod remote;
pub mod types;
pub mod version;

pub use error::{Error, ErrorCategory, Result};
pub use installed::InstalledDriverChecker;
pub use installer::Installer;
pub use remote::{Endpoints, MockRemote, Remote};
pub use types::{
    ArtifactDescriptor, InstallOptions, InstallOutcome, InstallSource, InstallState, PlatformId,
};

/// Install the driver from `endpoints` over HTTP.
///
/// This is the entry point the `post-install` and `post-update` hooks run.
///
/// # Errors
///
/// See [`Installer::install`].
pub fn install_driver(options: &InstallOptions, endpoints: &Endpoints) -> Result<InstallOutcome> {
    Installer::new().endpoints(endpoints.clone()).install(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let options = InstallOptions::new("bin", "cache").platform(PlatformId::Linux64);
        assert_eq!(options.platform, Some(PlatformId::Linux64));
        assert_eq!(Error::InvalidVersion(String::new()).category(), ErrorCategory::Version);
    }

    #[test]
    fn test_install_driver_rejects_invalid_version_before_download() {
        let dir = tempfile::tempdir().unwrap();
        let options = InstallOptions::new(dir.path().join("bin"), dir.path().join("cache"))
            .version("not-a-version!!")
            .platform(PlatformId::Linux64);

        let endpoints = Endpoints::with_base("http://127.0.0.1:9");
        let err = install_driver(&options, &endpoints).unwrap_err();
        assert!(matches!(err, Error::InvalidVersion(_)));
        assert!(!dir.path().join("bin").exists());
    }

    #[test]
    fn test_install_driver_uses_given_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let options = InstallOptions::new(dir.path().join("bin"), dir.path().join("cache"))
            .version("2.41")
            .platform(PlatformId::Linux64);

        // Nothing listens on the discard port.
        let endpoints = Endpoints::with_base("http://127.0.0.1:9");
        let err = install_driver(&options, &endpoints).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.to_string().contains("127.0.0.1:9"));
    }
}
