//! Platform detection and platform-specific file names.
//!
//! ChromeDriver is published as one zip per platform. This module maps the
//! host to one of those platforms and derives the archive and executable
//! names from it.
//!
//! # Example
//!
//! ```
//! use driverkit::platform;
//! use driverkit::PlatformId;
//!
//! assert_eq!(platform::resolve("Linux", 8), PlatformId::Linux64);
//! assert_eq!(
//!     platform::remote_file_name(PlatformId::Linux64).unwrap(),
//!     "chromedriver_linux64.zip"
//! );
//! ```

use crate::error::{Error, Result};
use crate::types::PlatformId;

/// Map an OS name and pointer width (in bytes) to a platform.
///
/// Matching is a case-insensitive prefix match, checked in this order:
///
/// | OS name prefix | Pointer width | Platform  |
/// |----------------|---------------|-----------|
/// | `win`          | any           | `win32`   |
/// | `darwin`       | any           | `mac64`   |
/// | `linux`        | 8             | `linux64` |
/// | `linux`        | other         | `linux32` |
///
/// Anything else is [`PlatformId::Unknown`].
#[must_use]
pub fn resolve(os_name: &str, pointer_width: usize) -> PlatformId {
    let os = os_name.to_ascii_lowercase();

    if os.starts_with("win") {
        PlatformId::Win32
    } else if os.starts_with("darwin") {
        PlatformId::Mac64
    } else if os.starts_with("linux") {
        if pointer_width == 8 {
            PlatformId::Linux64
        } else {
            PlatformId::Linux32
        }
    } else {
        PlatformId::Unknown
    }
}

/// Detect the host platform.
///
/// An unknown host is logged as a warning and returned as
/// [`PlatformId::Unknown`]; the failure surfaces later, when a file name is
/// needed.
pub fn detect() -> PlatformId {
    let platform = resolve(host_os_name(), std::mem::size_of::<usize>());
    if !platform.is_known() {
        log::warn!("Could not guess your platform, download chromedriver manually.");
    }
    platform
}

/// The host OS name in `uname` style (`Linux`, `Darwin`, `WINNT`).
///
/// Other hosts report the Rust target OS name unchanged.
#[must_use]
pub fn host_os_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "WINNT",
        other => other,
    }
}

/// Get the archive name published for a platform.
///
/// # Errors
///
/// Returns `Error::UnsupportedPlatform` for [`PlatformId::Unknown`].
pub fn remote_file_name(platform: PlatformId) -> Result<&'static str> {
    match platform {
        PlatformId::Linux32 => Ok("chromedriver_linux32.zip"),
        PlatformId::Linux64 => Ok("chromedriver_linux64.zip"),
        PlatformId::Mac64 => Ok("chromedriver_mac64.zip"),
        PlatformId::Win32 => Ok("chromedriver_win32.zip"),
        PlatformId::Unknown => Err(unsupported()),
    }
}

/// Get the executable name inside the archive for a platform.
///
/// # Errors
///
/// Returns `Error::UnsupportedPlatform` for [`PlatformId::Unknown`].
pub fn executable_file_name(platform: PlatformId) -> Result<&'static str> {
    match platform {
        PlatformId::Linux32 | PlatformId::Linux64 | PlatformId::Mac64 => Ok("chromedriver"),
        PlatformId::Win32 => Ok("chromedriver.exe"),
        PlatformId::Unknown => Err(unsupported()),
    }
}

fn unsupported() -> Error {
    Error::UnsupportedPlatform(format!(
        "{}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    ))
}
