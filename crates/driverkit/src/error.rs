//! Error types for driver installation.
//!
//! Every error is terminal for the current run: there is no retry logic, a
//! later invocation is the retry. Categories exist so callers can print a
//! short explanation and a hint next to the raw message.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for driver installation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad categories of installation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The requested version string could not be parsed.
    Version,
    /// The host platform has no known driver build.
    Platform,
    /// The release server could not be reached or answered with an error.
    Network,
    /// The downloaded archive could not be verified.
    Integrity,
    /// The archive could not be opened or extracted.
    Format,
    /// A directory or file could not be created, written or removed.
    Filesystem,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Version => "Invalid version",
            Self::Platform => "Unsupported platform",
            Self::Network => "Network connectivity issue",
            Self::Integrity => "Integrity check failed",
            Self::Format => "Invalid archive",
            Self::Filesystem => "Filesystem error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Version => "Use a version like 2.41 or a constraint like ^2.0",
            Self::Platform => "Download chromedriver manually for this platform",
            Self::Network => "Check your internet connection and try again",
            Self::Integrity => "The mismatching download was removed, run the install again",
            Self::Format => "Remove the cached archive and run the install again",
            Self::Filesystem => "Check directory permissions for the bin and cache directories",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while installing the driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The version string does not parse as a version constraint.
    #[error("Incorrect version string: \"{0}\"")]
    InvalidVersion(String),

    /// A platform-specific name was requested for an unknown platform.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The release server did not send an entity tag for the archive.
    #[error("Failed to acquire entity tag (ETag) from {url}")]
    MissingIntegrityHeader {
        /// URL whose headers were fetched.
        url: String,
    },

    /// The downloaded bytes do not match the advertised entity tag.
    #[error("File validation failed: {local} != {remote}")]
    IntegrityMismatch {
        /// Checksum computed from the downloaded file.
        local: String,
        /// Tag advertised by the server.
        remote: String,
    },

    /// The archive could not be opened or extracted.
    #[error("archive error at {path}: {message}")]
    Archive {
        /// Archive path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Filesystem operation failed.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// HTTP request failed.
    #[error("HTTP request to {url} failed: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },
}

impl Error {
    /// Create a filesystem error with path context.
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Create an archive error with path context.
    pub fn archive(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an HTTP error from a `ureq` failure.
    pub fn http(url: impl Into<String>, err: &ureq::Error) -> Self {
        let status = match err {
            ureq::Error::StatusCode(code) => Some(*code),
            _ => None,
        };
        Self::Http {
            url: url.into(),
            message: err.to_string(),
            status,
        }
    }

    /// Get actionable advice for this error.
    ///
    /// Falls back to the category's advice where the variant adds nothing.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Error::MissingIntegrityHeader { .. } => {
                "The server did not send a checksum, nothing was downloaded; try another mirror"
            }
            _ => self.category().advice(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidVersion(_) => ErrorCategory::Version,
            Error::UnsupportedPlatform(_) => ErrorCategory::Platform,
            Error::MissingIntegrityHeader { .. } => ErrorCategory::Integrity,
            Error::IntegrityMismatch { .. } => ErrorCategory::Integrity,
            Error::Archive { .. } => ErrorCategory::Format,
            Error::Filesystem { .. } => ErrorCategory::Filesystem,
            Error::Http { .. } => ErrorCategory::Network,
        }
    }
}
