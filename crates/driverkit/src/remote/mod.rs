//! Release server access.
//!
//! This module provides the [`Remote`] trait the installer talks to, the URL
//! templates of the release server, and the header parsing used to read the
//! archive's entity tag. [`http::HttpRemote`] is the real implementation;
//! [`MockRemote`] serves canned responses and records requests.
//!
//! # Testing
//!
//! ```
//! use driverkit::remote::{MockRemote, Remote};
//!
//! let mut mock = MockRemote::new();
//! mock.add_text("mock://dl/LATEST_RELEASE", "2.41\n");
//!
//! assert_eq!(mock.fetch_text("mock://dl/LATEST_RELEASE").unwrap(), "2.41\n");
//! assert_eq!(mock.requests().len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Default release server.
pub const DEFAULT_BASE_URL: &str = "https://chromedriver.storage.googleapis.com";

/// Template of an archive download URL.
pub const DOWNLOAD_URL_TEMPLATE: &str = "{{base}}/{{version}}/{{file}}";

/// Template of the latest-release lookup URL.
pub const LATEST_RELEASE_URL_TEMPLATE: &str = "{{base}}/LATEST_RELEASE";

/// Header carrying the archive checksum.
pub const INTEGRITY_HEADER: &str = "ETag";

/// Access to the release server.
///
/// All calls block until the transfer completes.
pub trait Remote: Send + Sync {
    /// GET a URL and return the body as text.
    fn fetch_text(&self, url: &str) -> Result<String>;

    /// Fetch only the response headers of a URL.
    fn fetch_headers(&self, url: &str) -> Result<Headers>;

    /// Stream a URL's body into `dest`, returning the number of bytes written.
    fn download_to(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Replace `{{key}}` placeholders with values.
///
/// Substitution is literal and single-pass: values are not escaped, a value
/// that itself contains a placeholder is not expanded, and placeholders with
/// no matching key are left as they are.
///
/// ```
/// use driverkit::remote::substitute;
///
/// let url = substitute("{{base}}/{{version}}/{{file}}", &[
///     ("base", "https://dl.example.com"),
///     ("version", "2.41"),
///     ("file", "chromedriver_linux64.zip"),
/// ]);
/// assert_eq!(url, "https://dl.example.com/2.41/chromedriver_linux64.zip");
/// ```
#[must_use]
pub fn substitute(template: &str, variables: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &after_open[..end];
        match variables.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Location of the release server and its URL layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    /// Use a different server (e.g. a mirror) with the same layout.
    #[must_use]
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the server base URL.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL returning the latest version as plain text.
    #[must_use]
    pub fn latest_release_url(&self) -> String {
        substitute(LATEST_RELEASE_URL_TEMPLATE, &[("base", &self.base)])
    }

    /// URL of the archive `file` for `version`.
    #[must_use]
    pub fn download_url(&self, version: &str, file: &str) -> String {
        substitute(
            DOWNLOAD_URL_TEMPLATE,
            &[("base", &self.base), ("version", version), ("file", file)],
        )
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::with_base(DEFAULT_BASE_URL)
    }
}

/// Response headers keyed by their name as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Get a header by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Get a header by name, falling back to a case-insensitive match.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&str> {
        self.get(name).or_else(|| {
            self.0
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        })
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no headers were received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the entity tag with its quoting stripped.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingIntegrityHeader` if the server sent none.
    pub fn integrity_tag(&self, url: &str) -> Result<String> {
        self.find(INTEGRITY_HEADER)
            .map(crate::checksum::normalize_tag)
            .ok_or_else(|| Error::MissingIntegrityHeader {
                url: url.to_string(),
            })
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse `Name: Value` lines into [`Headers`].
///
/// The name is everything before the first colon, kept verbatim. The value
/// is the rest with surrounding colons and spaces trimmed. A line without a
/// colon (such as the status line) becomes a key with an empty value.
pub fn parse_header_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Headers {
    lines
        .into_iter()
        .map(|line| line.trim_end_matches(['\r', '\n']))
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(':') {
            Some((name, value)) => (
                name.to_string(),
                value.trim_matches(|c| c == ':' || c == ' ').to_string(),
            ),
            None => (line.to_string(), String::new()),
        })
        .collect()
}

/// A request seen by [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `fetch_text`
    Text(String),
    /// `fetch_headers`
    Headers(String),
    /// `download_to`
    Download(String),
}

impl Request {
    /// The requested URL.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Text(url) | Self::Headers(url) | Self::Download(url) => url,
        }
    }
}

/// In-memory remote for testing without network access.
///
/// Unconfigured URLs answer with an HTTP 404 error.
#[derive(Debug, Clone, Default)]
pub struct MockRemote {
    texts: HashMap<String, String>,
    headers: HashMap<String, Headers>,
    files: HashMap<String, Vec<u8>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockRemote {
    /// Create a new empty mock remote.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for text requests to `url`.
    pub fn add_text(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.texts.insert(url.into(), body.into());
    }

    /// Serve `lines` (`Name: Value`) for header requests to `url`.
    pub fn add_headers(&mut self, url: impl Into<String>, lines: &[&str]) {
        self.headers
            .insert(url.into(), parse_header_lines(lines.iter().copied()));
    }

    /// Serve `data` for downloads of `url`.
    pub fn add_file(&mut self, url: impl Into<String>, data: Vec<u8>) {
        self.files.insert(url.into(), data);
    }

    /// All requests made so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Whether any download was requested.
    #[must_use]
    pub fn downloaded(&self) -> bool {
        self.requests()
            .iter()
            .any(|r| matches!(r, Request::Download(_)))
    }

    fn record(&self, request: Request) {
        self.requests.lock().unwrap().push(request);
    }

    fn not_found(url: &str) -> Error {
        Error::Http {
            url: url.to_string(),
            message: "http status: 404".to_string(),
            status: Some(404),
        }
    }
}

impl Remote for MockRemote {
    fn fetch_text(&self, url: &str) -> Result<String> {
        self.record(Request::Text(url.to_string()));
        self.texts
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url))
    }

    fn fetch_headers(&self, url: &str) -> Result<Headers> {
        self.record(Request::Headers(url.to_string()));
        self.headers
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url))
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        self.record(Request::Download(url.to_string()));
        let data = self.files.get(url).ok_or_else(|| Self::not_found(url))?;
        fs::write(dest, data).map_err(|e| Error::fs(dest, e))?;
        Ok(data.len() as u64)
    }
}
