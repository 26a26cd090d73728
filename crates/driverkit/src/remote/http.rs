//! HTTP implementation of [`Remote`] on a blocking `ureq` agent.
//!
//! Transfers use the agent's default timeouts; nothing here retries.

use crate::error::{Error, Result};
use crate::remote::{Headers, Remote, parse_header_lines};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Maximum archive size (driver archives are a few MB).
const MAX_BODY_SIZE: u64 = 100 * 1024 * 1024;

const USER_AGENT: &str = concat!("driverkit/", env!("CARGO_PKG_VERSION"));

/// Release server client.
///
/// # Example
///
/// ```no_run
/// use driverkit::remote::http::HttpRemote;
/// use driverkit::remote::{Endpoints, Remote};
///
/// let remote = HttpRemote::new();
/// let latest = remote.fetch_text(&Endpoints::default().latest_release_url()).unwrap();
/// println!("latest: {}", latest.trim());
/// ```
pub struct HttpRemote {
    agent: ureq::Agent,
}

impl HttpRemote {
    /// Create a client with the default agent configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for HttpRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl Remote for HttpRemote {
    fn fetch_text(&self, url: &str) -> Result<String> {
        log::debug!("GET {url}");

        self.agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| Error::http(url, &e))?
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::http(url, &e))
    }

    fn fetch_headers(&self, url: &str) -> Result<Headers> {
        log::debug!("HEAD {url}");

        let response = self
            .agent
            .head(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| Error::http(url, &e))?;

        let lines: Vec<String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()))
            })
            .collect();

        Ok(parse_header_lines(lines.iter().map(String::as_str)))
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        log::debug!("GET {url} -> {}", dest.display());

        let mut response = self
            .agent
            .get(url)
            .header("Accept", "application/octet-stream")
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| Error::http(url, &e))?;

        let mut reader = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .reader();

        let mut file = File::create(dest).map_err(|e| Error::fs(dest, e))?;
        copy_body(&mut reader, &mut file, url, dest)
    }
}

/// Stream a response body into `dest`.
///
/// Read failures are transport errors; write failures are filesystem errors.
fn copy_body(
    reader: &mut impl Read,
    writer: &mut impl Write,
    url: &str,
    dest: &Path,
) -> Result<u64> {
    let mut buffer = [0u8; 8192];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::Http {
                    url: url.to_string(),
                    message: format!("download to {} interrupted: {e}", dest.display()),
                    status: None,
                });
            }
        };
        writer.write_all(&buffer[..n]).map_err(|e| Error::fs(dest, e))?;
        total += n as u64;
    }

    writer.flush().map_err(|e| Error::fs(dest, e))?;
    Ok(total)
}
