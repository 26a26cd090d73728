//! Archive checksums.
//!
//! The release server publishes each archive's MD5 digest as its entity tag,
//! so verification is a hex MD5 of the downloaded file compared byte for byte
//! with the unquoted tag.

use crate::error::{Error, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute the lower-case hex MD5 digest of a file.
///
/// # Errors
///
/// Returns `Error::Filesystem` if the file cannot be opened or read.
pub fn md5_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::fs(path, e))?;

    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| Error::fs(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Strip the quoting and padding around an entity tag.
#[must_use]
pub fn normalize_tag(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == ' ').to_string()
}
