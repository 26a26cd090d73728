//! Zip extraction into the bin directory.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Extract every entry of a zip archive into `dest_dir`.
///
/// Existing files are overwritten. Entries whose names would escape
/// `dest_dir` are rejected. Returns the paths of the extracted files.
///
/// # Errors
///
/// Returns `Error::Archive` if the archive cannot be opened, read or
/// written out.
pub fn extract_all(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path).map_err(|e| Error::archive(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| Error::archive(archive_path, e))?;
    let write_error = |path: &Path, e: io::Error| {
        Error::archive(archive_path, format!("{}: {e}", path.display()))
    };

    fs::create_dir_all(dest_dir).map_err(|e| Error::fs(dest_dir, e))?;

    let mut extracted = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| Error::archive(archive_path, e))?;

        let Some(relative) = entry.enclosed_name() else {
            return Err(Error::archive(
                archive_path,
                format!("refusing to extract unsafe path {:?}", entry.name()),
            ));
        };
        let output_path = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&output_path).map_err(|e| write_error(&output_path, e))?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
        }

        let mut outfile = File::create(&output_path).map_err(|e| write_error(&output_path, e))?;
        io::copy(&mut entry, &mut outfile).map_err(|e| write_error(&output_path, e))?;

        log::debug!("Extracted {}", output_path.display());
        extracted.push(output_path);
    }

    Ok(extracted)
}
