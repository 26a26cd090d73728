//! Detection of an already-installed driver.
//!
//! The probe only gates the "nothing to do" shortcut, so every failure
//! (missing file, crash, hang, garbage output) reads as "not up to date" and
//! the installer simply reinstalls.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Prefix of the driver's `--version` output.
pub const PRODUCT_NAME: &str = "ChromeDriver";

/// How long the version probe may run.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Checks whether the executable in the bin directory is the wanted version.
#[derive(Debug, Clone)]
pub struct InstalledDriverChecker {
    product_name: String,
    timeout: Duration,
}

impl InstalledDriverChecker {
    /// Create a checker for ChromeDriver with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            product_name: PRODUCT_NAME.to_string(),
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Override the probe timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether `path` is an executable reporting `expected_version`.
    ///
    /// True iff the `--version` output starts with
    /// `"{product} {expected_version}"`.
    #[must_use]
    pub fn is_up_to_date(&self, path: &Path, expected_version: &str) -> bool {
        if !is_executable(path) {
            return false;
        }

        let Some(output) = self.probe(path) else {
            return false;
        };

        let expected = format!("{} {}", self.product_name, expected_version);
        output.starts_with(&expected)
    }

    /// Run `{path} --version` and capture stdout.
    ///
    /// Returns `None` if the process cannot be started, its output is not
    /// UTF-8, or it (or anything holding its stdout) outlives the timeout.
    #[must_use]
    pub fn probe(&self, path: &Path) -> Option<String> {
        match run_with_timeout(path, self.timeout) {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(output) => Some(output),
                Err(_) => {
                    log::debug!("{} --version printed non-UTF-8 output", path.display());
                    None
                }
            },
            Ok(None) => {
                log::debug!(
                    "{} --version timed out after {:?}",
                    path.display(),
                    self.timeout
                );
                None
            }
            Err(e) => {
                log::debug!("Failed to run {} --version: {e}", path.display());
                None
            }
        }
    }
}

impl Default for InstalledDriverChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a regular file exists at `path` and may be executed.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

fn run_with_timeout(path: &Path, timeout: Duration) -> std::io::Result<Option<Vec<u8>>> {
    let deadline = Instant::now() + timeout;
    let mut child = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    // The pipe stays open while any descendant holds it, so the reader is
    // detached and only awaited until the deadline.
    let mut stdout = child.stdout.take();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(out) = stdout.as_mut() {
            let _ = out.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });

    loop {
        if child.try_wait()?.is_some() {
            break;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }

    let remaining = deadline
        .saturating_duration_since(Instant::now())
        .max(POLL_INTERVAL);
    Ok(rx.recv_timeout(remaining).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(unix)]
    fn fake_driver(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("chromedriver");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_up_to_date() {
        let checker = InstalledDriverChecker::new();
        assert!(!checker.is_up_to_date(Path::new("/nonexistent/chromedriver"), "2.41"));
    }

    #[test]
    fn test_directory_is_not_executable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_executable(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_matching_version_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_driver(dir.path(), "echo 'ChromeDriver 2.41.578700 (2f1ed5f9343c)'");

        let checker = InstalledDriverChecker::new();
        assert!(checker.is_up_to_date(&path, "2.41"));
        assert!(checker.is_up_to_date(&path, "2.41.578700"));
    }

    #[cfg(unix)]
    #[test]
    fn test_other_version_is_not_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_driver(dir.path(), "echo 'ChromeDriver 2.40.565383'");

        let checker = InstalledDriverChecker::new();
        assert!(!checker.is_up_to_date(&path, "2.41"));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_must_start_with_product_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_driver(dir.path(), "echo 'Starting ChromeDriver 2.41'");

        let checker = InstalledDriverChecker::new();
        assert!(!checker.is_up_to_date(&path, "2.41"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = fake_driver(dir.path(), "echo 'ChromeDriver 2.41'");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        assert!(!is_executable(&path));
        assert!(!InstalledDriverChecker::new().is_up_to_date(&path, "2.41"));
    }

    #[cfg(unix)]
    #[test]
    fn test_crashing_binary_is_not_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_driver(dir.path(), "exit 3");

        assert!(!InstalledDriverChecker::new().is_up_to_date(&path, "2.41"));
    }

    #[cfg(unix)]
    #[test]
    fn test_hanging_binary_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_driver(dir.path(), "exec sleep 5");

        let checker = InstalledDriverChecker::new().with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        assert!(!checker.is_up_to_date(&path, "2.41"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_background_process_holding_stdout_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_driver(dir.path(), "echo 'ChromeDriver 2.40'\nsleep 30 &");

        let checker = InstalledDriverChecker::new().with_timeout(Duration::from_millis(500));
        let started = Instant::now();
        assert!(!checker.is_up_to_date(&path, "2.40"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_output_is_not_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_driver(dir.path(), "printf 'ChromeDriver 2.41 \\377\\376\\n'");

        let checker = InstalledDriverChecker::new();
        assert!(checker.probe(&path).is_none());
        assert!(!checker.is_up_to_date(&path, "2.41"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unrunnable_file_is_not_up_to_date() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chromedriver");
        std::fs::write(&path, [0u8, 1, 2, 3]).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(!InstalledDriverChecker::new().is_up_to_date(&path, "2.41"));
    }
}
