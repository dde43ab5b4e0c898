//! Interpreter discovery and validation for script-launching kinds.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

/// Interpreter used when no valid override is configured.
#[cfg(windows)]
pub const DEFAULT_INTERPRETER: &str = "python";
/// Interpreter used when no valid override is configured.
#[cfg(not(windows))]
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Upper bound on how long `<interpreter> --version` may take.
pub const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Default interpreter, resolved through `PATH` at launch time.
#[must_use]
pub fn default_interpreter() -> PathBuf {
    PathBuf::from(DEFAULT_INTERPRETER)
}

/// Check that `path` is an executable file that identifies itself as a
/// Python interpreter when run with `--version`.
///
/// Python 2 prints its banner on stderr, so both streams are inspected.
/// A check that does not answer within [`VERSION_CHECK_TIMEOUT`] is killed and the
/// path is rejected.
pub async fn is_valid_interpreter(path: &Path) -> bool {
    is_valid_interpreter_within(path, VERSION_CHECK_TIMEOUT).await
}

/// [`is_valid_interpreter`] with an explicit timeout.
pub async fn is_valid_interpreter_within(path: &Path, timeout: Duration) -> bool {
    let is_file = tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file());
    if !is_file || !is_executable(path) {
        return false;
    }

    let version = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, version).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            debug!(path = %path.display(), %err, "interpreter version check failed");
            return false;
        }
        Err(_elapsed) => {
            warn!(path = %path.display(), ?timeout, "interpreter version check timed out");
            return false;
        }
    };

    let banner = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr)
    } else {
        String::from_utf8_lossy(&output.stdout)
    };
    banner.trim().starts_with("Python")
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
}
