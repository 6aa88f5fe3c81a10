use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;

use crate::context::CommandContext;
use crate::outcome::CommandUserError;
use crate::process::run_command_with_timeout;

/// Version probing gets its own short deadline so `detect` stays snappy even
/// when the resolved interpreter hangs on startup.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const VERSION_PROBE: &str = "import sys; print('.'.join(map(str, sys.version_info[:3])))";

/// Resolves the Python interpreter to run, as a program name or path
/// suitable for `Command::new`.
///
/// Order: an explicitly requested version (`pythonX.Y` on `PATH`), then the
/// `ENVWIZARD_PYTHON` override, then `python3`, then `python`.
///
/// # Errors
/// Returns a [`CommandUserError`] when a requested version is not installed
/// or when no interpreter exists on `PATH` at all.
pub fn resolve_interpreter(ctx: &CommandContext, requested: Option<&str>) -> Result<String> {
    if let Some(version) = requested {
        let candidate = format!("python{version}");
        return match which::which(&candidate) {
            Ok(path) => Ok(path.display().to_string()),
            Err(_) => Err(CommandUserError::new(
                format!("Python {version} was not found on PATH"),
                json!({
                    "reason": "missing_interpreter",
                    "requested": version,
                    "hint": format!("Install Python {version} or rerun without --python."),
                }),
            )
            .into()),
        };
    }

    if let Some(override_path) = ctx.config().python().interpreter_override.as_deref() {
        tracing::debug!(interpreter = %override_path, "using ENVWIZARD_PYTHON override");
        return Ok(override_path.to_string());
    }

    for candidate in ["python3", "python"] {
        if let Ok(path) = which::which(candidate) {
            return Ok(path.display().to_string());
        }
    }

    Err(CommandUserError::new(
        "no Python interpreter found on PATH",
        json!({
            "reason": "missing_interpreter",
            "hint": "Install Python 3 or point ENVWIZARD_PYTHON at an interpreter.",
        }),
    )
    .into())
}

/// Asks an interpreter for its `X.Y.Z` version. Any failure, including a
/// hung interpreter, is reported as `None`.
pub fn probe_python_version(interpreter: &str, cwd: &Path) -> Option<String> {
    let args = ["-c".to_string(), VERSION_PROBE.to_string()];
    match run_command_with_timeout(interpreter, &args, cwd, PROBE_TIMEOUT) {
        Ok(output) if output.code == 0 => {
            let version = output.stdout.trim();
            if version.is_empty() {
                None
            } else {
                Some(version.to_string())
            }
        }
        Ok(output) => {
            tracing::debug!(interpreter, code = output.code, "version probe failed");
            None
        }
        Err(err) => {
            tracing::debug!(interpreter, error = %format!("{err:#}"), "version probe failed");
            None
        }
    }
}
