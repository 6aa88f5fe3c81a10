use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::json;

use crate::context::CommandContext;
use crate::interpreter::resolve_interpreter;
use crate::outcome::{CommandUserError, ExecutionOutcome};
use crate::process::{run_command_with_timeout, tail_lines};
use crate::project::resolve_project_dir;

const STDERR_TAIL: usize = 5;

#[derive(Debug, Clone)]
pub struct VenvCreateRequest {
    pub path: Option<PathBuf>,
    pub name: String,
    pub python: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VenvOutcome {
    pub created: bool,
    pub message: String,
    pub path: PathBuf,
}

/// Standalone `create-venv` entry point.
///
/// # Errors
/// Returns an error when the interpreter cannot be spawned or times out.
pub fn venv_create(ctx: &CommandContext, request: VenvCreateRequest) -> Result<ExecutionOutcome> {
    match venv_create_inner(ctx, &request) {
        Ok(outcome) => Ok(outcome),
        Err(err) => match err.downcast::<CommandUserError>() {
            Ok(user) => Ok(ExecutionOutcome::user_error(
                user.message().to_string(),
                user.details().clone(),
            )),
            Err(err) => Err(err),
        },
    }
}

fn venv_create_inner(
    ctx: &CommandContext,
    request: &VenvCreateRequest,
) -> Result<ExecutionOutcome> {
    let root = resolve_project_dir(ctx, request.path.as_deref())?;
    let outcome = create_virtualenv(ctx, &root, &request.name, request.python.as_deref())?;
    let details = json!({
        "path": outcome.path.display().to_string(),
        "created": outcome.created,
        "activation": activation_command(&outcome.path),
    });
    Ok(ExecutionOutcome::success(outcome.message, details))
}

/// Creates `root/name` with `python -m venv`, unless a virtual environment
/// already lives there.
///
/// # Errors
/// Returns [`CommandUserError`] when no usable interpreter exists or the
/// venv module exits non-zero, and an ordinary error when the interpreter
/// cannot be spawned or times out.
pub fn create_virtualenv(
    ctx: &CommandContext,
    root: &Path,
    name: &str,
    python: Option<&str>,
) -> Result<VenvOutcome> {
    let dir = root.join(name);
    if dir.join("pyvenv.cfg").is_file() {
        return Ok(VenvOutcome {
            created: false,
            message: format!("virtual environment already exists at {}", dir.display()),
            path: dir,
        });
    }

    let interpreter = resolve_interpreter(ctx, python)?;
    tracing::info!(interpreter = %interpreter, path = %dir.display(), "creating virtual environment");
    let args = [
        "-m".to_string(),
        "venv".to_string(),
        dir.display().to_string(),
    ];
    let output = run_command_with_timeout(&interpreter, &args, root, ctx.config().tool().timeout)?;
    if output.code != 0 {
        return Err(CommandUserError::new(
            format!("failed to create virtual environment (exit code {})", output.code),
            json!({
                "reason": "venv_failed",
                "exit_code": output.code,
                "stderr": tail_lines(&output.stderr, STDERR_TAIL),
                "hint": "Check that the selected interpreter ships the `venv` module.",
            }),
        )
        .into());
    }

    Ok(VenvOutcome {
        created: true,
        message: format!("created virtual environment at {}", dir.display()),
        path: dir,
    })
}

/// The shell line that activates the environment, for display only.
#[must_use]
pub fn activation_command(venv: &Path) -> String {
    if cfg!(windows) {
        format!("{}\\Scripts\\activate", venv.display())
    } else {
        format!("source {}/bin/activate", venv.display())
    }
}

/// Path of the interpreter inside a virtual environment.
#[must_use]
pub fn venv_python(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join("python.exe")
    } else {
        venv.join("bin").join("python")
    }
}
