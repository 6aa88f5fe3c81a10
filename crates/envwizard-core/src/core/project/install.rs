use std::path::Path;

use anyhow::Result;
use serde_json::json;

use envwizard_domain::ManifestKind;

use crate::context::CommandContext;
use crate::interpreter::resolve_interpreter;
use crate::outcome::CommandUserError;
use crate::process::{run_command_with_timeout, tail_lines};
use crate::project::venv_python;

const STDERR_TAIL: usize = 10;

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub installed: bool,
    pub message: String,
}

/// Installs project dependencies with pip, preferring the venv interpreter
/// when one exists. Manifest preference: `requirements.txt`, then
/// `pyproject.toml`, then `setup.py`. A Pipfile alone is reported, not
/// installed.
///
/// # Errors
/// Returns [`CommandUserError`] when pip exits non-zero and an ordinary
/// error when it cannot be spawned or times out.
pub fn install_dependencies(
    ctx: &CommandContext,
    root: &Path,
    venv: Option<&Path>,
) -> Result<InstallOutcome> {
    let Some((manifest, pip_args)) = installation_plan(root) else {
        if root.join(ManifestKind::Pipfile.file_name()).is_file() {
            return Ok(InstallOutcome {
                installed: false,
                message: "Pipfile found; pipenv workflows are not managed".to_string(),
            });
        }
        return Ok(InstallOutcome {
            installed: false,
            message: "no dependency file found".to_string(),
        });
    };

    let python = match venv {
        Some(dir) if dir.join("pyvenv.cfg").is_file() => venv_python(dir).display().to_string(),
        _ => resolve_interpreter(ctx, None)?,
    };
    tracing::info!(python = %python, manifest = %manifest, "installing dependencies");

    let output = run_command_with_timeout(&python, &pip_args, root, ctx.config().tool().timeout)?;
    if output.code != 0 {
        return Err(CommandUserError::new(
            format!("dependency installation failed (exit code {})", output.code),
            json!({
                "reason": "install_failed",
                "manifest": manifest.to_string(),
                "exit_code": output.code,
                "stderr": tail_lines(&output.stderr, STDERR_TAIL),
                "hint": "Run the pip command manually to see the full output.",
            }),
        )
        .into());
    }

    Ok(InstallOutcome {
        installed: true,
        message: format!("dependencies installed from {manifest}"),
    })
}

fn installation_plan(root: &Path) -> Option<(ManifestKind, Vec<String>)> {
    let pip = |tail: &[&str]| {
        let mut args = vec!["-m".to_string(), "pip".to_string(), "install".to_string()];
        args.extend(tail.iter().map(ToString::to_string));
        args
    };
    if root.join(ManifestKind::Requirements.file_name()).is_file() {
        return Some((
            ManifestKind::Requirements,
            pip(&["-r", ManifestKind::Requirements.file_name()]),
        ));
    }
    if root.join(ManifestKind::Pyproject.file_name()).is_file() {
        return Some((ManifestKind::Pyproject, pip(&["."])));
    }
    if root.join(ManifestKind::SetupPy.file_name()).is_file() {
        return Some((ManifestKind::SetupPy, pip(&["-e", "."])));
    }
    None
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::install_dependencies;
    use crate::config::{EnvSnapshot, GlobalOptions};
    use crate::context::CommandContext;
    use crate::outcome::CommandUserError;

    fn ctx_with<'a>(global: &'a GlobalOptions, python: &str) -> CommandContext<'a> {
        CommandContext::testing(global, EnvSnapshot::testing(&[("ENVWIZARD_PYTHON", python)]))
    }

    #[test]
    fn no_manifest_means_nothing_to_install() {
        let dir = tempfile::tempdir().expect("tempdir");
        let global = GlobalOptions::default();
        let ctx = ctx_with(&global, "/nonexistent/python");

        let outcome = install_dependencies(&ctx, dir.path(), None).expect("install");
        assert!(!outcome.installed);
        assert_eq!(outcome.message, "no dependency file found");
    }

    #[test]
    fn pipfile_alone_is_reported_not_installed() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Pipfile"), "[packages]\nflask = \"*\"\n").expect("write");
        let global = GlobalOptions::default();
        let ctx = ctx_with(&global, "/nonexistent/python");

        let outcome = install_dependencies(&ctx, dir.path(), None).expect("install");
        assert!(!outcome.installed);
        assert!(outcome.message.contains("pipenv"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_pip_surfaces_as_a_user_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("requirements.txt"), "flask\n").expect("write");
        let global = GlobalOptions::default();
        let ctx = ctx_with(&global, "/bin/false");

        let err = install_dependencies(&ctx, dir.path(), None).expect_err("must fail");
        let user = err.downcast_ref::<CommandUserError>().expect("user error");
        assert_eq!(user.details()["reason"], "install_failed");
        assert_eq!(user.details()["manifest"], "requirements.txt");
    }

    #[test]
    fn requirements_beat_pyproject_when_both_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("requirements.txt"), "flask\n").expect("write");
        fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"x\"\n").expect("write");

        let plan = super::installation_plan(dir.path()).expect("plan");
        assert_eq!(plan.0, super::ManifestKind::Requirements);
        assert_eq!(plan.1, ["-m", "pip", "install", "-r", "requirements.txt"]);
    }
}
