use std::path::PathBuf;

use anyhow::Result;
use serde_json::{json, Value};

use envwizard_domain::synthesize;

use crate::context::CommandContext;
use crate::outcome::{CommandUserError, ExecutionOutcome};
use crate::project::{
    activation_command, create_virtualenv, describe_reconcile, install_dependencies,
    reconcile_env_files, scan_project,
};

#[derive(Debug, Clone)]
pub struct ProjectInitRequest {
    pub path: Option<PathBuf>,
    pub venv_name: String,
    pub install: bool,
    pub dotenv: bool,
    pub python: Option<String>,
}

/// Full workflow: scan, create the virtual environment, install
/// dependencies, reconcile dotenv files. Stages run best-effort; one
/// failing stage never stops the later ones it does not feed.
///
/// # Errors
/// Returns an error when the scan itself fails. Stage failures are
/// accumulated and reported in the outcome instead.
pub fn project_init(ctx: &CommandContext, request: ProjectInitRequest) -> Result<ExecutionOutcome> {
    match project_init_inner(ctx, &request) {
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

fn project_init_inner(
    ctx: &CommandContext,
    request: &ProjectInitRequest,
) -> Result<ExecutionOutcome> {
    let report = scan_project(ctx, request.path.as_deref())?;
    let variables = synthesize(&report.profile);
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();

    let (venv_stage, venv_path) = match create_virtualenv(
        ctx,
        &report.root,
        &request.venv_name,
        request.python.as_deref(),
    ) {
        Ok(outcome) => {
            let stage = json!({
                "status": "ok",
                "message": outcome.message,
                "path": outcome.path.display().to_string(),
                "activation": activation_command(&outcome.path),
            });
            (stage, Some(outcome.path))
        }
        Err(err) => (stage_failure(&mut errors, &err), None),
    };

    let install_stage = if !request.install {
        stage_skipped("skipped (--no-install)")
    } else if let Some(venv) = venv_path.as_deref() {
        match install_dependencies(ctx, &report.root, Some(venv)) {
            Ok(outcome) if outcome.installed => json!({
                "status": "ok",
                "message": outcome.message,
            }),
            Ok(outcome) => stage_skipped(&outcome.message),
            Err(err) => stage_failure(&mut errors, &err),
        }
    } else {
        stage_skipped("skipped because the virtual environment stage failed")
    };

    let dotenv_stage = if !request.dotenv {
        stage_skipped("skipped (--no-dotenv)")
    } else {
        match reconcile_env_files(&variables, &report.root) {
            Ok(reconcile) => {
                warnings.extend(reconcile.warnings.iter().map(ToString::to_string));
                json!({
                    "status": "ok",
                    "message": describe_reconcile(&reconcile, variables.len()),
                    "env_file": reconcile.env_path.display().to_string(),
                    "appended_keys": reconcile.appended_keys,
                })
            }
            Err(err) => stage_failure(&mut errors, &err),
        }
    };

    let failed = errors.len();
    let details = json!({
        "path": report.root.display().to_string(),
        "frameworks": report
            .profile
            .frameworks()
            .iter()
            .map(|framework| framework.name())
            .collect::<Vec<_>>(),
        "python_version": report.profile.python_version(),
        "venv": venv_stage,
        "install": install_stage,
        "dotenv": dotenv_stage,
        "errors": errors,
        "warnings": warnings,
    });

    if failed == 0 {
        Ok(ExecutionOutcome::success(
            format!("environment ready at {}", report.root.display()),
            details,
        ))
    } else {
        Ok(ExecutionOutcome::user_error(
            format!("{failed} stage(s) failed"),
            details,
        ))
    }
}

fn stage_skipped(message: &str) -> Value {
    json!({"status": "skipped", "message": message})
}

fn stage_failure(errors: &mut Vec<String>, err: &anyhow::Error) -> Value {
    let message = format!("{err:#}");
    tracing::warn!(error = %message, "init stage failed");
    errors.push(message.clone());
    json!({"status": "failed", "message": message})
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{project_init, ProjectInitRequest};
    use crate::config::{EnvSnapshot, GlobalOptions};
    use crate::context::CommandContext;
    use crate::outcome::CommandStatus;

    fn request(path: &Path, install: bool, dotenv: bool) -> ProjectInitRequest {
        ProjectInitRequest {
            path: Some(path.to_path_buf()),
            venv_name: "venv".to_string(),
            install,
            dotenv,
            python: None,
        }
    }

    fn seed_venv(root: &Path) {
        fs::create_dir(root.join("venv")).expect("mkdir");
        fs::write(root.join("venv/pyvenv.cfg"), "home = /usr\n").expect("write");
    }

    #[test]
    fn init_with_existing_venv_finishes_without_python() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_venv(dir.path());
        fs::write(dir.path().join("requirements.txt"), "flask\n").expect("write");

        let global = GlobalOptions::default();
        let ctx = CommandContext::testing(&global, EnvSnapshot::testing(&[]));
        let outcome =
            project_init(&ctx, request(dir.path(), false, true)).expect("init");

        assert_eq!(outcome.status, CommandStatus::Ok);
        assert!(outcome.message.starts_with("environment ready at "));
        assert_eq!(outcome.details["venv"]["status"], "ok");
        assert_eq!(outcome.details["install"]["status"], "skipped");
        assert_eq!(outcome.details["dotenv"]["status"], "ok");
        assert_eq!(outcome.details["frameworks"][0], "Flask");
        assert!(dir.path().join(".env").is_file());
        assert!(dir.path().join(".env.example").is_file());
    }

    #[test]
    fn skipping_dotenv_leaves_no_env_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_venv(dir.path());

        let global = GlobalOptions::default();
        let ctx = CommandContext::testing(&global, EnvSnapshot::testing(&[]));
        let outcome =
            project_init(&ctx, request(dir.path(), false, false)).expect("init");

        assert_eq!(outcome.status, CommandStatus::Ok);
        assert_eq!(outcome.details["dotenv"]["status"], "skipped");
        assert!(!dir.path().join(".env").exists());
    }

    #[cfg(unix)]
    #[test]
    fn venv_failure_is_collected_and_later_stages_still_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("requirements.txt"), "django\n").expect("write");

        let global = GlobalOptions::default();
        let ctx = CommandContext::testing(
            &global,
            EnvSnapshot::testing(&[("ENVWIZARD_PYTHON", "/bin/false")]),
        );
        let outcome =
            project_init(&ctx, request(dir.path(), true, true)).expect("init");

        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(outcome.message, "1 stage(s) failed");
        assert_eq!(outcome.details["venv"]["status"], "failed");
        assert_eq!(outcome.details["install"]["status"], "skipped");
        assert_eq!(outcome.details["dotenv"]["status"], "ok");
        assert_eq!(outcome.details["errors"].as_array().map(Vec::len), Some(1));
        assert!(dir.path().join(".env").is_file());
    }
}
