use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use envwizard_domain::{
    parse_env_contents, render_env_file, render_section, synthesize, EnvFileKind, EnvVariable,
    ParseWarning,
};

use crate::context::CommandContext;
use crate::outcome::{CommandUserError, ExecutionOutcome};
use crate::project::{scan_details, scan_project};

const GITIGNORE_BLOCK: &str = "\
# Environment
.env

# Python
__pycache__/
*.py[cod]
venv/
.venv/
";

#[derive(Debug, Clone, Default)]
pub struct DotenvCreateRequest {
    pub path: Option<PathBuf>,
}

/// What one reconciliation run did on disk.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub env_path: PathBuf,
    pub example_path: PathBuf,
    pub env_changed: bool,
    pub example_changed: bool,
    pub appended_keys: Vec<String>,
    pub preserved_keys: Vec<String>,
    pub warnings: Vec<ParseWarning>,
    pub gitignore_updated: bool,
}

/// Detection, synthesis, and reconciliation in one step.
///
/// # Errors
/// Returns an error when the project cannot be scanned or the files cannot
/// be written.
pub fn dotenv_create(
    ctx: &CommandContext,
    request: DotenvCreateRequest,
) -> Result<ExecutionOutcome> {
    match dotenv_create_inner(ctx, &request) {
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

fn dotenv_create_inner(
    ctx: &CommandContext,
    request: &DotenvCreateRequest,
) -> Result<ExecutionOutcome> {
    let report = scan_project(ctx, request.path.as_deref())?;
    let variables = synthesize(&report.profile);
    let reconcile = reconcile_env_files(&variables, &report.root)?;

    let message = describe_reconcile(&reconcile, variables.len());
    let mut warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();
    warnings.extend(reconcile.warnings.iter().map(ToString::to_string));
    let details = json!({
        "env_file": reconcile.env_path.display().to_string(),
        "example_file": reconcile.example_path.display().to_string(),
        "appended_keys": reconcile.appended_keys,
        "preserved_keys": reconcile.preserved_keys,
        "gitignore_updated": reconcile.gitignore_updated,
        "warnings": warnings,
        "detection": scan_details(&report),
    });
    Ok(ExecutionOutcome::success(message, details))
}

pub(crate) fn describe_reconcile(reconcile: &ReconcileReport, total: usize) -> String {
    if !reconcile.env_changed {
        ".env already up to date".to_string()
    } else if reconcile.appended_keys.len() == total && reconcile.preserved_keys.is_empty() {
        format!("wrote .env and .env.example ({total} variables)")
    } else {
        format!(
            "appended {} variable(s) to .env, kept {} existing",
            reconcile.appended_keys.len(),
            reconcile.preserved_keys.len()
        )
    }
}

/// Merges synthesized variables into the project's dotenv files.
///
/// An existing `.env` is only ever appended to: present keys keep their
/// bytes, orphans stay, and a run that adds nothing leaves the file
/// untouched. `.env.example` is regenerated from placeholders alone.
///
/// # Errors
/// Returns an error when a file cannot be read or written.
pub fn reconcile_env_files(variables: &[EnvVariable], root: &Path) -> Result<ReconcileReport> {
    let env_path = root.join(EnvFileKind::Env.file_name());
    let example_path = root.join(EnvFileKind::Example.file_name());
    let mut warnings = Vec::new();
    let mut appended_keys = Vec::new();
    let mut preserved_keys = Vec::new();
    let mut env_changed = false;

    if env_path.is_file() {
        let contents = fs::read_to_string(&env_path)
            .with_context(|| format!("failed to read {}", env_path.display()))?;
        let existing = parse_env_contents(&contents);
        for warning in &existing.warnings {
            tracing::warn!(%warning, "ignoring unreadable .env line");
        }
        warnings = existing.warnings.clone();

        let missing: Vec<EnvVariable> = variables
            .iter()
            .filter(|variable| !existing.contains_key(&variable.key))
            .cloned()
            .collect();
        preserved_keys = variables
            .iter()
            .filter(|variable| existing.contains_key(&variable.key))
            .map(|variable| variable.key.clone())
            .collect();

        if missing.is_empty() {
            tracing::debug!(path = %env_path.display(), "every synthesized key already present");
        } else {
            let mut updated = contents;
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(&render_section(&missing));
            fs::write(&env_path, updated)
                .with_context(|| format!("failed to write {}", env_path.display()))?;
            appended_keys = missing.into_iter().map(|variable| variable.key).collect();
            env_changed = true;
        }
    } else {
        let rendered = render_env_file(EnvFileKind::Env, variables);
        fs::write(&env_path, rendered.contents)
            .with_context(|| format!("failed to write {}", env_path.display()))?;
        appended_keys = variables.iter().map(|variable| variable.key.clone()).collect();
        env_changed = true;
    }

    let example = render_env_file(EnvFileKind::Example, variables);
    let example_changed = match fs::read_to_string(&example_path) {
        Ok(current) if current == example.contents => false,
        _ => {
            fs::write(&example_path, example.contents)
                .with_context(|| format!("failed to write {}", example_path.display()))?;
            true
        }
    };

    let gitignore_updated = ensure_gitignore(root)?;

    Ok(ReconcileReport {
        env_path,
        example_path,
        env_changed,
        example_changed,
        appended_keys,
        preserved_keys,
        warnings,
        gitignore_updated,
    })
}

/// Makes sure `.gitignore` covers `.env`, creating a minimal Python block
/// when the file does not exist. Returns whether anything was written.
fn ensure_gitignore(root: &Path) -> Result<bool> {
    let path = root.join(".gitignore");
    let Ok(contents) = fs::read_to_string(&path) else {
        fs::write(&path, GITIGNORE_BLOCK)
            .with_context(|| format!("failed to write {}", path.display()))?;
        return Ok(true);
    };
    if gitignore_covers_env(&contents) {
        return Ok(false);
    }
    let mut updated = contents;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str("\n# Environment\n.env\n");
    fs::write(&path, updated).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

fn gitignore_covers_env(contents: &str) -> bool {
    contents
        .lines()
        .map(str::trim)
        .any(|line| matches!(line, ".env" | ".env*" | "*.env" | "/.env"))
}
