use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Value};
use walkdir::{DirEntry, WalkDir};

use envwizard_domain::{
    dedupe_dependencies, match_signatures, read_pipfile, read_pyproject, read_requirements,
    read_requires_python, read_setup_py, DependencySpec, ManifestKind, ParseWarning,
    ProjectProfile,
};

use crate::context::CommandContext;
use crate::interpreter::{probe_python_version, resolve_interpreter};
use crate::outcome::{CommandUserError, ExecutionOutcome};

/// Directories below the root are walked this deep when looking for
/// structural trigger files.
const SCAN_DEPTH: usize = 3;
const MAX_DETECTED_FILES: usize = 200;
const SKIPPED_DIRS: [&str; 3] = ["__pycache__", "node_modules", "site-packages"];

#[derive(Debug, Clone, Default)]
pub struct ProjectDetectRequest {
    pub path: Option<PathBuf>,
}

/// Everything one scan learned about a project. The profile is the
/// synthesizer's input; the rest feeds reports and diagnostics.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub root: PathBuf,
    pub profile: ProjectProfile,
    pub dependencies: Vec<DependencySpec>,
    pub detected_files: Vec<String>,
    pub warnings: Vec<ParseWarning>,
}

/// Read-only scan: detection plus a report, no changes on disk.
///
/// # Errors
/// Returns an error when the project directory cannot be resolved or read.
pub fn project_detect(
    ctx: &CommandContext,
    request: ProjectDetectRequest,
) -> Result<ExecutionOutcome> {
    match project_detect_inner(ctx, &request) {
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

fn project_detect_inner(
    ctx: &CommandContext,
    request: &ProjectDetectRequest,
) -> Result<ExecutionOutcome> {
    let report = scan_project(ctx, request.path.as_deref())?;
    let frameworks: Vec<&str> = report
        .profile
        .frameworks()
        .iter()
        .map(|framework| framework.name())
        .collect();
    let message = if frameworks.is_empty() {
        "no frameworks detected".to_string()
    } else {
        format!("detected {}", frameworks.join(", "))
    };
    let details = scan_details(&report);
    Ok(ExecutionOutcome::success(message, details))
}

pub(crate) fn scan_details(report: &ScanReport) -> Value {
    json!({
        "path": report.root.display().to_string(),
        "frameworks": report
            .profile
            .frameworks()
            .iter()
            .map(|framework| framework.name())
            .collect::<Vec<_>>(),
        "dependency_files": report
            .profile
            .dependency_files()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        "python_version": report.profile.python_version(),
        "dependency_count": report.dependencies.len(),
        "detected_files": report.detected_files,
        "warnings": report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

/// Scans `path` (or the working directory): reads every manifest at the
/// root, walks the tree for structural trigger files, matches signatures,
/// and probes the Python version.
///
/// # Errors
/// Returns [`CommandUserError`] when the directory does not exist and an
/// ordinary error when it cannot be read.
pub fn scan_project(ctx: &CommandContext, path: Option<&Path>) -> Result<ScanReport> {
    let root = resolve_project_dir(ctx, path)?;
    fs::read_dir(&root).with_context(|| format!("failed to read {}", root.display()))?;

    let mut dependencies = Vec::new();
    let mut warnings = Vec::new();
    let mut dependency_files = Vec::new();
    for kind in ManifestKind::ALL {
        let manifest = root.join(kind.file_name());
        if !manifest.is_file() {
            continue;
        }
        dependency_files.push(kind);
        let (specs, mut kind_warnings) = match kind {
            ManifestKind::Requirements => read_requirements(&manifest)?,
            ManifestKind::Pyproject => read_pyproject(&manifest)?,
            ManifestKind::Pipfile => read_pipfile(&manifest)?,
            ManifestKind::SetupPy => read_setup_py(&manifest)?,
        };
        tracing::debug!(manifest = %kind, specs = specs.len(), "read manifest");
        dependencies.extend(specs);
        warnings.append(&mut kind_warnings);
    }
    let dependencies = dedupe_dependencies(dependencies);

    let (file_names, detected_files) = walk_project_files(&root);
    let frameworks = match_signatures(&dependencies, &file_names);
    let python_version = detect_python_version(ctx, &root);

    tracing::info!(
        path = %root.display(),
        frameworks = frameworks.len(),
        dependencies = dependencies.len(),
        "project scan finished"
    );

    Ok(ScanReport {
        root,
        profile: ProjectProfile::new(frameworks, dependency_files, python_version),
        dependencies,
        detected_files,
        warnings,
    })
}

/// Resolves the `--path` argument against the working directory. A missing
/// or non-directory target is a user error, not an internal failure.
pub(crate) fn resolve_project_dir(
    ctx: &CommandContext,
    path: Option<&Path>,
) -> Result<PathBuf> {
    let resolved = match path {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => ctx.working_dir()?.join(path),
        None => ctx.working_dir()?,
    };
    if resolved.is_dir() {
        Ok(resolved)
    } else {
        Err(CommandUserError::new(
            format!("{} is not a directory", resolved.display()),
            json!({
                "reason": "invalid_path",
                "path": resolved.display().to_string(),
                "hint": "Pass --path pointing at the project directory.",
            }),
        )
        .into())
    }
}

fn walk_project_files(root: &Path) -> (HashSet<String>, Vec<String>) {
    let mut file_names = HashSet::new();
    let mut detected_files = Vec::new();
    let walker = WalkDir::new(root)
        .max_depth(SCAN_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(keep_entry);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry during scan");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_interesting_file(&name) && detected_files.len() < MAX_DETECTED_FILES {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or_else(|_| entry.path())
                .display()
                .to_string();
            detected_files.push(relative);
        }
        file_names.insert(name);
    }
    (file_names, detected_files)
}

/// Walk filter: hidden directories, cache/vendor directories, and virtual
/// environments are not part of the project. The root itself always passes
/// so scans of dot-named directories work.
fn keep_entry(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
        return false;
    }
    !entry.path().join("pyvenv.cfg").is_file()
}

fn is_interesting_file(name: &str) -> bool {
    name.ends_with(".py")
        || name == "Pipfile"
        || name == "pyproject.toml"
        || name == "requirements.txt"
        || name == ".env"
        || name == ".env.example"
}

fn detect_python_version(ctx: &CommandContext, root: &Path) -> Option<String> {
    if let Ok(interpreter) = resolve_interpreter(ctx, None) {
        if let Some(version) = probe_python_version(&interpreter, root) {
            return Some(version);
        }
    }
    read_requires_python(&root.join(ManifestKind::Pyproject.file_name()))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use envwizard_domain::{Framework, ManifestKind};

    use super::{scan_project, ScanReport};
    use crate::config::GlobalOptions;
    use crate::context::CommandContext;
    use crate::outcome::CommandUserError;

    fn scan(path: &Path) -> ScanReport {
        let global = GlobalOptions::default();
        let ctx = CommandContext::new(&global);
        scan_project(&ctx, Some(path)).expect("scan")
    }

    #[test]
    fn empty_directory_yields_a_generic_profile() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = scan(dir.path());
        assert!(report.profile.is_generic());
        assert!(report.dependencies.is_empty());
        assert!(report.warnings.is_empty());
        assert!(report.profile.dependency_files().is_empty());
    }

    #[test]
    fn dependencies_and_structure_drive_detection() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("requirements.txt"),
            "Django>=4.2.0\npsycopg2-binary>=2.9.0\nredis\n",
        )
        .expect("write requirements");
        fs::write(dir.path().join("manage.py"), "#!/usr/bin/env python\n").expect("write manage");
        fs::create_dir(dir.path().join("tests")).expect("mkdir");
        fs::write(dir.path().join("tests/conftest.py"), "").expect("write conftest");

        let report = scan(dir.path());
        assert_eq!(
            report.profile.frameworks(),
            [Framework::Django, Framework::Redis, Framework::Postgres, Framework::Pytest]
        );
        assert_eq!(report.profile.dependency_files(), [ManifestKind::Requirements]);
        assert_eq!(report.dependencies.len(), 3);
        assert!(report.detected_files.iter().any(|file| file == "manage.py"));
    }

    #[test]
    fn duplicate_declarations_collapse_to_one_spec() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("requirements.txt"),
            "Flask==2.3.0\nflask>=2.0\nFLASK\n",
        )
        .expect("write");

        let report = scan(dir.path());
        assert_eq!(report.dependencies.len(), 1);
        assert_eq!(report.dependencies[0].name, "flask");
        assert_eq!(report.profile.frameworks(), [Framework::Flask]);
    }

    #[test]
    fn malformed_lines_warn_but_do_not_fail() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("requirements.txt"),
            "fastapi\nnot === a requirement\n",
        )
        .expect("write");

        let report = scan(dir.path());
        assert_eq!(report.profile.frameworks(), [Framework::FastApi]);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn hidden_and_virtualenv_directories_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join(".git")).expect("mkdir");
        fs::write(dir.path().join(".git/manage.py"), "").expect("write");
        fs::create_dir(dir.path().join("venv")).expect("mkdir");
        fs::write(dir.path().join("venv/pyvenv.cfg"), "home = /usr\n").expect("write");
        fs::write(dir.path().join("venv/conftest.py"), "").expect("write");

        let report = scan(dir.path());
        assert!(report.profile.is_generic());
        assert!(report.detected_files.is_empty());
    }

    #[test]
    fn missing_path_is_a_user_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let global = GlobalOptions::default();
        let ctx = CommandContext::new(&global);
        let err = scan_project(&ctx, Some(&dir.path().join("absent"))).expect_err("should fail");
        assert!(err.downcast_ref::<CommandUserError>().is_some());
    }

    #[test]
    fn manifests_from_multiple_formats_are_merged() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("requirements.txt"), "celery>=5.3\n").expect("write");
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"svc\"\ndependencies = [\"redis\"]\n",
        )
        .expect("write");

        let report = scan(dir.path());
        assert_eq!(report.profile.frameworks(), [Framework::Celery, Framework::Redis]);
        assert_eq!(
            report.profile.dependency_files(),
            [ManifestKind::Requirements, ManifestKind::Pyproject]
        );
    }
}
