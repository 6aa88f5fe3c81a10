//! `requirements.txt` reader: one requirement per line, `#` comments,
//! `-r` includes, editable and VCS entries.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{DependencySpec, ParseWarning};

const VCS_PREFIXES: [&str; 4] = ["git+", "hg+", "bzr+", "svn+"];

/// Reads a requirements file, following `-r`/`--requirement` includes.
/// Malformed lines are skipped and reported; only an unreadable top-level
/// file is an error.
pub fn read_requirements(path: &Path) -> Result<(Vec<DependencySpec>, Vec<ParseWarning>)> {
    let mut specs = Vec::new();
    let mut warnings = Vec::new();
    let mut visited = HashSet::new();
    read_file(path, &mut visited, &mut specs, &mut warnings)?;
    Ok((specs, warnings))
}

fn read_file(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
    specs: &mut Vec<DependencySpec>,
    warnings: &mut Vec<ParseWarning>,
) -> Result<()> {
    let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Ok(());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let source = display_source(path);
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    for (idx, raw) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_inline_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(target) = include_target(line) {
            let nested = parent.join(target);
            tracing::debug!(path = %nested.display(), "following requirements include");
            if let Err(err) = read_file(&nested, visited, specs, warnings) {
                warnings.push(ParseWarning::new(
                    source.clone(),
                    Some(line_no),
                    format!("skipped include `{target}`: {err:#}"),
                ));
            }
            continue;
        }

        let line = strip_editable(line);
        if line.is_empty() {
            continue;
        }

        if VCS_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
            if let Some(egg_idx) = line.find("#egg=") {
                let egg = line[egg_idx + 5..].split(['&', ' ', '\t']).next().unwrap_or_default();
                let url = line[..egg_idx].trim_end();
                if !egg.is_empty() {
                    match DependencySpec::parse(&format!("{egg} @ {url}")) {
                        Ok(spec) => specs.push(spec),
                        Err(err) => warnings.push(ParseWarning::new(
                            source.clone(),
                            Some(line_no),
                            format!("skipped `{line}`: {err}"),
                        )),
                    }
                    continue;
                }
            }
            warnings.push(ParseWarning::new(
                source.clone(),
                Some(line_no),
                format!("skipped VCS requirement without an #egg= name: `{line}`"),
            ));
            continue;
        }

        // Remaining pip flags (--index-url, --hash, -c constraints, ...).
        if line.starts_with('-') {
            continue;
        }
        // Local path entries such as ".", "./pkg", or ".[dev]".
        if line.starts_with('.') || line.starts_with('/') {
            continue;
        }

        match DependencySpec::parse(line) {
            Ok(spec) => specs.push(spec),
            Err(err) => warnings.push(ParseWarning::new(
                source.clone(),
                Some(line_no),
                format!("skipped `{line}`: {err}"),
            )),
        }
    }
    Ok(())
}

/// Cuts the line at the first `#` that starts it or follows whitespace, so
/// URL fragments like `#egg=` survive.
fn strip_inline_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (idx, &byte) in bytes.iter().enumerate() {
        if byte == b'#' && (idx == 0 || bytes[idx - 1].is_ascii_whitespace()) {
            return &line[..idx];
        }
    }
    line
}

fn include_target(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix("--requirement")
        .or_else(|| line.strip_prefix("-r"))?;
    if !rest.is_empty() && !rest.starts_with([' ', '\t', '=']) {
        return None;
    }
    let target = rest.trim_start_matches([' ', '\t', '=']);
    (!target.is_empty()).then_some(target)
}

fn strip_editable(line: &str) -> &str {
    for prefix in ["--editable", "-e"] {
        if let Some(rest) = line.strip_prefix(prefix) {
            if rest.is_empty() {
                return "";
            }
            if rest.starts_with([' ', '\t', '=']) {
                return rest.trim_start_matches([' ', '\t', '=']);
            }
        }
    }
    line
}

fn display_source(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
