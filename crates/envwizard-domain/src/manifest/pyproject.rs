//! `pyproject.toml` reader covering PEP 621 metadata and Poetry tables.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use toml_edit::{DocumentMut, Item, TableLike};

use super::{DependencySpec, ParseWarning};

const SOURCE: &str = "pyproject.toml";

/// Reads `[project.dependencies]`, `[project.optional-dependencies]`, and
/// the Poetry dependency tables. Unparseable TOML yields one warning and an
/// empty set.
pub fn read_pyproject(path: &Path) -> Result<(Vec<DependencySpec>, Vec<ParseWarning>)> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut warnings = Vec::new();
    let doc = match DocumentMut::from_str(&contents) {
        Ok(doc) => doc,
        Err(err) => {
            warnings.push(ParseWarning::new(SOURCE, None, format!("invalid TOML: {err}")));
            return Ok((Vec::new(), warnings));
        }
    };

    let mut specs = Vec::new();
    if let Some(project) = doc.get("project").and_then(Item::as_table_like) {
        if let Some(array) = project.get("dependencies").and_then(Item::as_array) {
            collect_pep508_array(array, &mut specs, &mut warnings);
        }
        if let Some(extras) = project.get("optional-dependencies").and_then(Item::as_table_like) {
            for (_, item) in extras.iter() {
                if let Some(array) = item.as_array() {
                    collect_pep508_array(array, &mut specs, &mut warnings);
                }
            }
        }
    }

    if let Some(poetry) = poetry_table(&doc) {
        if let Some(deps) = poetry.get("dependencies").and_then(Item::as_table_like) {
            collect_poetry_table(deps, &mut specs);
        }
        if let Some(deps) = poetry.get("dev-dependencies").and_then(Item::as_table_like) {
            collect_poetry_table(deps, &mut specs);
        }
        if let Some(groups) = poetry.get("group").and_then(Item::as_table_like) {
            for (_, group) in groups.iter() {
                let deps = group
                    .as_table_like()
                    .and_then(|group| group.get("dependencies"))
                    .and_then(Item::as_table_like);
                if let Some(deps) = deps {
                    collect_poetry_table(deps, &mut specs);
                }
            }
        }
    }

    Ok((specs, warnings))
}

/// Returns the `[project.requires-python]` specifier when present and valid.
pub fn read_requires_python(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let doc = DocumentMut::from_str(&contents).ok()?;
    let raw = doc
        .get("project")
        .and_then(Item::as_table_like)
        .and_then(|project| project.get("requires-python"))
        .and_then(Item::as_str)?;
    pep440_rs::VersionSpecifiers::from_str(raw).ok()?;
    Some(raw.to_string())
}

fn poetry_table(doc: &DocumentMut) -> Option<&dyn TableLike> {
    doc.get("tool")
        .and_then(Item::as_table_like)
        .and_then(|tool| tool.get("poetry"))
        .and_then(Item::as_table_like)
}

fn collect_pep508_array(
    array: &toml_edit::Array,
    specs: &mut Vec<DependencySpec>,
    warnings: &mut Vec<ParseWarning>,
) {
    for value in array {
        let Some(raw) = value.as_str() else {
            continue;
        };
        match DependencySpec::parse(raw) {
            Ok(spec) => specs.push(spec),
            Err(err) => {
                warnings.push(ParseWarning::new(SOURCE, None, format!("skipped `{raw}`: {err}")));
            }
        }
    }
}

/// Poetry constraints (`^4.2`, `*`, inline tables) are not PEP 508, so the
/// name is taken from the key and the constraint kept verbatim.
fn collect_poetry_table(table: &dyn TableLike, specs: &mut Vec<DependencySpec>) {
    for (name, item) in table.iter() {
        if name.eq_ignore_ascii_case("python") {
            continue;
        }
        let mut spec = DependencySpec::named(name);
        spec.constraint = poetry_constraint(item);
        specs.push(spec);
    }
}

fn poetry_constraint(item: &Item) -> Option<String> {
    if let Some(raw) = item.as_str() {
        return (raw != "*").then(|| raw.to_string());
    }
    item.as_table_like()
        .and_then(|table| table.get("version"))
        .and_then(Item::as_str)
        .and_then(|raw| (raw != "*").then(|| raw.to_string()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{read_pyproject, read_requires_python};

    fn write_manifest(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pyproject.toml");
        fs::write(&path, contents).expect("write");
        (dir, path)
    }

    #[test]
    fn reads_pep621_dependencies_and_extras() {
        let (_dir, path) = write_manifest(
            r#"
[project]
name = "svc"
requires-python = ">=3.10"
dependencies = ["fastapi>=0.110", "uvicorn[standard]"]

[project.optional-dependencies]
test = ["pytest>=8"]
"#,
        );

        let (specs, warnings) = read_pyproject(&path).expect("read");
        let names: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
        assert_eq!(names, ["fastapi", "uvicorn", "pytest"]);
        assert!(warnings.is_empty());
        assert_eq!(read_requires_python(&path).as_deref(), Some(">=3.10"));
    }

    #[test]
    fn reads_poetry_tables_and_skips_python_entry() {
        let (_dir, path) = write_manifest(
            r#"
[tool.poetry.dependencies]
python = "^3.11"
django = "^4.2"
redis = "*"
celery = { version = ">=5.3", extras = ["redis"] }

[tool.poetry.group.dev.dependencies]
pytest = "^8.0"
"#,
        );

        let (specs, warnings) = read_pyproject(&path).expect("read");
        assert!(warnings.is_empty());
        let names: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
        assert_eq!(names, ["django", "redis", "celery", "pytest"]);
        assert_eq!(specs[0].constraint.as_deref(), Some("^4.2"));
        assert_eq!(specs[1].constraint, None);
        assert_eq!(specs[2].constraint.as_deref(), Some(">=5.3"));
    }

    #[test]
    fn invalid_toml_is_a_single_warning() {
        let (_dir, path) = write_manifest("[project\ndependencies = [");

        let (specs, warnings) = read_pyproject(&path).expect("read");
        assert!(specs.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].detail.contains("invalid TOML"));
    }

    #[test]
    fn bad_requirement_string_is_skipped_with_warning() {
        let (_dir, path) = write_manifest(
            r#"
[project]
dependencies = ["flask", "not === a requirement"]
"#,
        );

        let (specs, warnings) = read_pyproject(&path).expect("read");
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "flask");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn requires_python_rejects_invalid_specifiers() {
        let (_dir, path) = write_manifest(
            r#"
[project]
requires-python = "three point ten"
"#,
        );

        assert_eq!(read_requires_python(&path), None);
    }
}
