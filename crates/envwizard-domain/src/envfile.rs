//! Parsing of existing `.env` files and rendering of generated ones.
//!
//! Rendering groups variables under a header per contributing framework and
//! carries each variable's comment and provenance. Parsing is tolerant: it
//! exists so the reconciler can tell which keys are already present, not to
//! validate the file.

use indexmap::IndexMap;

use crate::manifest::ParseWarning;
use crate::synth::EnvVariable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFileKind {
    Env,
    Example,
}

impl EnvFileKind {
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Env => ".env",
            Self::Example => ".env.example",
        }
    }
}

/// A fully rendered dotenv file, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedEnvFile {
    pub kind: EnvFileKind,
    pub contents: String,
}

/// Key/value pairs recovered from an existing `.env`, plus warnings for the
/// lines that could not be read.
#[derive(Debug, Clone, Default)]
pub struct ExistingEnv {
    pub values: IndexMap<String, String>,
    pub warnings: Vec<ParseWarning>,
}

impl ExistingEnv {
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Reads `KEY=VALUE` lines, tolerating blanks, `#` comments, and an
/// `export ` prefix. Anything else is skipped with a warning.
pub fn parse_env_contents(contents: &str) -> ExistingEnv {
    let mut env = ExistingEnv::default();
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map_or(line, str::trim_start);
        match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                env.values.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => env.warnings.push(ParseWarning::new(
                ".env",
                Some(idx + 1),
                format!("not a KEY=VALUE line: `{raw}`"),
            )),
        }
    }
    env
}

pub fn render_env_file(kind: EnvFileKind, variables: &[EnvVariable]) -> GeneratedEnvFile {
    let mut contents = String::new();
    match kind {
        EnvFileKind::Env => {
            contents.push_str("# Environment configuration\n");
            contents.push_str(
                "# Generated by envwizard. Update placeholder values before running the app.\n",
            );
        }
        EnvFileKind::Example => {
            contents.push_str("# Example environment configuration\n");
            contents.push_str("# Copy to .env and replace the placeholders with real values.\n");
        }
    }
    contents.push_str(&render_section(variables));
    GeneratedEnvFile { kind, contents }
}

/// Renders variables grouped under their owner header. Starts with a blank
/// line so the block can be appended to an existing file as-is.
pub fn render_section(variables: &[EnvVariable]) -> String {
    let mut out = String::new();
    let mut current_label = None;
    for variable in variables {
        let label = variable.owner_label();
        if current_label != Some(label) {
            out.push_str(&format!("\n# {label}\n"));
            current_label = Some(label);
        }
        out.push_str(&format!("# {}\n", variable.annotated_comment()));
        out.push_str(&format!("{}={}\n", variable.key, variable.value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{parse_env_contents, render_env_file, render_section, EnvFileKind};
    use crate::signature::{Framework, ProjectProfile};
    use crate::synth::synthesize;

    fn variables(frameworks: &[Framework]) -> Vec<crate::synth::EnvVariable> {
        synthesize(&ProjectProfile::new(frameworks.to_vec(), Vec::new(), None))
    }

    #[test]
    fn parse_tolerates_comments_blanks_and_export() {
        let env = parse_env_contents(
            "# comment\n\nexport SECRET_KEY=abc123\nDEBUG=False\nDATABASE_URL=postgres://u:p@h/db?sslmode=require\n",
        );
        assert!(env.warnings.is_empty());
        assert_eq!(env.values.get("SECRET_KEY").map(String::as_str), Some("abc123"));
        assert_eq!(env.values.get("DEBUG").map(String::as_str), Some("False"));
        assert_eq!(
            env.values.get("DATABASE_URL").map(String::as_str),
            Some("postgres://u:p@h/db?sslmode=require")
        );
    }

    #[test]
    fn malformed_line_is_a_warning_with_its_number() {
        let env = parse_env_contents("GOOD=1\nthis line has no equals sign\n=missing-key\n");
        assert_eq!(env.values.len(), 1);
        assert_eq!(env.warnings.len(), 2);
        assert_eq!(env.warnings[0].line, Some(2));
        assert_eq!(env.warnings[1].line, Some(3));
        assert_eq!(env.warnings[0].source, ".env");
    }

    #[test]
    fn rendered_env_groups_by_framework_with_provenance() {
        let rendered =
            render_env_file(EnvFileKind::Env, &variables(&[Framework::Django, Framework::Flask]));
        let contents = &rendered.contents;

        assert!(contents.starts_with("# Environment configuration\n"));
        assert_eq!(contents.matches("\n# Django\n").count(), 1);
        assert_eq!(contents.matches("\n# Flask\n").count(), 1);
        assert_eq!(contents.matches("SECRET_KEY=").count(), 1);
        assert!(contents.contains("(also used by: Flask)"));
        assert!(contents.contains("FLASK_APP=app.py\n"));
    }

    #[test]
    fn example_file_uses_its_own_banner_and_same_keys() {
        let variables = variables(&[Framework::Redis]);
        let env = render_env_file(EnvFileKind::Env, &variables);
        let example = render_env_file(EnvFileKind::Example, &variables);

        assert!(example.contents.starts_with("# Example environment configuration\n"));
        assert!(example.contents.contains("REDIS_URL=redis://localhost:6379/0\n"));
        assert_eq!(env.kind.file_name(), ".env");
        assert_eq!(example.kind.file_name(), ".env.example");
    }

    #[test]
    fn section_starts_with_a_blank_line_for_appending() {
        let section = render_section(&variables(&[Framework::Pytest]));
        assert!(section.starts_with("\n# pytest\n"));
        assert!(section.ends_with("PYTEST_ADDOPTS=-ra\n"));
    }
}
