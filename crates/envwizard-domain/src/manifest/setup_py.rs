//! Best-effort static scan of `setup.py`. Only literal `install_requires`
//! lists (directly inline or through one module-level variable) are read;
//! anything computed at runtime is reported as a warning.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::{DependencySpec, ParseWarning};

const SOURCE: &str = "setup.py";

pub fn read_setup_py(path: &Path) -> Result<(Vec<DependencySpec>, Vec<ParseWarning>)> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut specs = Vec::new();
    let mut warnings = Vec::new();

    match install_requires_entries(&contents) {
        Some(entries) => {
            for raw in entries {
                if raw.trim().is_empty() {
                    continue;
                }
                match DependencySpec::parse(&raw) {
                    Ok(spec) => specs.push(spec),
                    Err(err) => warnings.push(ParseWarning::new(
                        SOURCE,
                        None,
                        format!("skipped `{raw}`: {err}"),
                    )),
                }
            }
        }
        None => {
            if contents.contains("install_requires") {
                warnings.push(ParseWarning::new(
                    SOURCE,
                    None,
                    "install_requires is not a static list; dependencies were not read",
                ));
            }
        }
    }
    Ok((specs, warnings))
}

fn install_requires_entries(contents: &str) -> Option<Vec<String>> {
    let rest = value_after_kwarg(contents, "install_requires")?;
    if rest.starts_with('[') {
        return Some(extract_string_literals(list_body(rest)?));
    }
    let variable: String = rest
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect();
    if variable.is_empty() {
        return None;
    }
    Some(extract_string_literals(variable_list_body(contents, &variable)?))
}

/// Finds `name = <expr>` (or `name=<expr>`) and returns the text starting at
/// the expression. `==` comparisons and longer identifiers do not match.
fn value_after_kwarg<'a>(contents: &'a str, name: &str) -> Option<&'a str> {
    for (idx, _) in contents.match_indices(name) {
        if idx > 0 {
            let prev = contents.as_bytes()[idx - 1];
            if prev == b'_' || prev.is_ascii_alphanumeric() {
                continue;
            }
        }
        let after = contents[idx + name.len()..].trim_start();
        let Some(rest) = after.strip_prefix('=') else {
            continue;
        };
        if rest.starts_with('=') {
            continue;
        }
        return Some(rest.trim_start());
    }
    None
}

fn variable_list_body<'a>(contents: &'a str, name: &str) -> Option<&'a str> {
    let rest = value_after_kwarg(contents, name)?;
    if rest.starts_with('[') {
        return list_body(rest);
    }
    None
}

/// Returns the text between a `[` at the start of `text` and its matching
/// `]`, ignoring brackets inside string literals and `#` comments.
fn list_body(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut in_comment = false;
    for (idx, ch) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '#' => in_comment = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[1..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn extract_string_literals(body: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut value = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut in_comment = false;
    for ch in body.chars() {
        if let Some(open) = quote {
            if escaped {
                value.push(ch);
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                literals.push(std::mem::take(&mut value));
                quote = None;
            } else {
                value.push(ch);
            }
            continue;
        }
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '#' => in_comment = true,
            _ => {}
        }
    }
    literals
}
