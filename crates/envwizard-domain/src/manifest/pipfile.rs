//! `Pipfile` reader for the `[packages]` and `[dev-packages]` tables.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use toml_edit::{DocumentMut, Item};

use super::{DependencySpec, ParseWarning};

const SOURCE: &str = "Pipfile";

pub fn read_pipfile(path: &Path) -> Result<(Vec<DependencySpec>, Vec<ParseWarning>)> {
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
    for section in ["packages", "dev-packages"] {
        let Some(table) = doc.get(section).and_then(Item::as_table_like) else {
            continue;
        };
        for (name, item) in table.iter() {
            let mut spec = DependencySpec::named(name);
            spec.constraint = pipfile_constraint(item);
            specs.push(spec);
        }
    }
    Ok((specs, warnings))
}

/// `"*"` means unconstrained; inline tables carry the pin under `version`.
fn pipfile_constraint(item: &Item) -> Option<String> {
    if let Some(raw) = item.as_str() {
        return (raw != "*").then(|| raw.to_string());
    }
    item.as_table_like()
        .and_then(|table| table.get("version"))
        .and_then(Item::as_str)
        .and_then(|raw| (raw != "*").then(|| raw.to_string()))
}
