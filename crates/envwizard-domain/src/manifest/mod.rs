//! Dependency manifest readers and the normalized requirement model.
//!
//! Each reader extracts [`DependencySpec`] entries from one manifest format
//! and reports malformed content as non-fatal [`ParseWarning`]s. An absent or
//! empty manifest is a valid outcome, not an error.

mod normalize;
mod pipfile;
mod pyproject;
mod requirements;
mod setup_py;

pub use normalize::canonicalize_package_name;
pub use pipfile::read_pipfile;
pub use pyproject::{read_pyproject, read_requires_python};
pub use requirements::read_requirements;
pub use setup_py::read_setup_py;

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use indexmap::map::Entry;
use indexmap::IndexMap;
use pep508_rs::{Requirement as PepRequirement, VersionOrUrl};
use serde::Serialize;

/// One normalized dependency declaration.
///
/// Identity is the canonical `name` alone; `constraint` and `marker` are
/// carried as display strings for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencySpec {
    pub name: String,
    pub constraint: Option<String>,
    pub marker: Option<String>,
}

impl DependencySpec {
    /// A bare dependency on `name`, canonicalized.
    pub fn named(name: &str) -> Self {
        Self {
            name: canonicalize_package_name(name),
            constraint: None,
            marker: None,
        }
    }

    /// Parses one PEP 508 requirement string.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("empty requirement");
        }
        let requirement = match PepRequirement::from_str(trimmed) {
            Ok(requirement) => requirement,
            Err(err) => bail!("not a valid requirement: {err}"),
        };
        let constraint = requirement.version_or_url.map(|version_or_url| match version_or_url {
            VersionOrUrl::VersionSpecifier(specifiers) => specifiers.to_string(),
            VersionOrUrl::Url(url) => format!("@ {url}"),
        });
        Ok(Self {
            name: canonicalize_package_name(requirement.name.as_ref()),
            constraint,
            marker: requirement.marker.map(|marker| marker.to_string()),
        })
    }
}

/// A skipped manifest or dotenv line. Accumulated, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub source: String,
    pub line: Option<usize>,
    pub detail: String,
}

impl ParseWarning {
    pub fn new(source: impl Into<String>, line: Option<usize>, detail: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            line,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}: {}", self.source, self.detail),
            None => write!(f, "{}: {}", self.source, self.detail),
        }
    }
}

/// The manifest formats the scanner recognizes, in read order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestKind {
    Requirements,
    Pyproject,
    Pipfile,
    SetupPy,
}

impl ManifestKind {
    pub const ALL: [ManifestKind; 4] = [
        ManifestKind::Requirements,
        ManifestKind::Pyproject,
        ManifestKind::Pipfile,
        ManifestKind::SetupPy,
    ];

    pub const fn file_name(self) -> &'static str {
        match self {
            ManifestKind::Requirements => "requirements.txt",
            ManifestKind::Pyproject => "pyproject.toml",
            ManifestKind::Pipfile => "Pipfile",
            ManifestKind::SetupPy => "setup.py",
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Collapses duplicate declarations of the same canonical name into one
/// entry. The first occurrence fixes the position; later constraints and
/// markers replace earlier ones, while a bare re-declaration keeps whatever
/// was already recorded.
pub fn dedupe_dependencies(specs: Vec<DependencySpec>) -> Vec<DependencySpec> {
    let mut unique: IndexMap<String, DependencySpec> = IndexMap::new();
    for spec in specs {
        match unique.entry(spec.name.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                if spec.constraint.is_some() {
                    existing.constraint = spec.constraint;
                }
                if spec.marker.is_some() {
                    existing.marker = spec.marker;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(spec);
            }
        }
    }
    unique.into_values().collect()
}
