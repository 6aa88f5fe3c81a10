//! Variable synthesis: turns a [`ProjectProfile`] into one flat, ordered,
//! duplicate-free list of environment variables.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::signature::{Framework, ProjectProfile, VariableTemplate, GENERIC_VARIABLES, SIGNATURES};

/// A synthesized variable: the key, its placeholder default, the comment for
/// the generated file, and every framework that asked for it (merge order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVariable {
    pub key: String,
    pub value: String,
    pub comment: String,
    pub owners: Vec<Framework>,
}

impl EnvVariable {
    fn from_template(template: &VariableTemplate, owners: Vec<Framework>) -> Self {
        Self {
            key: template.key.to_string(),
            value: template.default.to_string(),
            comment: template.comment.to_string(),
            owners,
        }
    }

    /// Group label for rendered output: the first owner, or a generic label
    /// for fallback variables.
    pub fn owner_label(&self) -> &'static str {
        self.owners.first().copied().map_or("Application", Framework::name)
    }

    /// Comment annotated with the merged-in owners beyond the first.
    pub fn annotated_comment(&self) -> String {
        if self.owners.len() > 1 {
            let also: Vec<&str> = self.owners[1..].iter().copied().map(Framework::name).collect();
            format!("{} (also used by: {})", self.comment, also.join(", "))
        } else {
            self.comment.clone()
        }
    }
}

/// Merges the variable templates of every matched framework, in registry
/// priority order. A key already emitted is not repeated; the later framework
/// is recorded on the existing entry's owner list instead. An unmatched
/// profile falls back to the generic set, so the result is never empty.
pub fn synthesize(profile: &ProjectProfile) -> Vec<EnvVariable> {
    let mut merged: IndexMap<&'static str, EnvVariable> = IndexMap::new();
    for signature in SIGNATURES.iter().filter(|signature| profile.has(signature.framework)) {
        for template in signature.variables {
            match merged.entry(template.key) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().owners.push(signature.framework);
                    tracing::debug!(
                        key = template.key,
                        framework = signature.framework.name(),
                        "variable already emitted; recording extra owner"
                    );
                }
                Entry::Vacant(entry) => {
                    entry.insert(EnvVariable::from_template(template, vec![signature.framework]));
                }
            }
        }
    }

    if merged.is_empty() {
        return GENERIC_VARIABLES
            .iter()
            .map(|template| EnvVariable::from_template(template, Vec::new()))
            .collect();
    }
    merged.into_values().collect()
}
