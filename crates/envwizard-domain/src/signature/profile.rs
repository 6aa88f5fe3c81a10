use crate::manifest::ManifestKind;
use crate::signature::Framework;

/// Immutable snapshot of one scan: which frameworks matched, which manifest
/// files were found, and the Python version when one could be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProfile {
    frameworks: Vec<Framework>,
    dependency_files: Vec<ManifestKind>,
    python_version: Option<String>,
}

impl ProjectProfile {
    pub fn new(
        mut frameworks: Vec<Framework>,
        mut dependency_files: Vec<ManifestKind>,
        python_version: Option<String>,
    ) -> Self {
        frameworks.sort();
        frameworks.dedup();
        dependency_files.sort();
        dependency_files.dedup();
        Self { frameworks, dependency_files, python_version }
    }

    pub fn frameworks(&self) -> &[Framework] {
        &self.frameworks
    }

    pub fn dependency_files(&self) -> &[ManifestKind] {
        &self.dependency_files
    }

    pub fn python_version(&self) -> Option<&str> {
        self.python_version.as_deref()
    }

    pub fn has(&self, framework: Framework) -> bool {
        self.frameworks.contains(&framework)
    }

    /// True when no framework signature matched.
    pub fn is_generic(&self) -> bool {
        self.frameworks.is_empty()
    }
}
