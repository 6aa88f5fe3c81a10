#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod envfile;
pub mod manifest;
pub mod signature;
pub mod synth;

pub use envfile::{
    parse_env_contents, render_env_file, render_section, EnvFileKind, ExistingEnv,
    GeneratedEnvFile,
};
pub use manifest::{
    canonicalize_package_name, dedupe_dependencies, read_pipfile, read_pyproject,
    read_requirements, read_requires_python, read_setup_py, DependencySpec, ManifestKind,
    ParseWarning,
};
pub use signature::{
    match_signatures, Framework, FrameworkSignature, ProjectProfile, VariableTemplate,
    GENERIC_VARIABLES, SIGNATURES,
};
pub use synth::{synthesize, EnvVariable};
