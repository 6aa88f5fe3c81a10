// Intended public API surface for `envwizard-core`.
//
// This module exists to keep the crate root small and make it explicit which
// types/functions are part of the stable interface used by the CLI and other
// crates.

pub use crate::core::config::context::CommandContext;
pub use crate::core::config::{Config, GlobalOptions, PythonConfig, ToolConfig};

pub use crate::core::project::{
    activation_command, create_virtualenv, dotenv_create, install_dependencies, project_detect,
    project_init, reconcile_env_files, scan_project, venv_create, venv_python, DotenvCreateRequest,
    InstallOutcome, ProjectDetectRequest, ProjectInitRequest, ReconcileReport, ScanReport,
    VenvCreateRequest, VenvOutcome,
};
pub use crate::core::python::interpreter::{probe_python_version, resolve_interpreter};
pub use crate::core::tooling::outcome::{CommandStatus, CommandUserError, ExecutionOutcome};
pub use crate::core::tooling::process::{
    run_command, run_command_with_timeout, tail_lines, RunOutput,
};
pub use crate::core::tooling::report::{format_status_message, to_json_response, CommandGroup};
