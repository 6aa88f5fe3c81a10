mod dotenv;
mod init;
mod install;
mod scan;
mod venv;

pub use dotenv::{dotenv_create, reconcile_env_files, DotenvCreateRequest, ReconcileReport};
pub use init::{project_init, ProjectInitRequest};
pub use install::{install_dependencies, InstallOutcome};
pub use scan::{project_detect, scan_project, ProjectDetectRequest, ScanReport};
pub use venv::{
    activation_command, create_virtualenv, venv_create, venv_python, VenvCreateRequest,
    VenvOutcome,
};

pub(crate) use dotenv::describe_reconcile;
pub(crate) use scan::{resolve_project_dir, scan_details};
