use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::outcome::{CommandStatus, ExecutionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandGroup {
    Init,
    Detect,
    CreateVenv,
    CreateDotenv,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Init => "init",
            CommandGroup::Detect => "detect",
            CommandGroup::CreateVenv => "create-venv",
            CommandGroup::CreateDotenv => "create-dotenv",
        };
        f.write_str(name)
    }
}

#[must_use]
pub fn to_json_response(group: CommandGroup, outcome: &ExecutionOutcome) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "message": format_status_message(group, &outcome.message),
        "details": details,
    })
}

#[must_use]
pub fn format_status_message(group: CommandGroup, message: &str) -> String {
    let prefix = format!("envwizard {group}");
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}
