#![allow(dead_code)]

use std::process::Command;

use assert_cmd::assert::Assert;
use serde_json::Value;

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn stdout_text(assert: &Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout")
}

/// Python-dependent tests skip themselves when no interpreter is installed.
pub fn find_python() -> Option<String> {
    for candidate in ["python3", "python"] {
        let found = Command::new(candidate)
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success());
        if found {
            return Some(candidate.to_string());
        }
    }
    None
}
