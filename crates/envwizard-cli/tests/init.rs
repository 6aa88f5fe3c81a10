use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;

mod common;

use common::{find_python, parse_json, stdout_text};

#[test]
fn init_prepares_venv_and_dotenv_without_install() {
    let Some(python) = find_python() else {
        eprintln!("skipping init test (python not found)");
        return;
    };
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("requirements.txt"), "flask>=3.0\n").expect("write requirements");
    let path = temp.path().to_string_lossy().to_string();

    let assert = cargo_bin_cmd!("envwizard")
        .env("ENVWIZARD_PYTHON", &python)
        .args(["--json", "init", "--path", &path, "--no-install"])
        .assert()
        .success();

    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "ok");
    assert!(payload["message"]
        .as_str()
        .expect("message")
        .contains("environment ready at "));
    assert_eq!(payload["details"]["frameworks"][0], "Flask");
    assert_eq!(payload["details"]["venv"]["status"], "ok");
    assert_eq!(payload["details"]["install"]["status"], "skipped");
    assert_eq!(payload["details"]["dotenv"]["status"], "ok");
    assert!(temp.path().join("venv/pyvenv.cfg").is_file());
    assert!(temp.path().join(".env").is_file());
    assert!(temp.path().join(".env.example").is_file());
}

#[test]
fn custom_venv_name_is_respected() {
    let Some(python) = find_python() else {
        eprintln!("skipping init test (python not found)");
        return;
    };
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().to_string_lossy().to_string();

    cargo_bin_cmd!("envwizard")
        .env("ENVWIZARD_PYTHON", &python)
        .args([
            "--json",
            "init",
            "--path",
            &path,
            "--venv-name",
            ".venv",
            "--no-install",
            "--no-dotenv",
        ])
        .assert()
        .success();

    assert!(temp.path().join(".venv/pyvenv.cfg").is_file());
    assert!(!temp.path().join(".env").exists());
}

#[cfg(unix)]
#[test]
fn failed_venv_stage_reports_partial_setup() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("requirements.txt"), "django\n").expect("write requirements");
    let path = temp.path().to_string_lossy().to_string();

    let assert = cargo_bin_cmd!("envwizard")
        .env("ENVWIZARD_PYTHON", "/bin/false")
        .args(["--json", "init", "--path", &path])
        .assert()
        .code(1);

    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "user-error");
    assert_eq!(payload["details"]["venv"]["status"], "failed");
    assert_eq!(payload["details"]["install"]["status"], "skipped");
    assert_eq!(payload["details"]["dotenv"]["status"], "ok");
    assert_eq!(payload["details"]["errors"].as_array().map(Vec::len), Some(1));
    assert!(temp.path().join(".env").is_file(), "dotenv stage should still run");
}

#[cfg(unix)]
#[test]
fn human_init_shows_detection_preview_and_stages() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("requirements.txt"), "fastapi\n").expect("write requirements");
    let path = temp.path().to_string_lossy().to_string();

    // stdin is not a terminal here, so the confirmation prompt is skipped.
    let assert = cargo_bin_cmd!("envwizard")
        .env("ENVWIZARD_PYTHON", "/bin/false")
        .args(["init", "--path", &path])
        .assert()
        .code(1);

    let output = stdout_text(&assert);
    assert!(
        output.contains("envwizard detect: detected FastAPI"),
        "preview missing: {output}"
    );
    assert!(output.contains("Frameworks: FastAPI"), "framework line missing: {output}");
    assert!(output.contains("venv:"), "venv stage missing: {output}");
    assert!(
        output.contains("dotenv: wrote .env and .env.example"),
        "dotenv stage missing: {output}"
    );
    assert!(output.contains("1 stage(s) failed"), "summary missing: {output}");
}
