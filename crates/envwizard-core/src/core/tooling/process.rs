use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

const DEFAULT_MAX_CAPTURE_BYTES: usize = 1024 * 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn max_capture_bytes() -> usize {
    std::env::var("ENVWIZARD_MAX_CAPTURE_BYTES")
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_CAPTURE_BYTES)
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

type CaptureHandle = thread::JoinHandle<Result<(String, bool)>>;

/// Execute a program and capture stdout/stderr.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or the I/O streams
/// cannot be read entirely.
pub fn run_command(program: &str, args: &[String], cwd: &Path) -> Result<RunOutput> {
    let (mut child, stdout_handle, stderr_handle) = spawn_captured(program, args, cwd)?;
    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {program}"))?;
    collect_output(program, status, stdout_handle, stderr_handle)
}

/// Execute a program with a hard wall-clock bound. Output is drained on
/// reader threads so a chatty child cannot fill a pipe and deadlock while
/// the parent polls for exit.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned, cannot be waited on,
/// or runs past `timeout` (the child is killed first).
pub fn run_command_with_timeout(
    program: &str,
    args: &[String],
    cwd: &Path,
    timeout: Duration,
) -> Result<RunOutput> {
    let (mut child, stdout_handle, stderr_handle) = spawn_captured(program, args, cwd)?;
    let start = Instant::now();
    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("failed to wait for {program}"))?
        {
            break status;
        }
        if start.elapsed() >= timeout {
            child.kill().ok();
            child.wait().ok();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            bail!("{program} timed out after {} seconds", timeout.as_secs());
        }
        thread::sleep(POLL_INTERVAL);
    };
    collect_output(program, status, stdout_handle, stderr_handle)
}

/// Last `limit` lines of captured output, for compact error details.
#[must_use]
pub fn tail_lines(text: &str, limit: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(limit);
    lines[start..].join("\n")
}

fn spawn_captured(
    program: &str,
    args: &[String],
    cwd: &Path,
) -> Result<(Child, CaptureHandle, CaptureHandle)> {
    let mut command = Command::new(program);
    command.args(args);
    command.current_dir(cwd);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("stdout missing for {program}"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow::anyhow!("stderr missing for {program}"))?;
    let limit = max_capture_bytes();
    let stdout_handle = thread::spawn(move || read_to_string_limited(stdout, limit));
    let stderr_handle = thread::spawn(move || read_to_string_limited(stderr, limit));
    Ok((child, stdout_handle, stderr_handle))
}

fn collect_output(
    _program: &str,
    status: ExitStatus,
    stdout_handle: CaptureHandle,
    stderr_handle: CaptureHandle,
) -> Result<RunOutput> {
    let code = status.code().unwrap_or(-1);
    let (mut stdout, stdout_truncated) = stdout_handle
        .join()
        .map_err(|_| anyhow::anyhow!("stdout thread panicked"))??;
    let (mut stderr, stderr_truncated) = stderr_handle
        .join()
        .map_err(|_| anyhow::anyhow!("stderr thread panicked"))??;
    if stdout_truncated {
        stdout.push_str("\n[...truncated...]\n");
    }
    if stderr_truncated {
        stderr.push_str("\n[...truncated...]\n");
    }
    Ok(RunOutput {
        code,
        stdout,
        stderr,
    })
}

fn read_to_string_limited(mut reader: impl Read, limit: usize) -> Result<(String, bool)> {
    let mut buffer = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        append_limited(&mut buffer, &chunk[..read], limit, &mut truncated);
    }
    Ok((String::from_utf8_lossy(&buffer).to_string(), truncated))
}

fn append_limited(buffer: &mut Vec<u8>, chunk: &[u8], limit: usize, truncated: &mut bool) {
    if buffer.len() >= limit {
        *truncated = true;
        return;
    }
    let remaining = limit - buffer.len();
    if chunk.len() > remaining {
        buffer.extend_from_slice(&chunk[..remaining]);
        *truncated = true;
    } else {
        buffer.extend_from_slice(chunk);
    }
}
