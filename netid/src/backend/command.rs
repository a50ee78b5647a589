use std::io;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use super::BackendError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Run `program` with `args`, killing it if it outlives `timeout`.
///
/// Returns trimmed stdout on a zero exit status. Arguments are passed
/// directly to the process; no shell is involved.
pub fn run_with_timeout(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, BackendError> {
    debug!("exec {program} {}", args.join(" "));
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| spawn_error(program, &err))?;

    let deadline = Instant::now() + timeout;
    loop {
        let exited = child
            .try_wait()
            .map_err(|err| BackendError::Failed(format!("waiting for {program}: {err}")))?;
        if exited.is_some() {
            break;
        }
        if Instant::now() >= deadline {
            // Best effort; the process may have exited between the checks.
            let _ = child.kill();
            let _ = child.wait();
            return Err(BackendError::Timeout {
                operation: "command",
                after: timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }

    let output = child
        .wait_with_output()
        .map_err(|err| BackendError::Failed(format!("collecting {program} output: {err}")))?;
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(classify_failure(program, output.status.code(), &stderr))
}

fn spawn_error(program: &str, err: &io::Error) -> BackendError {
    match err.kind() {
        io::ErrorKind::NotFound => {
            BackendError::Unavailable(format!("`{program}` is not installed or not on PATH"))
        }
        io::ErrorKind::PermissionDenied => {
            BackendError::PermissionDenied(format!("cannot execute `{program}`"))
        }
        _ => BackendError::Failed(format!("failed to start `{program}`: {err}")),
    }
}

/// Map a failed tool invocation onto the closed error set. Tool diagnostics
/// are only inspected here, at the platform edge.
fn classify_failure(program: &str, code: Option<i32>, stderr: &str) -> BackendError {
    let detail = if stderr.is_empty() {
        format!("`{program}` exited with status {code:?}")
    } else {
        format!("`{program}`: {stderr}")
    };

    let lowered = stderr.to_ascii_lowercase();
    if lowered.contains("operation not permitted") || lowered.contains("permission denied") {
        BackendError::PermissionDenied(detail)
    } else if lowered.contains("cannot find device") || lowered.contains("does not exist") {
        BackendError::NotFound(detail)
    } else {
        BackendError::Failed(detail)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::{classify_failure, run_with_timeout};
    use crate::backend::BackendError;

    #[test]
    fn returns_trimmed_stdout() {
        let out = run_with_timeout("sh", &["-c", "echo ' hi '"], Duration::from_secs(5))
            .expect("run");
        assert_eq!(out, "hi");
    }

    #[test]
    fn kills_process_at_deadline() {
        let err = run_with_timeout("sh", &["-c", "sleep 5"], Duration::from_millis(50))
            .expect_err("timeout");
        assert!(matches!(err, BackendError::Timeout { .. }));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let err = run_with_timeout("netid-no-such-tool", &[], Duration::from_secs(1))
            .expect_err("missing");
        assert!(matches!(err, BackendError::Unavailable(_)));
    }

    #[test]
    fn classifies_tool_diagnostics() {
        assert!(matches!(
            classify_failure("ip", Some(2), "RTNETLINK answers: Operation not permitted"),
            BackendError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify_failure("ip", Some(1), "Cannot find device \"eth9\""),
            BackendError::NotFound(_)
        ));
        assert!(matches!(
            classify_failure("ip", Some(2), ""),
            BackendError::Failed(_)
        ));
    }
}
