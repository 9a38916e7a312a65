//! Child-process executor
//!
//! Spawns commands with a configured environment, waits for completion, and
//! reports either a status or a spawn failure together with wall-clock
//! duration. `exec_legacy` additionally captures stdout/stderr instead of
//! letting them inherit the daemon's descriptors.

use std::io::Read;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Outcome of waiting on a spawned child.
#[derive(Debug, Clone)]
pub enum ExecStatus {
    /// Normal termination with the process's exit code.
    Exited(i32),
    /// Terminated by a signal.
    Signaled(i32),
    /// The child could not be spawned at all (bad path, permission, fork/exec
    /// failure). Duration is always zero for this variant.
    SpawnError(String),
}

impl ExecStatus {
    /// `true` for `Exited(0)`; used to distinguish reschedulable failures
    /// from success for logging purposes.
    pub fn is_success(&self) -> bool {
        matches!(self, ExecStatus::Exited(0))
    }

    /// The value used to populate `CRORE_RESULT` for non-legacy jobs: the
    /// exit code as a decimal string, or empty for a signal/spawn failure.
    pub fn result_string(&self) -> String {
        match self {
            ExecStatus::Exited(code) => code.to_string(),
            ExecStatus::Signaled(_) | ExecStatus::SpawnError(_) => String::new(),
        }
    }
}

fn build_command(argv: &[String], envs: &[Vec<(String, String)>]) -> Command {
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]);
    for set in envs {
        for (k, v) in set {
            cmd.env(k, v);
        }
    }
    cmd
}

/// Spawn `argv` with the given environment sets applied in order (later
/// sets override earlier ones on the same key), wait for completion, and
/// return the status together with the measured wall-clock duration.
pub fn exec(argv: &[String], envs: &[Vec<(String, String)>]) -> (ExecStatus, Duration) {
    let mut cmd = build_command(argv, envs);

    let start = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => return (ExecStatus::SpawnError(e.to_string()), Duration::ZERO),
    };

    let status = match child.wait() {
        Ok(s) => s,
        Err(e) => return (ExecStatus::SpawnError(e.to_string()), start.elapsed()),
    };
    let duration = start.elapsed();

    let exec_status = match status.code() {
        Some(code) => ExecStatus::Exited(code),
        None => ExecStatus::Signaled(status.signal().unwrap_or(0)),
    };

    (exec_status, duration)
}

/// As `exec`, but capture the child's stdout/stderr into memory instead of
/// letting them inherit the daemon's descriptors. A spawn failure is
/// reported as `Err(detail)` so the caller can log it the same way `exec`'s
/// `SpawnError` is logged, rather than silently looking like a child that
/// ran and produced no output. Once spawned, the exit status itself is
/// discarded; a UTF-8 decode failure on either stream collapses to an empty
/// stdout and a synthetic `"output not valid utf-8"` stderr.
pub fn exec_legacy(
    argv: &[String],
    envs: &[Vec<(String, String)>],
) -> (Result<(String, String), String>, Duration) {
    let mut cmd = build_command(argv, envs);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let start = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => return (Err(e.to_string()), Duration::ZERO),
    };

    // Drain both pipes concurrently: a child that fills its stdout buffer
    // while this thread is still blocked reading stderr (or vice versa)
    // would otherwise deadlock against the kernel pipe buffer.
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    std::thread::scope(|scope| {
        let stdout_handle = scope.spawn(|| {
            if let Some(out) = stdout_pipe.as_mut() {
                let _ = out.read_to_end(&mut stdout_buf);
            }
        });
        if let Some(err) = stderr_pipe.as_mut() {
            let _ = err.read_to_end(&mut stderr_buf);
        }
        let _ = stdout_handle.join();
    });
    let _ = child.wait();
    let duration = start.elapsed();

    let output = match (String::from_utf8(stdout_buf), String::from_utf8(stderr_buf)) {
        (Ok(stdout), Ok(stderr)) => (stdout, stderr),
        _ => (String::new(), "output not valid utf-8".to_string()),
    };

    (Ok(output), duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_reports_exit_code() {
        let argv = vec!["/bin/sh".to_string(), "-c".to_string(), "exit 7".to_string()];
        let (status, _duration) = exec(&argv, &[]);
        assert!(matches!(status, ExecStatus::Exited(7)));
    }

    #[test]
    fn exec_applies_env_with_later_sets_overriding() {
        let argv = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "test \"$FOO\" = \"two\"".to_string(),
        ];
        let envs = vec![
            vec![("FOO".to_string(), "one".to_string())],
            vec![("FOO".to_string(), "two".to_string())],
        ];
        let (status, _duration) = exec(&argv, &envs);
        assert!(status.is_success());
    }

    #[test]
    fn exec_reports_spawn_error_for_missing_executable() {
        let argv = vec!["/no/such/executable-crore-test".to_string()];
        let (status, duration) = exec(&argv, &[]);
        assert!(matches!(status, ExecStatus::SpawnError(_)));
        assert_eq!(duration, Duration::ZERO);
    }

    #[test]
    fn exec_legacy_captures_stdout() {
        let argv = vec!["/bin/echo".to_string(), "hi".to_string()];
        let (output, _duration) = exec_legacy(&argv, &[]);
        let (stdout, stderr) = output.unwrap();
        assert_eq!(stdout, "hi\n");
        assert_eq!(stderr, "");
    }

    #[test]
    fn exec_legacy_captures_stderr() {
        let argv = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "echo oops 1>&2".to_string(),
        ];
        let (output, _duration) = exec_legacy(&argv, &[]);
        let (stdout, stderr) = output.unwrap();
        assert_eq!(stdout, "");
        assert_eq!(stderr, "oops\n");
    }

    #[test]
    fn exec_legacy_reports_spawn_error_for_missing_executable() {
        let argv = vec!["/no/such/executable-crore-test".to_string()];
        let (output, duration) = exec_legacy(&argv, &[]);
        assert!(output.is_err());
        assert_eq!(duration, Duration::ZERO);
    }
}
