//! External command execution with a timeout.

use crate::{EnumerateError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Run `program args...` and return its stdout.
///
/// Exit codes listed in `ok_codes` are accepted besides success; `lsof`
/// for instance exits 1 when there is nothing to report.
pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
    ok_codes: &[i32],
) -> Result<String> {
    let command = display_command(program, args);
    debug!("Running {}", command);

    let future = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, future).await {
        Ok(result) => result.map_err(|source| EnumerateError::Spawn {
            command: command.clone(),
            source,
        })?,
        Err(_) => {
            return Err(EnumerateError::Timeout {
                command,
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let accepted = output.status.success()
        || output
            .status
            .code()
            .is_some_and(|code| ok_codes.contains(&code));
    if !accepted {
        return Err(EnumerateError::Failed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn display_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let out = run_command("echo", &["hello"], Duration::from_secs(5), &[])
            .await
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = run_command(
            "driftwatch-no-such-binary",
            &[],
            Duration::from_secs(5),
            &[],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EnumerateError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let err = run_command("sh", &["-c", "exit 3"], Duration::from_secs(5), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EnumerateError::Failed { .. }));

        let out = run_command("sh", &["-c", "exit 1"], Duration::from_secs(5), &[1])
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = run_command("sleep", &["5"], Duration::from_millis(100), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EnumerateError::Timeout { .. }));
    }
}
