//! Helpers for running short-lived Windows utilities (`reg`, `rundll32`).

use std::process::{Output, Stdio};

use crate::StoreError;

/// Suppresses the console window a child would otherwise flash on Windows.
#[cfg(windows)]
pub fn hide_window(cmd: &mut tokio::process::Command) {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
pub fn hide_window(_cmd: &mut tokio::process::Command) {}

/// Runs `program` to completion and returns its output, whatever the status.
///
/// Only a failure to start the process is an error here.
async fn output(program: &str, args: &[String]) -> Result<Output, StoreError> {
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    hide_window(&mut cmd);

    cmd.output().await.map_err(|source| StoreError::Spawn {
        program: program.to_string(),
        source,
    })
}

/// Runs `program` and fails unless it exits successfully.
///
/// Stray stderr from a successful run is logged but not fatal.
pub async fn run_checked(program: &str, args: &[String]) -> Result<(), StoreError> {
    let out = output(program, args).await?;
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);

    if !out.status.success() {
        return Err(StoreError::Command {
            command: describe(program, args),
            status: out.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    if !stderr.trim().is_empty() {
        tracing::warn!(program, stderr = %stderr.trim(), "command wrote to stderr");
    }
    if !stdout.trim().is_empty() {
        tracing::debug!(program, stdout = %stdout.trim(), "command output");
    }
    Ok(())
}

fn describe(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.contains(' ') {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}
