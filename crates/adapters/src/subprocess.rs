// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers shared by the adapter wrappers.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for a single ping probe.
pub const PING_TIMEOUT: Duration = Duration::from_secs(3);

/// Default timeout for an SSH command.
pub const SSH_TIMEOUT: Duration = Duration::from_secs(60);

/// Run a subprocess command with a timeout, capturing its output.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via `tokio::process`'s
/// kill-on-drop behavior once `kill_on_drop(true)` is set by the caller).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{description} failed: {io_err}")),
        Err(_elapsed) => Err(format!(
            "{description} timed out after {}s",
            timeout.as_secs()
        )),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
