// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ssh` wrapper: always connects as `root` with host-key checking
//! disabled (the maintenance environment has no persistent identity) and
//! password authentication disabled (key-only).

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::process::Command;

use crate::subprocess::{run_with_timeout, SSH_TIMEOUT};

#[derive(Debug, thiserror::Error)]
pub enum SshError {
    /// The `ssh` process itself could not be spawned, or timed out.
    #[error("{0}")]
    Failed(String),

    /// `ssh` ran and exited with an untolerated non-zero code. Carries the
    /// raw output so callers can apply their own stderr/stdout/fallback
    /// preference (e.g. [`dazzle_core::error::TaskError::from_command`]).
    #[error("ssh exited {}: {}", .0.exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string()), .0.stderr.trim())]
    NonZeroExit(SshOutput),
}

/// Captured standard output and standard error of a completed SSH command.
#[derive(Debug, Clone)]
pub struct SshOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl SshOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `command` on `ip` over SSH as `root`, tolerating the given set of
/// "acceptable" exit codes (e.g. 255, which OpenSSH returns when the remote
/// end drops the connection as part of a requested shutdown).
///
/// Matches:
/// ```text
/// sh.ssh('-q', '-o', 'UserKnownHostsFile=/dev/null',
///        '-o', 'StrictHostKeyChecking=no',
///        '-o', 'PasswordAuthentication=no',
///        '-l', 'root', host.l3addr, *command)
/// ```
pub async fn ssh(
    ip: Ipv4Addr,
    command: &[&str],
    timeout: Duration,
    tolerate_exit_codes: &[i32],
) -> Result<SshOutput, SshError> {
    let mut cmd = Command::new("ssh");
    cmd.arg("-q")
        .arg("-o")
        .arg("UserKnownHostsFile=/dev/null")
        .arg("-o")
        .arg("StrictHostKeyChecking=no")
        .arg("-o")
        .arg("PasswordAuthentication=no")
        .arg("-l")
        .arg("root")
        .arg(ip.to_string())
        .args(command);
    cmd.kill_on_drop(true);

    let output = run_with_timeout(cmd, timeout, "ssh").await.map_err(SshError::Failed)?;
    let exit_code = output.status.code();
    let result = SshOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code,
    };

    if result.success() || exit_code.is_some_and(|code| tolerate_exit_codes.contains(&code)) {
        Ok(result)
    } else {
        Err(SshError::NonZeroExit(result))
    }
}

/// Run `command` on `ip` with the default SSH timeout and no tolerated
/// non-zero exit codes.
pub async fn run(ip: Ipv4Addr, command: &[&str]) -> Result<SshOutput, SshError> {
    ssh(ip, command, SSH_TIMEOUT, &[]).await
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
