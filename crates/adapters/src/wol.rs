// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wake-on-LAN magic packet sender. Grounded on `dazzle.tasks.ctrl.Wakeup`,
//! which looks up `etherwake` and falls back to `ether-wake` (the same
//! binary under Debian's alternate package name) before giving up.

use std::time::Duration;

use dazzle_core::host::MacAddr;
use tokio::process::Command;

use crate::subprocess::run_with_timeout;

#[derive(Debug, thiserror::Error)]
pub enum WolError {
    #[error("neither etherwake nor ether-wake is installed")]
    BinaryNotFound,
    #[error("{0}")]
    Failed(String),
}

const BINARY_NAMES: [&str; 2] = ["etherwake", "ether-wake"];
const WOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Send a Wake-on-LAN magic packet for `mac` out of `interface`.
///
/// Tries `etherwake` first, then `ether-wake`; the first one that isn't
/// reported as missing wins. Matches one poke of the Wakeup poke loop.
pub async fn send_magic_packet(mac: MacAddr, interface: &str) -> Result<(), WolError> {
    for binary in BINARY_NAMES {
        let mut cmd = Command::new(binary);
        cmd.arg("-i").arg(interface).arg(mac.to_string());
        cmd.kill_on_drop(true);

        match run_with_timeout(cmd, WOL_TIMEOUT, binary).await {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(WolError::Failed(format!(
                    "{binary} exited {}: {}",
                    output.status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
                    stderr.trim()
                )));
            }
            Err(message) => {
                // Treat "command not found"-shaped failures as a cue to try
                // the next binary name; anything else is a real failure.
                if message.contains("No such file or directory") || message.contains("os error 2") {
                    continue;
                }
                return Err(WolError::Failed(message));
            }
        }
    }

    Err(WolError::BinaryNotFound)
}

#[cfg(test)]
#[path = "wol_tests.rs"]
mod tests;
