// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ping` wrapper: shells out to the system `ping` binary and treats any
//! failure (including "binary not found") as "host unreachable" rather
//! than propagating an error.

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::process::Command;

use crate::subprocess::{run_with_timeout, PING_TIMEOUT};

/// Probe `ip` with `count` ICMP echo requests spaced 0.2s apart, bounded by
/// an overall `deadline`. Returns `true` if any reply was received.
///
/// Any invocation failure (missing binary, permission error, timeout) is
/// reported as unreachable rather than surfaced as an error, which keeps
/// `check()` bodies a plain boolean test.
pub async fn ping(ip: Ipv4Addr, count: u32, deadline: Duration) -> bool {
    let mut cmd = Command::new("ping");
    cmd.arg("-c")
        .arg(count.to_string())
        .arg("-i")
        .arg("0.2")
        .arg("-w")
        .arg(deadline.as_secs().max(1).to_string())
        .arg(ip.to_string());
    cmd.kill_on_drop(true);

    match run_with_timeout(cmd, deadline + Duration::from_secs(1), "ping").await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// The three-ping-within-three-seconds reachability probe used by
/// `Wakeup::check`, `Shutdown::check`, and `Execute::check`.
pub async fn is_reachable(ip: Ipv4Addr) -> bool {
    ping(ip, 3, PING_TIMEOUT).await
}

/// The single 1s probe used inside the Wakeup poke loop and the Shutdown
/// poll loop.
pub async fn probe_once(ip: Ipv4Addr) -> bool {
    ping(ip, 1, Duration::from_secs(1)).await
}

#[cfg(test)]
#[path = "ping_tests.rs"]
mod tests;
