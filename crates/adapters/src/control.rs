// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `HostControl` gathers the three small process wrappers (`ping`, `ssh`,
//! `send_magic_packet`) behind a single trait so `dazzle-engine`'s tasks
//! can be exercised against [`fake::FakeHostControl`](crate::fake::FakeHostControl)
//! in unit tests instead of shelling out to real binaries.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use dazzle_core::host::MacAddr;

use crate::ssh::{SshError, SshOutput};
use crate::wol::WolError;
use crate::{ping, ssh, wol};

#[async_trait]
pub trait HostControl: Send + Sync {
    async fn is_reachable(&self, ip: Ipv4Addr) -> bool;

    async fn probe_once(&self, ip: Ipv4Addr) -> bool;

    async fn ssh(
        &self,
        ip: Ipv4Addr,
        command: &[&str],
        timeout: Duration,
        tolerate_exit_codes: &[i32],
    ) -> Result<SshOutput, SshError>;

    async fn send_magic_packet(&self, mac: MacAddr, interface: &str) -> Result<(), WolError>;
}

/// The real [`HostControl`], backed by the `ping`/`ssh`/`etherwake`
/// binaries on `$PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessHostControl;

#[async_trait]
impl HostControl for ProcessHostControl {
    async fn is_reachable(&self, ip: Ipv4Addr) -> bool {
        ping::is_reachable(ip).await
    }

    async fn probe_once(&self, ip: Ipv4Addr) -> bool {
        ping::probe_once(ip).await
    }

    async fn ssh(
        &self,
        ip: Ipv4Addr,
        command: &[&str],
        timeout: Duration,
        tolerate_exit_codes: &[i32],
    ) -> Result<SshOutput, SshError> {
        ssh::ssh(ip, command, timeout, tolerate_exit_codes).await
    }

    async fn send_magic_packet(&self, mac: MacAddr, interface: &str) -> Result<(), WolError> {
        wol::send_magic_packet(mac, interface).await
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
