// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake [`HostControl`] for deterministic task-engine tests. Mirrors the
//! call-log-plus-scripted-errors shape of this crate's other test doubles:
//! every invocation is recorded, and each host can be pre-programmed with
//! a canned reachability sequence or SSH/WoL outcome.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use std::collections::VecDeque;

use async_trait::async_trait;
use dazzle_core::host::MacAddr;
use parking_lot::Mutex;

use crate::control::HostControl;
use crate::multicast::{LineStream, MulticastError, MulticastTransport};
use crate::ssh::{SshError, SshOutput};
use crate::wol::WolError;

#[derive(Debug, Clone)]
pub enum ControlCall {
    IsReachable { ip: Ipv4Addr },
    ProbeOnce { ip: Ipv4Addr },
    Ssh { ip: Ipv4Addr, command: Vec<String> },
    SendMagicPacket { mac: MacAddr, interface: String },
}

#[derive(Default)]
struct FakeState {
    calls: Vec<ControlCall>,
    /// Queued reachability answers per host; drained front-to-back, the
    /// last value is reused once the queue empties.
    reachable: HashMap<Ipv4Addr, Vec<bool>>,
    probe: HashMap<Ipv4Addr, Vec<bool>>,
    ssh_result: HashMap<Ipv4Addr, Result<SshOutput, String>>,
    wol_result: Option<Result<(), String>>,
}

/// A scriptable, in-memory [`HostControl`] for unit tests.
#[derive(Clone, Default)]
pub struct FakeHostControl {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeHostControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ControlCall> {
        self.inner.lock().calls.clone()
    }

    /// Queue the sequence of answers `is_reachable` should return for
    /// `ip`. The last answer repeats once the queue is exhausted, which
    /// is what lets a poke-loop test assert "unreachable for N probes,
    /// then reachable".
    pub fn set_reachable_sequence(&self, ip: Ipv4Addr, sequence: Vec<bool>) {
        self.inner.lock().reachable.insert(ip, sequence);
    }

    pub fn set_probe_sequence(&self, ip: Ipv4Addr, sequence: Vec<bool>) {
        self.inner.lock().probe.insert(ip, sequence);
    }

    pub fn set_ssh_result(&self, ip: Ipv4Addr, result: Result<SshOutput, String>) {
        self.inner.lock().ssh_result.insert(ip, result);
    }

    pub fn set_wol_result(&self, result: Result<(), String>) {
        self.inner.lock().wol_result = Some(result);
    }
}

fn drain_or_repeat(queue: &mut Vec<bool>) -> bool {
    if queue.len() > 1 {
        queue.remove(0)
    } else {
        queue.first().copied().unwrap_or(false)
    }
}

#[async_trait]
impl HostControl for FakeHostControl {
    async fn is_reachable(&self, ip: Ipv4Addr) -> bool {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::IsReachable { ip });
        match inner.reachable.get_mut(&ip) {
            Some(queue) => drain_or_repeat(queue),
            None => false,
        }
    }

    async fn probe_once(&self, ip: Ipv4Addr) -> bool {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::ProbeOnce { ip });
        match inner.probe.get_mut(&ip) {
            Some(queue) => drain_or_repeat(queue),
            None => false,
        }
    }

    async fn ssh(
        &self,
        ip: Ipv4Addr,
        command: &[&str],
        _timeout: Duration,
        tolerate_exit_codes: &[i32],
    ) -> Result<SshOutput, SshError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::Ssh {
            ip,
            command: command.iter().map(|s| s.to_string()).collect(),
        });
        match inner.ssh_result.get(&ip) {
            Some(Ok(output)) => {
                if output.success() || output.exit_code.is_some_and(|c| tolerate_exit_codes.contains(&c)) {
                    Ok(output.clone())
                } else {
                    Err(SshError::NonZeroExit(output.clone()))
                }
            }
            Some(Err(message)) => Err(SshError::Failed(message.clone())),
            None => Ok(SshOutput {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: Some(0),
            }),
        }
    }

    async fn send_magic_packet(&self, mac: MacAddr, interface: &str) -> Result<(), WolError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::SendMagicPacket {
            mac,
            interface: interface.to_string(),
        });
        match inner.wol_result.clone() {
            Some(Ok(())) | None => Ok(()),
            Some(Err(message)) => Err(WolError::Failed(message)),
        }
    }
}

/// A scripted [`LineStream`]: yields a fixed sequence of lines, then closes
/// and resolves `wait()` with the configured outcome.
pub struct FakeLineStream {
    lines: VecDeque<String>,
    outcome: Result<bool, String>,
}

impl FakeLineStream {
    pub fn new(lines: Vec<String>, outcome: Result<bool, String>) -> Self {
        FakeLineStream {
            lines: lines.into(),
            outcome,
        }
    }
}

#[async_trait]
impl LineStream for FakeLineStream {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    async fn wait(self: Box<Self>) -> Result<bool, MulticastError> {
        self.outcome
            .clone()
            .map_err(|message| MulticastError::Spawn("fake", std::io::Error::other(message)))
    }
}

#[derive(Debug, Clone)]
pub enum MulticastCall {
    Sender { args: Vec<String> },
    Receiver { ip: Ipv4Addr, args: Vec<String> },
}

#[derive(Default)]
struct FakeMulticastState {
    calls: Vec<MulticastCall>,
    sender_script: Option<(Vec<String>, Result<bool, String>)>,
    receiver_scripts: HashMap<Ipv4Addr, (Vec<String>, Result<bool, String>)>,
}

/// A scriptable [`MulticastTransport`] for exercising the clone coordinator
/// without spawning `udp-sender`/`ssh` processes, mirroring
/// [`FakeHostControl`]'s call-log-plus-scripted-outcome shape.
#[derive(Clone, Default)]
pub struct FakeMulticastTransport {
    inner: Arc<Mutex<FakeMulticastState>>,
}

impl FakeMulticastTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MulticastCall> {
        self.inner.lock().calls.clone()
    }

    /// Script the sender's stderr lines and whether the process exits
    /// successfully once they're exhausted.
    pub fn set_sender_script(&self, lines: Vec<&str>, outcome: Result<bool, String>) {
        self.inner.lock().sender_script =
            Some((lines.into_iter().map(str::to_string).collect(), outcome));
    }

    /// Script one receiver's stderr lines and exit outcome, keyed by host
    /// IP.
    pub fn set_receiver_script(&self, ip: Ipv4Addr, lines: Vec<&str>, outcome: Result<bool, String>) {
        self.inner
            .lock()
            .receiver_scripts
            .insert(ip, (lines.into_iter().map(str::to_string).collect(), outcome));
    }
}

#[async_trait]
impl MulticastTransport for FakeMulticastTransport {
    async fn spawn_sender(&self, args: Vec<String>) -> Result<Box<dyn LineStream>, MulticastError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MulticastCall::Sender { args });
        let (lines, outcome) = inner
            .sender_script
            .clone()
            .unwrap_or_else(|| (Vec::new(), Ok(true)));
        Ok(Box::new(FakeLineStream::new(lines, outcome)))
    }

    async fn spawn_receiver(
        &self,
        ip: Ipv4Addr,
        args: Vec<String>,
    ) -> Result<Box<dyn LineStream>, MulticastError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MulticastCall::Receiver { ip, args });
        let (lines, outcome) = inner
            .receiver_scripts
            .get(&ip)
            .cloned()
            .unwrap_or_else(|| (Vec::new(), Ok(true)));
        Ok(Box::new(FakeLineStream::new(lines, outcome)))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
