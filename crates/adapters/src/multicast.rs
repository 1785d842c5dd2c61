// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process wrappers around `udp-sender`/`udp-receiver` (the `udpcast`
//! tools). This module owns process plumbing only — line classification
//! (ready/connected markers, transfer-rate parsing) belongs to the clone
//! task in the engine crate, which interprets the lines these handles
//! stream out.
//!
//! The streaming approach (spawn, hand a background task the child's
//! stderr, forward completed lines over a channel) follows the same shape
//! as this crate's other long-running-process watchers: read
//! incrementally, never block the caller on the whole output.

use std::net::Ipv4Addr;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum MulticastError {
    #[error("failed to spawn {0}: {1}")]
    Spawn(&'static str, std::io::Error),
    #[error("{0} has no stderr pipe")]
    NoStderr(&'static str),
}

/// A running `udp-sender` process. Sends over the local multicast group,
/// so it is spawned directly rather than over SSH.
pub struct SenderHandle {
    child: Child,
    lines: mpsc::UnboundedReceiver<String>,
}

impl SenderHandle {
    /// Spawn `udp-sender` with the given arguments (already including
    /// `--mcast-rdv-address`, `--min-receivers`, `--file`, `--pipe`, etc.).
    pub fn spawn(args: &[String]) -> Result<Self, MulticastError> {
        let mut cmd = Command::new("udp-sender");
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        spawn_streaming(cmd, "udp-sender").map(|(child, lines)| Self { child, lines })
    }

    /// Receive the next line of stderr output, or `None` once the process
    /// has closed its stderr stream (normally meaning it has exited).
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Wait for the process to exit, returning whether it exited
    /// successfully.
    pub async fn wait(mut self) -> Result<bool, MulticastError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| MulticastError::Spawn("udp-sender", e))?;
        Ok(status.success())
    }
}

/// A running `udp-receiver` process, driven remotely over SSH on the
/// target host (the receiver runs in the maintenance environment, not on
/// the machine invoking `dazzle`).
pub struct ReceiverHandle {
    child: Child,
    lines: mpsc::UnboundedReceiver<String>,
}

impl ReceiverHandle {
    /// Spawn `udp-receiver` on `ip` over SSH with the given arguments
    /// (already including `--mcast-rdv-address`, `--nokbd`, `--file`,
    /// `--pipe`, etc.).
    pub fn spawn(ip: Ipv4Addr, args: &[String]) -> Result<Self, MulticastError> {
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
            .arg("udp-receiver")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        spawn_streaming(cmd, "udp-receiver").map(|(child, lines)| Self { child, lines })
    }

    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    pub async fn wait(mut self) -> Result<bool, MulticastError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| MulticastError::Spawn("udp-receiver", e))?;
        Ok(status.success())
    }
}

fn spawn_streaming(
    mut cmd: Command,
    description: &'static str,
) -> Result<(Child, mpsc::UnboundedReceiver<String>), MulticastError> {
    let mut child = cmd
        .spawn()
        .map_err(|e| MulticastError::Spawn(description, e))?;
    let stderr = child
        .stderr
        .take()
        .ok_or(MulticastError::NoStderr(description))?;

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut reader = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    Ok((child, rx))
}

/// A streamed-stderr child process, abstracted so `dazzle-engine`'s clone
/// coordinator can drive either a real [`SenderHandle`]/[`ReceiverHandle`]
/// or [`fake::FakeLineStream`] in tests without caring which.
#[async_trait]
pub trait LineStream: Send {
    async fn next_line(&mut self) -> Option<String>;
    async fn wait(self: Box<Self>) -> Result<bool, MulticastError>;
}

#[async_trait]
impl LineStream for SenderHandle {
    async fn next_line(&mut self) -> Option<String> {
        self.next_line().await
    }

    async fn wait(self: Box<Self>) -> Result<bool, MulticastError> {
        (*self).wait().await
    }
}

#[async_trait]
impl LineStream for ReceiverHandle {
    async fn next_line(&mut self) -> Option<String> {
        self.next_line().await
    }

    async fn wait(self: Box<Self>) -> Result<bool, MulticastError> {
        (*self).wait().await
    }
}

/// Spawns the sender/receiver processes behind `dyn` handles, so the clone
/// coordinator in `dazzle-engine` can be exercised against
/// [`fake::FakeMulticastTransport`] instead of shelling out to `udp-sender`
/// and `ssh udp-receiver` in unit tests.
#[async_trait]
pub trait MulticastTransport: Send + Sync {
    async fn spawn_sender(&self, args: Vec<String>) -> Result<Box<dyn LineStream>, MulticastError>;

    async fn spawn_receiver(
        &self,
        ip: Ipv4Addr,
        args: Vec<String>,
    ) -> Result<Box<dyn LineStream>, MulticastError>;
}

/// The real [`MulticastTransport`], backed by `udp-sender` and `ssh
/// udp-receiver` on `$PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessMulticastTransport;

#[async_trait]
impl MulticastTransport for ProcessMulticastTransport {
    async fn spawn_sender(&self, args: Vec<String>) -> Result<Box<dyn LineStream>, MulticastError> {
        Ok(Box::new(SenderHandle::spawn(&args)?))
    }

    async fn spawn_receiver(
        &self,
        ip: Ipv4Addr,
        args: Vec<String>,
    ) -> Result<Box<dyn LineStream>, MulticastError> {
        Ok(Box::new(ReceiverHandle::spawn(ip, &args)?))
    }
}

#[cfg(test)]
#[path = "multicast_tests.rs"]
mod tests;
