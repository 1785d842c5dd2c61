// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host power-control tasks: wake, shut down, and run an arbitrary remote
//! command.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dazzle_adapters::control::HostControl;
use dazzle_adapters::ssh::SshError;
use dazzle_core::error::TaskError;
use dazzle_core::host::Host;
use dazzle_core::util::ip_hex;
use regex::Regex;

use crate::task::{ProgressHandle, Task};

const WAKEUP_ATTEMPTS: u32 = 60;
const SHUTDOWN_ATTEMPTS: u32 = 120;

/// Capture an SSH failure as a [`TaskError`]: a non-zero exit prefers
/// standard error, falling back to standard output, then a fixed message,
/// matching the engine's general uncaught-failure capture order. A failure
/// to run `ssh` at all (spawn/timeout) just carries its own message.
fn ssh_task_error(err: SshError) -> TaskError {
    match err {
        SshError::NonZeroExit(output) => {
            TaskError::from_command(&output.stderr, &output.stdout, "ssh command failed")
        }
        SshError::Failed(message) => TaskError::Failed(message),
    }
}

fn ip_route_get_regex() -> Regex {
    Regex::new(r"^(?P<dst>[\d.]+)\s+dev\s+(?P<dev>\w+)\s+src\s+(?P<src>[\d.]+)").expect("valid regex")
}

/// Find the interface `ip route get <ip>` reports for routing to `ip`.
pub(crate) async fn discover_interface(ip: Ipv4Addr) -> Result<String, TaskError> {
    let output = tokio::process::Command::new("ip")
        .arg("route")
        .arg("get")
        .arg(ip.to_string())
        .output()
        .await
        .map_err(|e| TaskError::Failed(format!("ip route get failed: {e}")))?;

    if !output.status.success() {
        return Err(TaskError::Failed(format!(
            "Can't find interface for host: {ip}"
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let re = ip_route_get_regex();
    let target = ip.to_string();
    for line in stdout.lines() {
        if let Some(captures) = re.captures(line.trim()) {
            if &captures["dst"] == target.as_str() {
                return Ok(captures["dev"].to_string());
            }
        }
    }

    Err(TaskError::Failed(format!(
        "Can't find interface for host: {ip}"
    )))
}

/// Boot a host via Wake-on-LAN and poll until it answers ping.
pub struct Wakeup<C> {
    pub host: Arc<Host>,
    pub control: Arc<C>,
}

impl<C> Wakeup<C> {
    pub fn new(host: Arc<Host>, control: Arc<C>) -> Self {
        Wakeup { host, control }
    }
}

#[async_trait]
impl<C: HostControl + 'static> Task for Wakeup<C> {
    fn title(&self) -> String {
        format!("Waking up {}", self.host.label)
    }

    async fn check(&self) -> Option<String> {
        if self.control.is_reachable(self.host.ip).await {
            Some("Host is already up".to_string())
        } else {
            None
        }
    }

    async fn run(&self, progress: &ProgressHandle) -> Result<Option<String>, TaskError> {
        run_wakeup_body(&self.host, self.control.as_ref(), progress).await
    }
}

/// The poke loop shared by `Wakeup::run` and `Acquire::run` (the latter
/// re-runs it after flipping the maintenance symlink on).
async fn run_wakeup_body<C: HostControl>(
    host: &Host,
    control: &C,
    progress: &ProgressHandle,
) -> Result<Option<String>, TaskError> {
    let interface = discover_interface(host.ip).await?;

    for attempt in 1..=WAKEUP_ATTEMPTS {
        progress.set(format!("Poke {attempt:02} / {WAKEUP_ATTEMPTS}"));

        control
            .send_magic_packet(host.mac, &interface)
            .await
            .map_err(|e| TaskError::Failed(e.to_string()))?;

        if control.probe_once(host.ip).await {
            return Ok(None);
        }
    }

    Err(TaskError::Failed("Host does not wake up in time".to_string()))
}

/// Shut a host down over SSH and poll until it stops answering ping.
pub struct Shutdown<C> {
    pub host: Arc<Host>,
    pub control: Arc<C>,
}

impl<C> Shutdown<C> {
    pub fn new(host: Arc<Host>, control: Arc<C>) -> Self {
        Shutdown { host, control }
    }
}

#[async_trait]
impl<C: HostControl + 'static> Task for Shutdown<C> {
    fn title(&self) -> String {
        format!("Shutting down {}", self.host.label)
    }

    async fn check(&self) -> Option<String> {
        if !self.control.is_reachable(self.host.ip).await {
            Some("Host is already down".to_string())
        } else {
            None
        }
    }

    async fn run(&self, progress: &ProgressHandle) -> Result<Option<String>, TaskError> {
        self.control
            .ssh(self.host.ip, &["poweroff"], Duration::from_secs(30), &[255])
            .await
            .map_err(ssh_task_error)?;

        for attempt in 1..=SHUTDOWN_ATTEMPTS {
            progress.set(format!("Try {attempt:02} / {SHUTDOWN_ATTEMPTS}"));
            if !self.control.probe_once(self.host.ip).await {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        Err(TaskError::Failed("Host does not shut down in time".to_string()))
    }
}

/// Run an arbitrary command on a host over SSH.
pub struct Execute<C> {
    pub host: Arc<Host>,
    pub control: Arc<C>,
    pub command: String,
}

impl<C> Execute<C> {
    pub fn new(host: Arc<Host>, control: Arc<C>, command: impl Into<String>) -> Self {
        Execute {
            host,
            control,
            command: command.into(),
        }
    }
}

#[async_trait]
impl<C: HostControl + 'static> Task for Execute<C> {
    fn title(&self) -> String {
        format!("Executing on {}", self.host.label)
    }

    async fn check(&self) -> Option<String> {
        if !self.control.is_reachable(self.host.ip).await {
            Some("Host is not reachable".to_string())
        } else {
            None
        }
    }

    async fn run(&self, progress: &ProgressHandle) -> Result<Option<String>, TaskError> {
        progress.set(self.command.clone());

        let output = self
            .control
            .ssh(self.host.ip, &["sh", "-c", self.command.as_str()], Duration::from_secs(120), &[])
            .await
            .map_err(ssh_task_error)?;

        Ok(Some(output.stdout.trim().to_string()))
    }
}

/// Default TFTP PXE config directory. Overridable per-task via
/// `Acquire::tftp_root`/`Receive::tftp_root` so tests can point it at a
/// scratch directory instead of touching `/srv/tftp` for real.
pub const DEFAULT_TFTP_ROOT: &str = "/srv/tftp/pxelinux.cfg";

/// The per-host TFTP PXE config symlink that puts the maintenance image in
/// the boot path, named by the host's IP in hex.
pub(crate) struct MaintenanceConfig {
    template: PathBuf,
    config: PathBuf,
}

impl MaintenanceConfig {
    pub(crate) fn new(host: &Host, root: &std::path::Path) -> Self {
        MaintenanceConfig {
            template: root.join("maintenance"),
            config: root.join(ip_hex(host.ip)),
        }
    }

    pub(crate) fn create(&self) -> Result<(), TaskError> {
        if !self.template.exists() {
            return Err(TaskError::Failed(format!(
                "Maintenance TFTP config template is missing: {}",
                self.template.display()
            )));
        }
        if self.config.exists() {
            return Err(TaskError::Failed(format!(
                "Client specific TFTP config file already exists: {}",
                self.config.display()
            )));
        }
        std::os::unix::fs::symlink(&self.template, &self.config)?;
        Ok(())
    }

    pub(crate) fn remove(&self) {
        if self.config.exists() {
            let _ = std::fs::remove_file(&self.config);
        }
    }
}

/// Boot a host into the maintenance image: shut it down, flip on the
/// per-host PXE symlink, wake it, and always remove the symlink again —
/// whether the wake succeeded or not.
pub struct Acquire<C> {
    pub host: Arc<Host>,
    pub control: Arc<C>,
    pub tftp_root: PathBuf,
}

impl<C> Acquire<C> {
    pub fn new(host: Arc<Host>, control: Arc<C>) -> Self {
        Acquire {
            host,
            control,
            tftp_root: PathBuf::from(DEFAULT_TFTP_ROOT),
        }
    }
}

#[async_trait]
impl<C: HostControl + 'static> Task for Acquire<C> {
    fn title(&self) -> String {
        format!("Acquiring {}", self.host.label)
    }

    async fn check(&self) -> Option<String> {
        // Only a host that's already up can be already in maintenance mode;
        // an unreachable host always proceeds to acquisition.
        if !self.control.is_reachable(self.host.ip).await {
            return None;
        }

        if let Ok(output) = self
            .control
            .ssh(self.host.ip, &["cat", "/etc/maintenance"], Duration::from_secs(5), &[])
            .await
        {
            if output.success() {
                return Some("Host is already in maintenance mode".to_string());
            }
        }
        None
    }

    fn pre(&self) -> Vec<Box<dyn Task>> {
        vec![Box::new(Shutdown::new(Arc::clone(&self.host), Arc::clone(&self.control)))]
    }

    async fn run(&self, progress: &ProgressHandle) -> Result<Option<String>, TaskError> {
        let maintenance = MaintenanceConfig::new(&self.host, &self.tftp_root);
        maintenance.create()?;

        let result = run_wakeup_body(&self.host, self.control.as_ref(), progress).await;
        maintenance.remove();
        result
    }
}

#[cfg(test)]
#[path = "ctrl_tests.rs"]
mod tests;
