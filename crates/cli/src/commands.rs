// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The argument surface and task-building dispatch for every `dazzle`
//! subcommand. This module builds [`Task`]s and hands them to the engine;
//! it never re-implements engine logic itself.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use dazzle_adapters::{ProcessHostControl, ProcessMulticastTransport};
use dazzle_core::error::TaskError;
use dazzle_core::host::{Host, HostList};
use dazzle_engine::task::{ProgressHandle, Task};
use dazzle_engine::tasks::clone::{Clone as CloneCoordinator, Receive, DEFAULT_MCAST_RDV_ADDRESS};
use dazzle_engine::tasks::ctrl::{Acquire, Execute, Shutdown, Wakeup};
use tokio::sync::oneshot;

/// Default host list path, overridable with `-l`.
pub const DEFAULT_HOSTLIST: &str = "/etc/dazzle.conf";

#[derive(Parser)]
#[command(
    name = "dazzle",
    about = "Fleet control for a small cluster of bare-metal hosts",
    version
)]
pub struct Cli {
    /// Verbose (debug-level) logging.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Path to the host list file.
    #[arg(short = 'l', long = "hostlist", value_name = "HOSTLIST", global = true)]
    pub hostlist: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wake hosts up via Wake-on-LAN.
    Wakeup {
        #[arg(required = true)]
        hosts: Vec<String>,
    },
    /// Shut hosts down over SSH.
    Shutdown {
        #[arg(required = true)]
        hosts: Vec<String>,
    },
    /// Run a command on hosts over SSH.
    Execute {
        command: String,
        #[arg(required = true)]
        hosts: Vec<String>,
    },
    /// Boot hosts into the maintenance image.
    Acquire {
        #[arg(required = true)]
        hosts: Vec<String>,
    },
    /// Receive a disk image on hosts, without coordinating a sender.
    Receive {
        #[arg(long, value_name = "DEV")]
        dst: PathBuf,
        #[arg(required = true)]
        hosts: Vec<String>,
    },
    /// Multicast a disk image to hosts simultaneously.
    Clone {
        #[arg(long, value_name = "DEV")]
        src: PathBuf,
        #[arg(long, value_name = "DEV")]
        dst: PathBuf,
        #[arg(required = true)]
        hosts: Vec<String>,
    },
    /// Build the maintenance boot image components (external collaborator,
    /// not implemented by this binary).
    Build {
        #[command(subcommand)]
        target: BuildTarget,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum BuildTarget {
    Kernel,
    Busybox,
    Dropbear,
    Udpcast,
}

impl BuildTarget {
    fn label(self) -> &'static str {
        match self {
            BuildTarget::Kernel => "kernel",
            BuildTarget::Busybox => "busybox",
            BuildTarget::Dropbear => "dropbear",
            BuildTarget::Udpcast => "udpcast",
        }
    }
}

/// Resolve every host expression against `hostlist`, collapsing duplicates
/// across expressions into a set.
pub fn resolve_hosts(
    hostlist: &HostList,
    exprs: &[String],
) -> Result<Vec<Arc<Host>>, dazzle_core::error::HostError> {
    hostlist.resolve_all(exprs.iter().map(String::as_str))
}

/// A stub task for the boot-image build commands: these shell out to
/// `make`/`tar`/`cpio`/`ldd` and a download pipeline that this core does
/// not implement. Registering the subcommand keeps the CLI surface
/// complete without faking functionality the core doesn't own.
pub struct BuildStub {
    target: BuildTarget,
}

impl BuildStub {
    pub fn new(target: BuildTarget) -> Self {
        BuildStub { target }
    }
}

#[async_trait]
impl Task for BuildStub {
    fn title(&self) -> String {
        format!("Building {}", self.target.label())
    }

    async fn check(&self) -> Option<String> {
        Some("build tasks are not implemented by this core".to_string())
    }

    async fn run(&self, _progress: &ProgressHandle) -> Result<Option<String>, TaskError> {
        Ok(None)
    }
}

pub fn wakeup_tasks(
    hosts: &[Arc<Host>],
    control: &Arc<ProcessHostControl>,
) -> Vec<Box<dyn Task>> {
    hosts
        .iter()
        .map(|h| Box::new(Wakeup::new(Arc::clone(h), Arc::clone(control))) as Box<dyn Task>)
        .collect()
}

pub fn shutdown_tasks(
    hosts: &[Arc<Host>],
    control: &Arc<ProcessHostControl>,
) -> Vec<Box<dyn Task>> {
    hosts
        .iter()
        .map(|h| Box::new(Shutdown::new(Arc::clone(h), Arc::clone(control))) as Box<dyn Task>)
        .collect()
}

pub fn execute_tasks(
    hosts: &[Arc<Host>],
    control: &Arc<ProcessHostControl>,
    command: &str,
) -> Vec<Box<dyn Task>> {
    hosts
        .iter()
        .map(|h| {
            Box::new(Execute::new(Arc::clone(h), Arc::clone(control), command)) as Box<dyn Task>
        })
        .collect()
}

pub fn acquire_tasks(
    hosts: &[Arc<Host>],
    control: &Arc<ProcessHostControl>,
) -> Vec<Box<dyn Task>> {
    hosts
        .iter()
        .map(|h| Box::new(Acquire::new(Arc::clone(h), Arc::clone(control))) as Box<dyn Task>)
        .collect()
}

/// Standalone `receive` tasks (as opposed to the `Clone` coordinator's own
/// rendezvous-aware `Receive`s): each gets a throwaway ready signal since
/// there is no sender to rendezvous with.
pub fn receive_tasks(
    hosts: &[Arc<Host>],
    control: &Arc<ProcessHostControl>,
    transport: &Arc<ProcessMulticastTransport>,
    dst: &std::path::Path,
) -> Vec<Box<dyn Task>> {
    hosts
        .iter()
        .map(|h| {
            let (ready_tx, _ready_rx) = oneshot::channel();
            Box::new(Receive::new(
                Arc::clone(h),
                Arc::clone(control),
                Arc::clone(transport),
                dst.to_path_buf(),
                DEFAULT_MCAST_RDV_ADDRESS,
                ready_tx,
            )) as Box<dyn Task>
        })
        .collect()
}

pub fn clone_coordinator(
    hosts: Vec<Arc<Host>>,
    control: Arc<ProcessHostControl>,
    transport: Arc<ProcessMulticastTransport>,
    src: PathBuf,
    dst: PathBuf,
) -> CloneCoordinator<ProcessHostControl, ProcessMulticastTransport> {
    CloneCoordinator::new(hosts, control, transport, src, dst)
}
