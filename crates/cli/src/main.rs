// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dazzle` — fleet control for a small cluster of bare-metal hosts: boot
//! them into a maintenance image over PXE/TFTP, push a disk image to many
//! hosts at once over UDP multicast, and tear the environment back down,
//! all driven from an operator workstation.

mod color;
mod commands;
mod exit_error;
mod logging;
mod presenter;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dazzle_adapters::{ProcessHostControl, ProcessMulticastTransport};
use dazzle_core::host::HostList;
use dazzle_core::job::{JobState, JobTree};
use dazzle_engine::group::ParallelGroup;
use dazzle_engine::task::{Task, TaskRunner};
use parking_lot::Mutex;

use commands::{BuildStub, Cli, Commands};
use exit_error::ExitError;
use presenter::Presenter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let code = err.downcast_ref::<ExitError>().map_or(1, |e| e.code);
            eprintln!("Error: {err}");
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let hostlist_path = cli
        .hostlist
        .unwrap_or_else(|| PathBuf::from(commands::DEFAULT_HOSTLIST));
    let hostlist =
        HostList::load(&hostlist_path).map_err(|e| ExitError::config(e.to_string()))?;

    let control = Arc::new(ProcessHostControl);
    let transport = Arc::new(ProcessMulticastTransport);

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let tree = Arc::new(Mutex::new(JobTree::new(events_tx)));
    let presenter_handle = tokio::spawn(Presenter::new(Arc::clone(&tree), events_rx).run());

    let root_idx = match cli.command {
        Commands::Wakeup { hosts } => {
            let hosts = commands::resolve_hosts(&hostlist, &hosts)
                .map_err(|e| ExitError::config(e.to_string()))?;
            let tasks = commands::wakeup_tasks(&hosts, &control);
            run_fanout("Waking up hosts", tasks, &tree).await
        }
        Commands::Shutdown { hosts } => {
            let hosts = commands::resolve_hosts(&hostlist, &hosts)
                .map_err(|e| ExitError::config(e.to_string()))?;
            let tasks = commands::shutdown_tasks(&hosts, &control);
            run_fanout("Shutting down hosts", tasks, &tree).await
        }
        Commands::Execute { command, hosts } => {
            let hosts = commands::resolve_hosts(&hostlist, &hosts)
                .map_err(|e| ExitError::config(e.to_string()))?;
            let tasks = commands::execute_tasks(&hosts, &control, &command);
            run_fanout("Executing on hosts", tasks, &tree).await
        }
        Commands::Acquire { hosts } => {
            let hosts = commands::resolve_hosts(&hostlist, &hosts)
                .map_err(|e| ExitError::config(e.to_string()))?;
            let tasks = commands::acquire_tasks(&hosts, &control);
            run_fanout("Acquiring hosts", tasks, &tree).await
        }
        Commands::Receive { dst, hosts } => {
            let hosts = commands::resolve_hosts(&hostlist, &hosts)
                .map_err(|e| ExitError::config(e.to_string()))?;
            let tasks = commands::receive_tasks(&hosts, &control, &transport, &dst);
            run_fanout("Receiving on hosts", tasks, &tree).await
        }
        Commands::Clone { src, dst, hosts } => {
            let hosts = commands::resolve_hosts(&hostlist, &hosts)
                .map_err(|e| ExitError::config(e.to_string()))?;
            let coordinator = commands::clone_coordinator(
                hosts,
                Arc::clone(&control),
                Arc::clone(&transport),
                src,
                dst,
            );
            coordinator.execute(Arc::clone(&tree), None).await
        }
        Commands::Build { target } => {
            let stub = BuildStub::new(target);
            TaskRunner::execute(&stub, &tree, None).await
        }
    };

    let failed = matches!(tree.lock().node(root_idx).state, JobState::Failed(_));

    // The presenter holds its own strong reference to the tree, so the
    // event channel never closes on its own; tell it explicitly to render
    // its last frame and return instead of racing the process exit.
    tree.lock().request_shutdown();
    let _ = presenter_handle.await;

    Ok(if failed { 1 } else { 0 })
}

/// Run a set of per-host tasks to completion, wrapping them in a
/// [`ParallelGroup`] only when there's more than one — a single-host
/// invocation produces exactly one job node, not a group-of-one.
async fn run_fanout(
    title: &str,
    mut tasks: Vec<Box<dyn Task>>,
    tree: &Arc<Mutex<JobTree>>,
) -> dazzle_core::job::NodeIndex {
    if tasks.len() == 1 {
        let task = tasks.remove(0);
        TaskRunner::execute(task.as_ref(), tree, None).await
    } else {
        ParallelGroup::new(title, tasks)
            .execute(Arc::clone(tree), None)
            .await
    }
}
