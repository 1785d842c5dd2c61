// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The multicast clone coordinator: one sender rendezvousing with N
//! receivers over `udp-sender`/`udp-receiver`.
//!
//! [`Receive`] is a per-host [`Task`] (pre: [`Acquire`], post: [`Shutdown`])
//! that drives one `udp-receiver`. [`Clone`] is the coordinator: it is not
//! itself a `Task` (like [`crate::group::ParallelGroup`], it has no
//! check/pre/post of its own) — it fans `Receive` tasks out, blocks until
//! every one signals readiness, only then starts the sender, and finally
//! folds every child's terminal state into its own.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dazzle_adapters::control::HostControl;
use dazzle_adapters::multicast::MulticastTransport;
use dazzle_core::error::TaskError;
use dazzle_core::host::Host;
use dazzle_core::job::{JobState, JobTree, NodeIndex};
use dazzle_core::util::human_bytes;
use parking_lot::Mutex;
use regex::Regex;
use tokio::sync::oneshot;

use crate::task::{ProgressHandle, Task, TaskRunner};
use crate::tasks::ctrl::{Acquire, Shutdown};

/// Default multicast rendezvous address, overridable per invocation — the
/// CLI threads its own choice through rather than hard-coding one.
pub const DEFAULT_MCAST_RDV_ADDRESS: &str = "232.0.0.1:9000";

fn ready_banner(line: &str) -> bool {
    line.starts_with("Compressed UDP receiver")
}

fn connected_banner(line: &str) -> bool {
    line.starts_with("Connected as")
}

/// Parse a `bytes=` transfer-progress line: `bytes=` followed by 1-3
/// groups of 1-3 digits separated by spaces, an optional trailing `K`/`M`
/// scale, and a parenthesized Mbps rate. Returns `(bytes_transferred, mbps)`.
pub fn parse_bytes(line: &str) -> Option<(f64, f64)> {
    let re =
        Regex::new(r"bytes=((?:\s?\d{1,3}){1,3}\s?[KM]?)\s*\(([\d.]+)\s*Mbps\)").expect("valid regex");
    let captures = re.captures(line)?;

    let raw: String = captures[1].chars().filter(|c| !c.is_whitespace()).collect();
    if raw.is_empty() {
        return None;
    }

    let last = raw.chars().last().expect("checked non-empty above");
    let (digits, scale) = match last {
        'M' => (&raw[..raw.len() - 1], 1024.0 * 1024.0),
        'K' => (&raw[..raw.len() - 1], 1024.0),
        _ => (raw.as_str(), 1.0),
    };

    let bytes: f64 = digits.parse().ok()?;
    let mbps: f64 = captures[2].parse().ok()?;
    Some((bytes * scale, mbps))
}

/// Drives the receiver half of the clone on one host: boots it into
/// maintenance ([`Acquire`]), streams `udp-receiver`'s stderr, and shuts it
/// down again ([`Shutdown`]) once the transfer finishes.
pub struct Receive<C, M> {
    pub host: Arc<Host>,
    pub control: Arc<C>,
    pub transport: Arc<M>,
    pub dst: PathBuf,
    pub mcast_addr: String,
    pub tftp_root: PathBuf,
    ready_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl<C, M> Receive<C, M> {
    pub fn new(
        host: Arc<Host>,
        control: Arc<C>,
        transport: Arc<M>,
        dst: PathBuf,
        mcast_addr: impl Into<String>,
        ready_tx: oneshot::Sender<()>,
    ) -> Self {
        Receive {
            host,
            control,
            transport,
            dst,
            mcast_addr: mcast_addr.into(),
            tftp_root: PathBuf::from(super::ctrl::DEFAULT_TFTP_ROOT),
            ready_tx: Mutex::new(Some(ready_tx)),
        }
    }

    fn receiver_args(&self) -> Vec<String> {
        vec![
            "--mcast-rdv-address".to_string(),
            self.mcast_addr.clone(),
            "--nokbd".to_string(),
            "--file".to_string(),
            self.dst.display().to_string(),
            "--pipe".to_string(),
            "lzop -dc".to_string(),
        ]
    }
}

#[async_trait]
impl<C: HostControl + 'static, M: MulticastTransport + 'static> Task for Receive<C, M> {
    fn title(&self) -> String {
        format!("Receiving on {}", self.host.label)
    }

    fn pre(&self) -> Vec<Box<dyn Task>> {
        let mut acquire = Acquire::new(Arc::clone(&self.host), Arc::clone(&self.control));
        acquire.tftp_root = self.tftp_root.clone();
        vec![Box::new(acquire)]
    }

    fn post(&self) -> Vec<Box<dyn Task>> {
        vec![Box::new(Shutdown::new(Arc::clone(&self.host), Arc::clone(&self.control)))]
    }

    async fn run(&self, progress: &ProgressHandle) -> Result<Option<String>, TaskError> {
        let mut stream = self
            .transport
            .spawn_receiver(self.host.ip, self.receiver_args())
            .await
            .map_err(|e| TaskError::Failed(e.to_string()))?;

        let mut last_transfer: Option<(f64, f64)> = None;

        while let Some(line) = stream.next_line().await {
            if ready_banner(&line) {
                progress.set("Ready");
                if let Some(tx) = self.ready_tx.lock().take() {
                    let _ = tx.send(());
                }
            } else if connected_banner(&line) {
                progress.set("Connected");
            } else if let Some((bytes, mbps)) = parse_bytes(&line) {
                last_transfer = Some((bytes, mbps));
                progress.set(format!("{} @ {mbps:.1} MB/s", human_bytes(bytes)));
            }
        }

        let success = stream.wait().await.map_err(|e| TaskError::Failed(e.to_string()))?;
        if !success {
            return Err(TaskError::Failed("udp-receiver exited with a failure".to_string()));
        }

        Ok(last_transfer.map(|(bytes, _)| format!("received {}", human_bytes(bytes))))
    }
}

/// The sender/N-receiver rendezvous coordinator. Not itself
/// a [`Task`]: it owns a custom `execute` the way [`crate::group::ParallelGroup`]
/// does, because the rendezvous barrier and the late-started sender don't
/// fit the plain check/pre/run/post shape.
pub struct Clone<C, M> {
    pub hosts: Vec<Arc<Host>>,
    pub control: Arc<C>,
    pub transport: Arc<M>,
    pub src: PathBuf,
    pub dst: PathBuf,
    pub mcast_addr: String,
    pub tftp_root: PathBuf,
}

impl<C, M> Clone<C, M> {
    pub fn new(hosts: Vec<Arc<Host>>, control: Arc<C>, transport: Arc<M>, src: PathBuf, dst: PathBuf) -> Self {
        Clone {
            hosts,
            control,
            transport,
            src,
            dst,
            mcast_addr: DEFAULT_MCAST_RDV_ADDRESS.to_string(),
            tftp_root: PathBuf::from(super::ctrl::DEFAULT_TFTP_ROOT),
        }
    }

    fn sender_args(&self) -> Vec<String> {
        vec![
            "--mcast-rdv-address".to_string(),
            self.mcast_addr.clone(),
            "--min-receivers".to_string(),
            self.hosts.len().to_string(),
            "--file".to_string(),
            self.src.display().to_string(),
            "--pipe".to_string(),
            "lzop".to_string(),
        ]
    }
}

impl<C: HostControl + 'static, M: MulticastTransport + 'static> Clone<C, M> {
    /// Run the full rendezvous to completion as a child of `parent`,
    /// returning the coordinator's own node index. Folds every receiver's
    /// terminal state the way a parallel group would, extended with the
    /// rendezvous barrier below.
    pub async fn execute(self, tree: Arc<Mutex<JobTree>>, parent: Option<NodeIndex>) -> NodeIndex {
        let idx = tree.lock().create(parent, format!("Cloning to {} host(s)", self.hosts.len()));
        tree.lock().transition(idx, JobState::Running);

        let mut ready_rxs = Vec::with_capacity(self.hosts.len());
        let mut handles = Vec::with_capacity(self.hosts.len());

        for host in &self.hosts {
            let (ready_tx, ready_rx) = oneshot::channel();
            let mut receive = Receive::new(
                Arc::clone(host),
                Arc::clone(&self.control),
                Arc::clone(&self.transport),
                self.dst.clone(),
                self.mcast_addr.clone(),
                ready_tx,
            );
            receive.tftp_root = self.tftp_root.clone();

            ready_rxs.push(ready_rx);

            let tree = Arc::clone(&tree);
            handles.push(tokio::spawn(async move {
                TaskRunner::execute(&receive, &tree, Some(idx)).await
            }));
        }

        // Rendezvous: block until every receiver has signaled ready before
        // the sender is ever spawned.
        // A receiver whose task drops its sender (fails before reaching
        // `ready`) resolves its half of the rendezvous with an error
        // immediately rather than hanging the barrier forever.
        let mut rendezvous_failure = None;
        for rx in ready_rxs {
            if rx.await.is_err() {
                rendezvous_failure = Some("a receiver failed before reaching rendezvous".to_string());
                break;
            }
        }

        let sender_outcome = if let Some(failure) = &rendezvous_failure {
            Err(failure.clone())
        } else {
            run_sender(self.transport.as_ref(), self.sender_args(), &tree, idx).await
        };

        let mut child_indices = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(child_idx) = handle.await {
                child_indices.push(child_idx);
            }
        }

        let mut failures: Vec<String> = child_indices
            .iter()
            .filter_map(|&i| match &tree.lock().node(i).state {
                JobState::Failed(message) => Some(message.clone()),
                _ => None,
            })
            .collect();

        if let Err(message) = sender_outcome {
            failures.insert(0, message);
        }

        let final_state = match failures.len() {
            0 => JobState::Success(None),
            1 => JobState::Failed(failures.into_iter().next().expect("len checked above")),
            _ => JobState::Failed(failures.join("; ")),
        };

        tree.lock().transition(idx, final_state);
        idx
    }
}

/// Spawn `udp-sender`, stream its throughput lines into the coordinator's
/// own progress, and report whether it exited cleanly.
async fn run_sender<M: MulticastTransport>(
    transport: &M,
    args: Vec<String>,
    tree: &Arc<Mutex<JobTree>>,
    idx: NodeIndex,
) -> Result<(), String> {
    let mut stream = transport.spawn_sender(args).await.map_err(|e| e.to_string())?;

    while let Some(line) = stream.next_line().await {
        if let Some((bytes, _mbps)) = parse_bytes(&line) {
            tree.lock().set_progress(idx, format!("{}/s", human_bytes(bytes)));
        }
    }

    let success = stream.wait().await.map_err(|e| e.to_string())?;
    if success {
        Ok(())
    } else {
        Err("udp-sender exited with a failure".to_string())
    }
}

#[cfg(test)]
#[path = "clone_tests.rs"]
mod tests;
