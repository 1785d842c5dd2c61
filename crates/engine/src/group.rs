// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out over a set of hosts: one CLI invocation spawns one task per
//! host and joins them all. Each host task is driven by
//! [`TaskRunner::execute`] under its own `tokio::spawn`, as a sibling job
//! node under the group's own node.
//!
//! No dependency on the `futures` crate: joining a fixed set of
//! `tokio::spawn` handles is the same "wait for everything, keep going on
//! individual failure" shape `futures::future::join_all` gives, without
//! pulling in a crate this corpus never reaches for.

use std::sync::Arc;

use dazzle_core::job::{JobState, JobTree, NodeIndex};
use parking_lot::Mutex;

use crate::task::{Task, TaskRunner};

/// A set of independent tasks run concurrently, one per host, as children
/// of a single group node.
pub struct ParallelGroup {
    title: String,
    children: Vec<Box<dyn Task>>,
}

impl ParallelGroup {
    pub fn new(title: impl Into<String>, children: Vec<Box<dyn Task>>) -> Self {
        ParallelGroup {
            title: title.into(),
            children,
        }
    }

    /// Run every child task concurrently under `parent`, then fold their
    /// outcomes into the group's own terminal state: all
    /// succeed/skip → `Success`; one failure → that failure's message;
    /// more than one failure → their messages concatenated.
    pub async fn execute(self, tree: Arc<Mutex<JobTree>>, parent: Option<NodeIndex>) -> NodeIndex {
        let idx = tree.lock().create(parent, self.title);
        tree.lock().transition(idx, JobState::Running);

        let handles: Vec<_> = self
            .children
            .into_iter()
            .map(|child| {
                let tree = Arc::clone(&tree);
                tokio::spawn(async move { TaskRunner::execute(child.as_ref(), &tree, Some(idx)).await })
            })
            .collect();

        let mut child_indices = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(child_idx) = handle.await {
                child_indices.push(child_idx);
            }
        }

        let failures: Vec<String> = child_indices
            .iter()
            .filter_map(|&i| match &tree.lock().node(i).state {
                JobState::Failed(message) => Some(message.clone()),
                _ => None,
            })
            .collect();

        let final_state = match failures.len() {
            0 => JobState::Success(None),
            1 => JobState::Failed(failures.into_iter().next().expect("len checked above")),
            _ => JobState::Failed(failures.join("; ")),
        };

        tree.lock().transition(idx, final_state);
        idx
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
