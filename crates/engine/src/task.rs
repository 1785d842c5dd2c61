// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Task` trait and the single interpreter that drives every task
//! through the five-step check/pre/run/post protocol: one interpreter
//! walks every task's lifecycle rather than each task overriding its own
//! `execute()`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use dazzle_core::job::{JobState, JobTree, NodeIndex};
use dazzle_core::error::TaskError;
use parking_lot::Mutex;

/// A handle a running task uses to report its own progress line (e.g.
/// `"Poke 12 / 60"`), without needing to know its own node index or hold
/// the tree lock itself.
#[derive(Clone)]
pub struct ProgressHandle {
    tree: Arc<Mutex<JobTree>>,
    idx: NodeIndex,
}

impl ProgressHandle {
    fn new(tree: Arc<Mutex<JobTree>>, idx: NodeIndex) -> Self {
        ProgressHandle { tree, idx }
    }

    pub fn set(&self, value: impl Into<String>) {
        self.tree.lock().set_progress(self.idx, value);
    }

    /// A throwaway handle backed by its own single-node tree, for tests
    /// that exercise a task's `run` directly instead of going through
    /// [`TaskRunner::execute`].
    #[cfg(test)]
    pub(crate) fn for_test() -> Self {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let tree = Arc::new(Mutex::new(JobTree::new(tx)));
        let idx = tree.lock().create(None, "test");
        tree.lock().transition(idx, JobState::Checking);
        tree.lock().transition(idx, JobState::Running);
        ProgressHandle::new(tree, idx)
    }
}

/// A single unit of work against one host. Implementors describe *what*
/// to do; [`TaskRunner::execute`] owns *how* the check/pre/run/post
/// protocol is sequenced and reflected into the job tree.
#[async_trait]
pub trait Task: Send + Sync {
    /// Human-readable title, shown as the job node's label.
    fn title(&self) -> String;

    /// Returns `Some(excuse)` to skip the task without running it.
    async fn check(&self) -> Option<String> {
        None
    }

    /// Sub-tasks that must all succeed before `run` executes.
    fn pre(&self) -> Vec<Box<dyn Task>> {
        Vec::new()
    }

    /// The task's own work. `Ok(message)` becomes the `Success` payload.
    /// `progress` reports interim status (e.g. a poke-loop counter or a
    /// transfer rate) to the job tree while `run` is in flight.
    async fn run(&self, progress: &ProgressHandle) -> Result<Option<String>, TaskError>;

    /// Sub-tasks that must all succeed after `run` succeeds.
    fn post(&self) -> Vec<Box<dyn Task>> {
        Vec::new()
    }
}

pub struct TaskRunner;

impl TaskRunner {
    /// Drive `task` to completion as a child of `parent` (or a root node
    /// if `parent` is `None`), returning the index of the node it was
    /// assigned. Recurses into `pre`/`post` sub-tasks as siblings under
    /// the same node.
    pub fn execute<'a>(
        task: &'a (dyn Task + 'a),
        tree: &'a Arc<Mutex<JobTree>>,
        parent: Option<NodeIndex>,
    ) -> Pin<Box<dyn Future<Output = NodeIndex> + Send + 'a>> {
        Box::pin(async move {
            let idx = tree.lock().create(parent, task.title());

            tree.lock().transition(idx, JobState::Checking);
            if let Some(excuse) = task.check().await {
                tree.lock().transition(idx, JobState::Skipped(excuse));
                return idx;
            }

            let pre = task.pre();
            if !pre.is_empty() {
                tree.lock().transition(idx, JobState::PreRunning);
                if let Some(failure) = Self::run_sequence(&pre, tree, idx).await {
                    tree.lock().transition(idx, JobState::Failed(failure));
                    return idx;
                }
            }

            tree.lock().transition(idx, JobState::Running);
            let progress = ProgressHandle::new(Arc::clone(tree), idx);
            let run_result = task.run(&progress).await;

            let message = match run_result {
                Ok(message) => message,
                Err(err) => {
                    tree.lock()
                        .transition(idx, JobState::Failed(err.operator_message()));
                    return idx;
                }
            };

            let post = task.post();
            if !post.is_empty() {
                tree.lock().transition(idx, JobState::PostRunning);
                if let Some(failure) = Self::run_sequence(&post, tree, idx).await {
                    tree.lock().transition(idx, JobState::Failed(failure));
                    return idx;
                }
            }

            tree.lock().transition(idx, JobState::Success(message));
            idx
        })
    }

    /// Run a pre/post sub-task list in order, stopping at the first
    /// failure. Returns the failing sub-task's message, if any.
    async fn run_sequence(
        tasks: &[Box<dyn Task>],
        tree: &Arc<Mutex<JobTree>>,
        parent: NodeIndex,
    ) -> Option<String> {
        for sub in tasks {
            let sub_idx = Self::execute(sub.as_ref(), tree, Some(parent)).await;
            let failure = match &tree.lock().node(sub_idx).state {
                JobState::Failed(message) => Some(message.clone()),
                _ => None,
            };
            if failure.is_some() {
                return failure;
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
