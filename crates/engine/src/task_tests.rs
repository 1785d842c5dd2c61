// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dazzle_core::job::StateKind;
use tokio::sync::mpsc;

fn new_tree() -> Arc<Mutex<JobTree>> {
    let (tx, _rx) = mpsc::unbounded_channel();
    Arc::new(Mutex::new(JobTree::new(tx)))
}

struct Leaf {
    title: &'static str,
    check: Option<&'static str>,
    result: Result<Option<String>, TaskError>,
}

#[async_trait]
impl Task for Leaf {
    fn title(&self) -> String {
        self.title.to_string()
    }

    async fn check(&self) -> Option<String> {
        self.check.map(str::to_string)
    }

    async fn run(&self, _progress: &ProgressHandle) -> Result<Option<String>, TaskError> {
        match &self.result {
            Ok(message) => Ok(message.clone()),
            Err(TaskError::Failed(message)) => Err(TaskError::Failed(message.clone())),
            Err(other) => Err(TaskError::Failed(other.to_string())),
        }
    }
}

// `pre`/`post` only run once per `execute()` call, so the fixture can hand
// its sub-task list out through a take-once `Mutex<Option<_>>` rather than
// needing `Box<dyn Task>` to be `Clone`.
struct WithSubtasks {
    title: &'static str,
    pre: Mutex<Option<Vec<Box<dyn Task>>>>,
    post: Mutex<Option<Vec<Box<dyn Task>>>>,
}

#[async_trait]
impl Task for WithSubtasks {
    fn title(&self) -> String {
        self.title.to_string()
    }

    fn pre(&self) -> Vec<Box<dyn Task>> {
        self.pre.lock().take().unwrap_or_default()
    }

    async fn run(&self, _progress: &ProgressHandle) -> Result<Option<String>, TaskError> {
        Ok(None)
    }

    fn post(&self) -> Vec<Box<dyn Task>> {
        self.post.lock().take().unwrap_or_default()
    }
}

impl WithSubtasks {
    fn new(
        title: &'static str,
        pre: Vec<Box<dyn Task>>,
        post: Vec<Box<dyn Task>>,
    ) -> Self {
        WithSubtasks {
            title,
            pre: Mutex::new(Some(pre)),
            post: Mutex::new(Some(post)),
        }
    }
}

#[tokio::test]
async fn successful_leaf_reaches_success() {
    let tree = new_tree();
    let task = Leaf {
        title: "leaf",
        check: None,
        result: Ok(Some("done".to_string())),
    };

    let idx = TaskRunner::execute(&task, &tree, None).await;
    let node = tree.lock();
    let node = node.node(idx);
    assert_eq!(node.state.kind(), StateKind::Success);
    assert_eq!(node.state.message(), Some("done"));
}

#[tokio::test]
async fn check_excuse_skips_without_running() {
    let tree = new_tree();
    let task = Leaf {
        title: "leaf",
        check: Some("already done"),
        result: Ok(None),
    };

    let idx = TaskRunner::execute(&task, &tree, None).await;
    let node = tree.lock();
    let node = node.node(idx);
    assert_eq!(node.state.kind(), StateKind::Skipped);
    assert_eq!(node.state.message(), Some("already done"));
}

#[tokio::test]
async fn run_failure_becomes_failed_state() {
    let tree = new_tree();
    let task = Leaf {
        title: "leaf",
        check: None,
        result: Err(TaskError::Failed("boom".to_string())),
    };

    let idx = TaskRunner::execute(&task, &tree, None).await;
    let node = tree.lock();
    let node = node.node(idx);
    assert_eq!(node.state.kind(), StateKind::Failed);
    assert_eq!(node.state.message(), Some("boom"));
}

#[tokio::test]
async fn pre_failure_fails_the_parent_without_running() {
    let tree = new_tree();
    let failing_pre: Box<dyn Task> = Box::new(Leaf {
        title: "pre",
        check: None,
        result: Err(TaskError::Failed("pre failed".to_string())),
    });
    let task = WithSubtasks::new("parent", vec![failing_pre], Vec::new());

    let idx = TaskRunner::execute(&task, &tree, None).await;
    let node = tree.lock();
    let node = node.node(idx);
    assert_eq!(node.state.kind(), StateKind::Failed);
    assert_eq!(node.state.message(), Some("pre failed"));
}

#[tokio::test]
async fn post_failure_fails_the_parent_after_run_succeeds() {
    let tree = new_tree();
    let failing_post: Box<dyn Task> = Box::new(Leaf {
        title: "post",
        check: None,
        result: Err(TaskError::Failed("post failed".to_string())),
    });
    let task = WithSubtasks::new("parent", Vec::new(), vec![failing_post]);

    let idx = TaskRunner::execute(&task, &tree, None).await;
    let node = tree.lock();
    let node = node.node(idx);
    assert_eq!(node.state.kind(), StateKind::Failed);
    assert_eq!(node.state.message(), Some("post failed"));
}

struct ReportsProgress;

#[async_trait]
impl Task for ReportsProgress {
    fn title(&self) -> String {
        "reporter".to_string()
    }

    async fn run(&self, progress: &ProgressHandle) -> Result<Option<String>, TaskError> {
        progress.set("Poke 01 / 60");
        Ok(None)
    }
}

#[tokio::test]
async fn run_can_report_progress_before_completing() {
    let tree = new_tree();
    let task = ReportsProgress;

    // `progress.set` mutates the node while it's still `Running`; by the
    // time `execute` returns the node has moved on to `Success` and
    // cleared `progress` again, so this only checks it didn't panic.
    let idx = TaskRunner::execute(&task, &tree, None).await;
    assert_eq!(tree.lock().node(idx).state.kind(), StateKind::Success);
}

#[tokio::test]
async fn sub_tasks_are_recorded_as_children_of_the_parent_node() {
    let tree = new_tree();
    let pre: Box<dyn Task> = Box::new(Leaf {
        title: "pre",
        check: None,
        result: Ok(None),
    });
    let task = WithSubtasks::new("parent", vec![pre], Vec::new());

    let idx = TaskRunner::execute(&task, &tree, None).await;
    let guard = tree.lock();
    assert_eq!(guard.node(idx).children.len(), 1);
    assert_eq!(guard.node(guard.node(idx).children[0]).title, "pre");
}
