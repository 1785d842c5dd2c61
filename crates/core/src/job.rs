// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job tree: an arena of [`JobNode`]s with a validated state machine.
//! Nodes live in a flat `Vec` indexed by [`NodeIndex`] rather than a
//! parent-pointer tree, and the state hierarchy is a tagged [`JobState`]
//! enum with an explicit antecedent table rather than a per-state
//! subclass hierarchy.

use std::collections::HashSet;

use tokio::sync::mpsc;

/// Index of a node within a [`JobTree`]'s arena.
pub type NodeIndex = usize;

/// The state of a job node. Terminal variants (`Success`/`Skipped`/`Failed`)
/// carry their own message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Born,
    Checking,
    PreRunning,
    Running,
    PostRunning,
    Success(Option<String>),
    Skipped(String),
    Failed(String),
}

/// Tag-only projection of [`JobState`], used for transition-table lookups
/// and presenter frame selection without matching on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Born,
    Checking,
    PreRunning,
    Running,
    PostRunning,
    Success,
    Skipped,
    Failed,
}

impl JobState {
    pub fn kind(&self) -> StateKind {
        match self {
            JobState::Born => StateKind::Born,
            JobState::Checking => StateKind::Checking,
            JobState::PreRunning => StateKind::PreRunning,
            JobState::Running => StateKind::Running,
            JobState::PostRunning => StateKind::PostRunning,
            JobState::Success(_) => StateKind::Success,
            JobState::Skipped(_) => StateKind::Skipped,
            JobState::Failed(_) => StateKind::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    /// The message carried by a terminal state, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            JobState::Success(msg) => msg.as_deref(),
            JobState::Skipped(excuse) => Some(excuse),
            JobState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl StateKind {
    pub fn is_terminal(self) -> bool {
        matches!(self, StateKind::Success | StateKind::Skipped | StateKind::Failed)
    }

    /// Active = non-`Born`, non-terminal.
    pub fn is_active(self) -> bool {
        !matches!(self, StateKind::Born) && !self.is_terminal()
    }

    /// Allowed antecedents for a transition into this state.
    fn allowed_antecedents(self) -> &'static [StateKind] {
        use StateKind::*;
        match self {
            Born => &[],
            Checking => &[Born],
            PreRunning => &[Born, Checking],
            Running => &[Born, Checking, PreRunning],
            PostRunning => &[Running],
            Success => &[Running, PostRunning],
            Skipped => &[Checking],
            Failed => &[Checking, PreRunning, Running, PostRunning],
        }
    }
}

/// A single node in the job tree.
#[derive(Debug, Clone)]
pub struct JobNode {
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    pub title: String,
    pub state: JobState,
    pub progress: Option<String>,
    pub level: usize,
}

/// Notification pushed to the presenter on every mutation (REDESIGN FLAGS
/// §9: "Ad-hoc thread-of-observers → single channel"). Carries only the
/// index; the presenter reads current node data back out of the tree under
/// its own lock.
#[derive(Debug, Clone, Copy)]
pub enum JobEvent {
    Created(NodeIndex),
    StateChanged(NodeIndex),
    ProgressChanged(NodeIndex),
    /// The run is over; the presenter should render its last frame and
    /// return. Sent explicitly rather than relied on via channel closure,
    /// since the presenter itself holds a strong reference to the tree
    /// that owns the sending half.
    Shutdown,
}

/// The append-only arena of job nodes plus the maintained active set.
pub struct JobTree {
    nodes: Vec<JobNode>,
    active: HashSet<NodeIndex>,
    events: mpsc::UnboundedSender<JobEvent>,
}

impl JobTree {
    pub fn new(events: mpsc::UnboundedSender<JobEvent>) -> Self {
        JobTree {
            nodes: Vec::new(),
            active: HashSet::new(),
            events,
        }
    }

    /// Create a new node as a child of `parent` (or a root node if `None`).
    /// A child is only ever added to a non-terminal parent (invariant 4).
    pub fn create(&mut self, parent: Option<NodeIndex>, title: impl Into<String>) -> NodeIndex {
        if let Some(parent) = parent {
            assert!(
                !self.nodes[parent].state.is_terminal(),
                "cannot add a child to a terminal parent"
            );
        }

        let level = parent.map_or(0, |p| self.nodes[p].level + 1);
        let idx = self.nodes.len();

        self.nodes.push(JobNode {
            parent,
            children: Vec::new(),
            title: title.into(),
            state: JobState::Born,
            progress: None,
            level,
        });

        if let Some(parent) = parent {
            self.nodes[parent].children.push(idx);
        }

        let _ = self.events.send(JobEvent::Created(idx));
        idx
    }

    pub fn node(&self, idx: NodeIndex) -> &JobNode {
        &self.nodes[idx]
    }

    /// Validate and apply a state transition. Clears
    /// `progress`. An illegal transition, or a transition out of a terminal
    /// state, is a programming error (assertion), not a recoverable result.
    pub fn transition(&mut self, idx: NodeIndex, new_state: JobState) {
        let kind = new_state.kind();
        let node = &mut self.nodes[idx];

        assert!(!node.state.is_terminal(), "job node {idx} is already terminal");
        assert!(
            kind.allowed_antecedents().contains(&node.state.kind()),
            "illegal transition {:?} -> {:?}",
            node.state.kind(),
            kind
        );

        node.state = new_state;
        node.progress = None;

        if kind.is_terminal() {
            self.active.remove(&idx);
        } else if kind.is_active() {
            self.active.insert(idx);
        }

        let _ = self.events.send(JobEvent::StateChanged(idx));
    }

    /// Update `progress` without changing state.
    pub fn set_progress(&mut self, idx: NodeIndex, value: impl Into<String>) {
        let node = &mut self.nodes[idx];
        assert!(!node.state.is_terminal(), "job node {idx} is already terminal");

        node.progress = Some(value.into());
        let _ = self.events.send(JobEvent::ProgressChanged(idx));
    }

    /// The set of active nodes (non-`Born`, non-terminal) the presenter
    /// animates.
    pub fn active_nodes(&self) -> &HashSet<NodeIndex> {
        &self.active
    }

    /// Signal the presenter that the run is complete and it should render
    /// its last frame and return. The tree's event channel cannot be
    /// closed by dropping `Arc`s alone: the presenter holds its own
    /// strong reference to the tree so it can read node data back out on
    /// every event.
    pub fn request_shutdown(&self) {
        let _ = self.events.send(JobEvent::Shutdown);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
