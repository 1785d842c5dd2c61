// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by the host inventory and task engine.

use std::path::PathBuf;

/// Failures surfaced before any task starts: a bad host list file. Always
/// fatal to the invocation (exit code 2).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read host list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to resolve a host expression against the inventory.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("unknown host or group: {0}")]
    UnknownLabel(String),
}

/// A task's `check`/`run`/`post` failed. Carries the operator-facing message
/// that becomes the job's `Failed` payload.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TaskError {
    /// Preference order for turning a captured failure into operator text:
    /// stderr, then stdout, then a formatted cause chain.
    pub fn from_command(stderr: &str, stdout: &str, fallback: &str) -> Self {
        let stderr = stderr.trim();
        let stdout = stdout.trim();

        if !stderr.is_empty() {
            TaskError::Failed(stderr.to_string())
        } else if !stdout.is_empty() {
            TaskError::Failed(stdout.to_string())
        } else {
            TaskError::Failed(fallback.to_string())
        }
    }

    /// The message to store as the job's `Failed` payload.
    pub fn operator_message(&self) -> String {
        self.to_string()
    }
}
