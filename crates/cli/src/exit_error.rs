// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An [`anyhow::Error`] wrapper carrying the process exit code it should
//! cause, so `main` can pick a code without every call site threading one
//! through. Errors that don't wrap this exit with the default code, 1.

use std::fmt;

/// Argument parsing or host-list/config failures raised before any task
/// starts: exit code 2.
pub const CONFIG: i32 = 2;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        ExitError {
            code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> anyhow::Error {
        ExitError::new(CONFIG, message).into()
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
