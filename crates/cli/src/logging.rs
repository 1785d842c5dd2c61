// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stderr logging setup, grounded on `oj-daemon::main::setup_logging`'s
//! `tracing_subscriber::registry().with(filter).with(fmt::layer()...)`
//! shape. Simplified to a non-rotating stream since `dazzle` is a
//! short-lived CLI invocation, not a daemon — and pinned to stderr, since
//! stdout is the presenter's exclusive canvas.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
