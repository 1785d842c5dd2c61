// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ANSI color helpers for the presenter's state markers, gated on
//! `NO_COLOR`/`COLOR` and a TTY check.

use std::io::IsTerminal;

const RESET: &str = "\x1b[0m";

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Apply green (ANSI 32) to text, respecting color settings.
pub fn green(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    format!("\x1b[32m{text}{RESET}")
}

/// Apply yellow (ANSI 33) to text, respecting color settings.
pub fn yellow(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    format!("\x1b[33m{text}{RESET}")
}

/// Apply cyan (ANSI 36) to text, respecting color settings.
pub fn cyan(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    format!("\x1b[36m{text}{RESET}")
}

/// Apply blue (ANSI 34) to text, respecting color settings.
pub fn blue(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    format!("\x1b[34m{text}{RESET}")
}

/// Apply red (ANSI 31) to text, respecting color settings.
pub fn red(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    format!("\x1b[31m{text}{RESET}")
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
