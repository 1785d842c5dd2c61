// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The live job-tree renderer: one dedicated task drains [`JobEvent`]s and
//! owns the terminal exclusively — a single writer, so redraws never
//! interleave with other output. Uses the same ANSI home/clear-to-EOL
//! redraw idiom as `commands::status::render_frame`.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use dazzle_core::job::{JobEvent, JobNode, JobTree, NodeIndex, StateKind};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::color;

/// Cursor to column 0.
const CURSOR_COL0: &str = "\r";
/// Move the cursor up one line.
const MOVE_UP: &str = "\x1b[1A";
/// Clear from cursor to end of line — erases remnants of a previous,
/// wider frame on the same line (matches `oj status`'s `CLEAR_TO_EOL`).
const CLEAR_TO_EOL: &str = "\x1b[K";
/// Clear from cursor to end of screen — erases leftover lines from a
/// previous, taller frame (matches `oj status`'s `CLEAR_TO_END`).
const CLEAR_TO_END: &str = "\x1b[J";

/// Visible width of every state marker (`"[ XXXX ]"`), colored or not.
const MARKER_WIDTH: usize = 8;

fn terminal_width() -> usize {
    if !std::io::stdout().is_terminal() {
        return 80;
    }
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Trim `text` to `width`, appending `...` when it was truncated.
fn ellipsis(text: &str, width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = chars[..keep.min(chars.len())].iter().collect();
    out.push_str("...");
    out
}

fn pad_marker(inner: &str) -> String {
    format!("{inner:<width$}", width = MARKER_WIDTH)
}

fn animated_marker(kind: StateKind, tick: u64) -> String {
    const CHECKING: [&str; 2] = ["[ .. ]", "[ .· ]"];
    const PRE_RUNNING: [&str; 4] = ["[>   ]", "[ >  ]", "[  > ]", "[   >]"];
    const RUNNING: [&str; 5] = ["[>>>>]", "[>>> ]", "[>>  ]", "[>   ]", "[   >]"];
    const POST_RUNNING: [&str; 4] = ["[<   ]", "[ <  ]", "[  < ]", "[   <]"];

    let (frames, colorize): (&[&str], fn(&str) -> String) = match kind {
        StateKind::Checking => (&CHECKING, color::yellow),
        StateKind::PreRunning => (&PRE_RUNNING, color::cyan),
        StateKind::Running => (&RUNNING, color::cyan),
        StateKind::PostRunning => (&POST_RUNNING, color::cyan),
        _ => unreachable!("animated_marker only called for active states"),
    };
    let frame = frames[(tick as usize) % frames.len()];
    colorize(&pad_marker(frame))
}

fn terminal_marker(kind: StateKind) -> String {
    match kind {
        StateKind::Success => color::green(&pad_marker("[ OK ]")),
        StateKind::Skipped => color::blue(&pad_marker("[ ** ]")),
        StateKind::Failed => color::red(&pad_marker("[!!!!]")),
        _ => unreachable!("terminal_marker only called for terminal states"),
    }
}

/// Blank marker used to left-align message continuation lines.
fn continuation_marker() -> String {
    " ".repeat(MARKER_WIDTH)
}

/// One line of the active block: `{marker}{indent}{title} ({progress})`.
fn format_active_line(node: &JobNode, width: usize, tick: u64) -> String {
    let marker = animated_marker(node.state.kind(), tick);
    let indent = "  ".repeat(node.level);
    let progress = node
        .progress
        .as_deref()
        .map(|p| format!("({p})"))
        .unwrap_or_default();

    let used = MARKER_WIDTH + indent.chars().count() + 1 + progress.chars().count();
    let avail = width.saturating_sub(used).max(1);
    let title = ellipsis(&node.title, avail);

    if progress.is_empty() {
        format!("{marker}{indent}{title}")
    } else {
        format!("{marker}{indent}{title} {progress}")
    }
}

/// Render the backlog line(s) for a node that just became terminal: the
/// final marker + title, then the word-wrapped, continuation-prefixed
/// message.
fn render_backlog(node: &JobNode, width: usize) -> String {
    let mut out = String::new();

    let marker = terminal_marker(node.state.kind());
    let avail = width.saturating_sub(MARKER_WIDTH + 1).max(1);
    let title = ellipsis(&node.title, avail);
    out.push_str(&format!("{marker} {title}{CLEAR_TO_EOL}\n"));

    if let Some(message) = node.state.message() {
        let prefix = continuation_marker();
        let avail = width.saturating_sub(MARKER_WIDTH + 1).max(1);
        for line in message.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let chars: Vec<char> = line.chars().collect();
            for chunk in chars.chunks(avail) {
                let text: String = chunk.iter().collect();
                out.push_str(&format!("{prefix} {text}{CLEAR_TO_EOL}\n"));
            }
        }
    }

    out
}

/// Depth-first active block: every non-`Born`, non-terminal node reachable
/// from a root without crossing an inactive node, one line each.
fn render_active_block(tree: &JobTree, width: usize, tick: u64) -> (usize, String) {
    let mut out = String::new();
    let mut count = 0;

    let roots: Vec<NodeIndex> = (0..tree.len())
        .filter(|&i| tree.node(i).parent.is_none())
        .collect();

    for root in roots {
        collect_active(tree, root, width, tick, &mut out, &mut count);
    }

    (count, out)
}

fn collect_active(
    tree: &JobTree,
    idx: NodeIndex,
    width: usize,
    tick: u64,
    out: &mut String,
    count: &mut usize,
) {
    let node = tree.node(idx);
    if !node.state.kind().is_active() {
        return;
    }

    out.push_str(&format_active_line(node, width, tick));
    out.push_str(CLEAR_TO_EOL);
    out.push('\n');
    *count += 1;

    for &child in &node.children {
        collect_active(tree, child, width, tick, out, count);
    }
}

fn move_cursor_up(lines: usize) -> String {
    format!("{CURSOR_COL0}{}", MOVE_UP.repeat(lines))
}

fn flush(text: &str) {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

/// Owns the terminal for the lifetime of one `dazzle` invocation. Construct
/// with [`Presenter::new`], then hand the result to [`Presenter::run`] on
/// its own task — every other task only ever touches the job tree through
/// `JobTree`'s mutators, never the terminal.
pub struct Presenter {
    tree: Arc<Mutex<JobTree>>,
    events: mpsc::UnboundedReceiver<JobEvent>,
    tick: u64,
    last_active_lines: usize,
}

impl Presenter {
    pub fn new(tree: Arc<Mutex<JobTree>>, events: mpsc::UnboundedReceiver<JobEvent>) -> Self {
        Presenter {
            tree,
            events,
            tick: 0,
            last_active_lines: 0,
        }
    }

    /// Drain events until [`JobEvent::Shutdown`] arrives (sent once the
    /// run is complete) or the channel closes, redrawing after each one.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.tick().await;

        loop {
            tokio::select! {
                event = self.events.recv() => {
                    match event {
                        Some(event) => {
                            if self.handle(event) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    self.tick += 1;
                    self.redraw_only();
                }
            }
        }
    }

    /// Handle one event, returning `true` if the presenter should stop.
    fn handle(&mut self, event: JobEvent) -> bool {
        match event {
            JobEvent::Created(_) | JobEvent::ProgressChanged(_) => self.redraw_only(),
            JobEvent::StateChanged(idx) => self.handle_state_changed(idx),
            JobEvent::Shutdown => return true,
        }
        false
    }

    fn redraw_only(&mut self) {
        let width = terminal_width();
        let mut out = move_cursor_up(self.last_active_lines);

        let (count, block) = {
            let guard = self.tree.lock();
            render_active_block(&guard, width, self.tick)
        };
        out.push_str(&block);
        out.push_str(CLEAR_TO_END);

        self.last_active_lines = count;
        flush(&out);
    }

    /// A node that just became terminal is printed once as a backlog line
    /// above the active block, then dropped from the active set.
    fn handle_state_changed(&mut self, idx: NodeIndex) {
        let width = terminal_width();
        let kind = self.tree.lock().node(idx).state.kind();
        let node_snapshot = self.tree.lock().node(idx).clone();

        let mut out = move_cursor_up(self.last_active_lines);

        if kind.is_terminal() {
            out.push_str(&render_backlog(&node_snapshot, width));
        }

        let (count, block) = {
            let guard = self.tree.lock();
            render_active_block(&guard, width, self.tick)
        };
        out.push_str(&block);
        out.push_str(CLEAR_TO_END);

        self.last_active_lines = count;
        flush(&out);
    }
}

#[cfg(test)]
#[path = "presenter_tests.rs"]
mod tests;
