// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dazzle-adapters: typed wrappers around the external binaries dazzle
//! shells out to (`ping`, `ssh`, `ether-wake`, `udp-sender`,
//! `udp-receiver`). This crate owns the process plumbing only — never the
//! task logic that decides when to invoke it.

pub mod control;
pub mod multicast;
pub mod ping;
pub mod ssh;
pub mod subprocess;
pub mod wol;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use control::{HostControl, ProcessHostControl};
pub use multicast::{LineStream, MulticastError, MulticastTransport, ProcessMulticastTransport, ReceiverHandle, SenderHandle};
pub use ping::ping;
pub use ssh::{ssh, SshError, SshOutput};
pub use wol::{send_magic_packet, WolError};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ControlCall, FakeHostControl, FakeLineStream, FakeMulticastTransport, MulticastCall};
