// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small formatting helpers shared across the host inventory and task engine:
//! IP-HEX encoding for the TFTP convention, and binary byte humanization for
//! clone transfer progress.

use std::net::Ipv4Addr;

/// Render a dotted-quad as 8 uppercase hex digits, per the TFTP maintenance
/// convention.
pub fn ip_hex(ip: Ipv4Addr) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{a:02X}{b:02X}{c:02X}{d:02X}")
}

/// Parse an 8-digit uppercase hex string back into a dotted-quad. Accepts
/// only exactly 8 hex digits, matching what `ip_hex` produces.
pub fn parse_ip_hex(hex: &str) -> Option<Ipv4Addr> {
    if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let bits = u32::from_str_radix(hex, 16).ok()?;
    Some(Ipv4Addr::from(bits))
}

/// Binary-unit humanization (`KiB`/`MiB`/`GiB`), one decimal place.
pub fn human_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024.0 {
        return format!("{bytes:.0} B");
    }

    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
#[path = "util_tests.rs"]
mod tests;
