// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host inventory: labels, groups, and the `label` / `@group` / `@` lookup
//! grammar. The INI parser is hand-rolled (see DESIGN.md) to match this
//! section/key grammar exactly.

use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ConfigError, HostError};

/// A 6-byte link-layer address, rendered and parsed as colon-separated hex
/// (`aa:bb:cc:dd:ee:ff`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid MAC address: {0}")]
pub struct ParseMacAddrError(String);

impl FromStr for MacAddr {
    type Err = ParseMacAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(ParseMacAddrError(s.to_string()));
        }

        let mut octets = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            octets[i] =
                u8::from_str_radix(part, 16).map_err(|_| ParseMacAddrError(s.to_string()))?;
        }

        Ok(MacAddr(octets))
    }
}

/// A networked machine identified by an operator-chosen label. Immutable
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub label: String,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// The loaded host inventory: a `label -> Host` map plus a `group -> ordered
/// hosts` map.
#[derive(Debug, Default)]
pub struct HostList {
    hosts: HashMap<String, Arc<Host>>,
    groups: HashMap<String, Vec<Arc<Host>>>,
}

impl HostList {
    /// Parse an INI-like host list file. Sections are host labels; options
    /// are `mac` (required), `ip` (required, dotted-quad or hostname),
    /// `group` (optional, comma-separated). A malformed section is logged
    /// and skipped, not fatal. A repeated `[label]` section
    /// replaces the earlier entry.
    pub fn load(path: &Path) -> Result<HostList, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::parse(&text))
    }

    fn parse(text: &str) -> HostList {
        let mut list = HostList::default();
        let mut current_label: Option<String> = None;
        let mut current_opts: HashMap<String, String> = HashMap::new();

        let flush = |label: &Option<String>, opts: &HashMap<String, String>, list: &mut HostList| {
            if let Some(label) = label {
                list.ingest_section(label, opts);
            }
        };

        for raw_line in text.lines() {
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                flush(&current_label, &current_opts, &mut list);
                current_label = Some(section.trim().to_string());
                current_opts = HashMap::new();
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!(line = %raw_line, "ignoring malformed host list line");
                continue;
            };

            current_opts.insert(key.trim().to_lowercase(), value.trim().to_string());
        }

        flush(&current_label, &current_opts, &mut list);

        list
    }

    fn ingest_section(&mut self, label: &str, opts: &HashMap<String, String>) {
        let result: Result<Host, String> = (|| {
            let mac_raw = opts.get("mac").ok_or("missing mac")?;
            let ip_raw = opts.get("ip").ok_or("missing ip")?;

            let mac = MacAddr::from_str(mac_raw).map_err(|e| e.to_string())?;
            let ip = resolve_ip(ip_raw)?;

            Ok(Host {
                label: label.to_string(),
                mac,
                ip,
            })
        })();

        match result {
            Ok(host) => {
                let host = Arc::new(host);

                // A repeated section replaces the earlier entry; drop any
                // stale group memberships recorded under the old instance.
                for hosts in self.groups.values_mut() {
                    hosts.retain(|h| h.label != label);
                }

                self.hosts.insert(label.to_string(), Arc::clone(&host));

                if let Some(groups) = opts.get("group") {
                    for group in groups.split(',') {
                        let group = group.trim();
                        if !group.is_empty() {
                            self.groups
                                .entry(group.to_string())
                                .or_default()
                                .push(Arc::clone(&host));
                        }
                    }
                }
            }
            Err(reason) => {
                tracing::warn!(host = label, reason, "ignoring host");
            }
        }
    }

    /// Resolve a host expression: `@` (all hosts), `@name` (group), or
    /// `label` (single host). Pure; errors if the label/group is unknown.
    pub fn resolve(&self, expr: &str) -> Result<Vec<Arc<Host>>, HostError> {
        if expr == "@" {
            return Ok(self.hosts.values().cloned().collect());
        }

        if let Some(group) = expr.strip_prefix('@') {
            return self
                .groups
                .get(group)
                .cloned()
                .ok_or_else(|| HostError::UnknownLabel(expr.to_string()));
        }

        self.hosts
            .get(expr)
            .cloned()
            .map(|h| vec![h])
            .ok_or_else(|| HostError::UnknownLabel(expr.to_string()))
    }

    /// Resolve multiple host expressions and collapse the result into a set,
    /// preserving first-seen order.
    pub fn resolve_all<'a>(
        &self,
        exprs: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<Arc<Host>>, HostError> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();

        for expr in exprs {
            for host in self.resolve(expr)? {
                if seen.insert(host.label.clone()) {
                    out.push(host);
                }
            }
        }

        Ok(out)
    }
}

fn resolve_ip(raw: &str) -> Result<Ipv4Addr, String> {
    if let Ok(ip) = raw.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    // Hostname form: resolve via the standard DNS lookup used for socket
    // connects.
    use std::net::ToSocketAddrs;
    (raw, 0)
        .to_socket_addrs()
        .map_err(|e| e.to_string())?
        .find_map(|addr| match addr.ip() {
            std::net::IpAddr::V4(v4) => Some(v4),
            std::net::IpAddr::V6(_) => None,
        })
        .ok_or_else(|| format!("could not resolve host: {raw}"))
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
