// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_simple_host() {
    let list = HostList::parse(
        "[srv1]\nmac = 00:11:22:33:44:55\nip = 10.0.0.1\n",
    );

    let hosts = list.resolve("srv1").unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].label, "srv1");
    assert_eq!(hosts[0].ip, Ipv4Addr::new(10, 0, 0, 1));
    assert_eq!(hosts[0].mac.to_string(), "00:11:22:33:44:55");
}

#[test]
fn groups_collect_ordered_members() {
    let list = HostList::parse(
        "[a]\nmac = 00:11:22:33:44:01\nip = 10.0.0.1\ngroup = web\n\
         [b]\nmac = 00:11:22:33:44:02\nip = 10.0.0.2\ngroup = web, db\n",
    );

    let web = list.resolve("@web").unwrap();
    assert_eq!(web.iter().map(|h| h.label.as_str()).collect::<Vec<_>>(), ["a", "b"]);

    let db = list.resolve("@db").unwrap();
    assert_eq!(db.len(), 1);
    assert_eq!(db[0].label, "b");
}

#[test]
fn at_returns_all_hosts() {
    let list = HostList::parse(
        "[a]\nmac = 00:11:22:33:44:01\nip = 10.0.0.1\n\
         [b]\nmac = 00:11:22:33:44:02\nip = 10.0.0.2\n",
    );

    let all = list.resolve("@").unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn unknown_label_errors() {
    let list = HostList::parse("");
    assert!(matches!(list.resolve("nope"), Err(HostError::UnknownLabel(_))));
    assert!(matches!(list.resolve("@nope"), Err(HostError::UnknownLabel(_))));
}

#[test]
fn malformed_section_is_skipped_not_fatal() {
    let list = HostList::parse(
        "[broken]\nip = 10.0.0.1\n\
         [ok]\nmac = 00:11:22:33:44:55\nip = 10.0.0.2\n",
    );

    assert!(list.resolve("broken").is_err());
    assert!(list.resolve("ok").is_ok());
}

#[test]
fn duplicate_label_replaces_earlier_entry() {
    let list = HostList::parse(
        "[srv1]\nmac = 00:11:22:33:44:01\nip = 10.0.0.1\ngroup = old\n\
         [srv1]\nmac = 00:11:22:33:44:02\nip = 10.0.0.2\ngroup = new\n",
    );

    let hosts = list.resolve("srv1").unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].ip, Ipv4Addr::new(10, 0, 0, 2));

    assert!(list.resolve("@old").is_err());
    assert_eq!(list.resolve("@new").unwrap().len(), 1);
}

#[test]
fn resolve_all_deduplicates_preserving_order() {
    let list = HostList::parse(
        "[a]\nmac = 00:11:22:33:44:01\nip = 10.0.0.1\ngroup = g\n\
         [b]\nmac = 00:11:22:33:44:02\nip = 10.0.0.2\ngroup = g\n",
    );

    let resolved = list.resolve_all(["@g", "a"]).unwrap();
    assert_eq!(
        resolved.iter().map(|h| h.label.as_str()).collect::<Vec<_>>(),
        ["a", "b"]
    );
}

#[test]
fn load_reports_io_error_for_missing_file() {
    let err = HostList::load(Path::new("/nonexistent/dazzle.conf")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dazzle.conf");
    std::fs::write(&path, "[srv1]\nmac = 00:11:22:33:44:55\nip = 10.0.0.1\n").unwrap();

    let list = HostList::load(&path).unwrap();
    assert_eq!(list.resolve("srv1").unwrap().len(), 1);
}
