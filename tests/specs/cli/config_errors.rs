//! Config-stage failures surface before any task starts, exit code 2.

use crate::prelude::*;

#[test]
fn missing_hostlist_file_exits_2() {
    let fixture = Fixture::new();
    let missing = fixture.path().join("does-not-exist.conf");

    dazzle(&missing)
        .args(&["wakeup", "anything"])
        .fails_with(2)
        .stderr_has("cannot read host list");
}

#[test]
fn unknown_host_label_exits_2() {
    let fixture = Fixture::new();
    let path = fixture.hostlist(LOOPBACK_HOST);

    dazzle(&path)
        .args(&["wakeup", "nonexistent-host"])
        .fails_with(2)
        .stderr_has("unknown host or group");
}

#[test]
fn unknown_group_expression_exits_2() {
    let fixture = Fixture::new();
    let path = fixture.hostlist(LOOPBACK_HOST);

    dazzle(&path)
        .args(&["wakeup", "@nosuchgroup"])
        .fails_with(2)
        .stderr_has("unknown host or group: @nosuchgroup");
}

#[test]
fn malformed_section_is_skipped_not_fatal() {
    let fixture = Fixture::new();
    // "broken" is missing both mac and ip — should be logged and skipped,
    // not cause the whole file to fail to load.
    let body = format!(
        "{LOOPBACK_HOST}\n[broken]\ngroup = x\n"
    );
    let path = fixture.hostlist(&body);

    // The well-formed host still resolves and runs; only the malformed
    // section's label is unknown.
    dazzle(&path)
        .args(&["wakeup", "broken"])
        .fails_with(2)
        .stderr_has("unknown host or group: broken");
}
