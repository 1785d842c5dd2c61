//! Host expression grammar and de-duplication.

use crate::prelude::*;

const GROUPED_HOSTS: &str = "\
[a]
mac = 02:00:00:00:00:01
ip = 127.0.0.1
group = all

[b]
mac = 02:00:00:00:00:02
ip = 127.0.0.1
group = all
";

#[test]
fn at_sign_selects_every_host() {
    let fixture = Fixture::new();
    let path = fixture.hostlist(GROUPED_HOSTS);

    // Both hosts are loopback-reachable, so "wakeup" immediately skips
    // each one via check() — deterministic, no real wake-on-LAN needed.
    dazzle(&path)
        .args(&["wakeup", "@"])
        .passes()
        .stdout_has("Waking up a")
        .stdout_has("Waking up b");
}

#[test]
fn group_and_label_expressions_collapse_to_one_host() {
    let fixture = Fixture::new();
    let path = fixture.hostlist(GROUPED_HOSTS);

    // "@all" already contains "a"; naming it again should not spawn a
    // second "Waking up a" node.
    let run = dazzle(&path).args(&["wakeup", "@all", "a"]).passes();
    let stdout = run.stdout();
    let occurrences = stdout.matches("Waking up a").count();
    assert_eq!(occurrences, 1, "expected host 'a' to appear once\n{stdout}");
}

#[test]
fn duplicate_label_section_last_one_wins() {
    let fixture = Fixture::new();
    let body = "\
[dup]
mac = 02:00:00:00:00:01
ip = 203.0.113.1

[dup]
mac = 02:00:00:00:00:02
ip = 127.0.0.1
";
    let path = fixture.hostlist(body);

    // The second [dup] section points at loopback; if replacement won
    // the host is reachable and wakeup immediately skips.
    dazzle(&path)
        .args(&["wakeup", "dup"])
        .passes()
        .stdout_has("Host is already up");
}
