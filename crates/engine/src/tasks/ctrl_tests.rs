// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dazzle_adapters::fake::FakeHostControl;
use dazzle_core::job::{JobState, JobTree, StateKind};
use tokio::sync::mpsc;

fn sample_host() -> Arc<Host> {
    Arc::new(Host {
        label: "web1".to_string(),
        mac: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
        ip: "10.0.0.5".parse().unwrap(),
    })
}

fn new_tree() -> Arc<parking_lot::Mutex<JobTree>> {
    let (tx, _rx) = mpsc::unbounded_channel();
    Arc::new(parking_lot::Mutex::new(JobTree::new(tx)))
}

#[tokio::test]
async fn wakeup_check_skips_an_already_up_host() {
    let host = sample_host();
    let control = Arc::new(FakeHostControl::new());
    control.set_reachable_sequence(host.ip, vec![true]);

    let task = Wakeup::new(Arc::clone(&host), Arc::clone(&control));
    let excuse = task.check().await;
    assert_eq!(excuse, Some("Host is already up".to_string()));
}

#[tokio::test]
async fn wakeup_run_fails_when_interface_cannot_be_discovered() {
    // `ip` is almost certainly present in the sandbox but routing to an
    // address with no configured route fails discovery, exercising the
    // "Can't find interface" branch without needing a fake for `ip`.
    let host = Arc::new(Host {
        label: "unreachable".to_string(),
        mac: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
        ip: "203.0.113.9".parse().unwrap(),
    });
    let control = Arc::new(FakeHostControl::new());
    let task = Wakeup::new(Arc::clone(&host), Arc::clone(&control));

    // Not asserting the exact error text (depends on local routing table
    // contents) — only that an unroutable host never reaches the poke
    // loop and does not panic.
    let progress = ProgressHandle::for_test();
    let result = task.run(&progress).await;
    if let Ok(Some(_)) = result {
        panic!("expected a failure or an error, not a success message");
    }
}

#[tokio::test]
async fn shutdown_check_skips_an_already_down_host() {
    let host = sample_host();
    let control = Arc::new(FakeHostControl::new());
    control.set_reachable_sequence(host.ip, vec![false]);

    let task = Shutdown::new(Arc::clone(&host), Arc::clone(&control));
    assert_eq!(task.check().await, Some("Host is already down".to_string()));
}

#[tokio::test]
async fn shutdown_run_succeeds_once_probe_reports_down() {
    let host = sample_host();
    let control = Arc::new(FakeHostControl::new());
    control.set_probe_sequence(host.ip, vec![true, true, false]);

    let task = Shutdown::new(Arc::clone(&host), Arc::clone(&control));
    let progress = ProgressHandle::for_test();
    let result = task.run(&progress).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn execute_check_fails_fast_when_unreachable() {
    let host = sample_host();
    let control = Arc::new(FakeHostControl::new());
    control.set_reachable_sequence(host.ip, vec![false]);

    let task = Execute::new(Arc::clone(&host), Arc::clone(&control), "uptime");
    assert_eq!(task.check().await, Some("Host is not reachable".to_string()));
}

#[tokio::test]
async fn execute_run_returns_trimmed_stdout() {
    use dazzle_adapters::ssh::SshOutput;

    let host = sample_host();
    let control = Arc::new(FakeHostControl::new());
    control.set_ssh_result(
        host.ip,
        Ok(SshOutput {
            stdout: "  up 3 days  \n".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        }),
    );

    let task = Execute::new(Arc::clone(&host), Arc::clone(&control), "uptime");
    let progress = ProgressHandle::for_test();
    let message = task.run(&progress).await.unwrap();
    assert_eq!(message, Some("up 3 days".to_string()));
}

#[tokio::test]
async fn maintenance_config_create_fails_without_template() {
    let host = sample_host();
    let config = MaintenanceConfig::new(&host, std::path::Path::new(DEFAULT_TFTP_ROOT));
    // The test sandbox has no /srv/tftp tree, so creation must fail with
    // the "template missing" message rather than panicking on the symlink.
    let err = config.create().unwrap_err();
    assert!(matches!(err, TaskError::Failed(message) if message.contains("template")));
}

#[tokio::test]
async fn maintenance_config_creates_and_removes_symlink_under_a_custom_root() {
    let host = sample_host();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("maintenance"), "").unwrap();

    let config = MaintenanceConfig::new(&host, dir.path());
    config.create().unwrap();
    assert!(dir.path().join(dazzle_core::util::ip_hex(host.ip)).exists());

    // A second create on top of an existing link is rejected.
    assert!(config.create().is_err());

    config.remove();
    assert!(!dir.path().join(dazzle_core::util::ip_hex(host.ip)).exists());
}

#[tokio::test]
async fn acquire_builds_a_shutdown_pre_task() {
    let host = sample_host();
    let control = Arc::new(FakeHostControl::new());
    let task = Acquire::new(Arc::clone(&host), Arc::clone(&control));

    let pre = task.pre();
    assert_eq!(pre.len(), 1);
    assert_eq!(pre[0].title(), format!("Shutting down {}", host.label));
}

#[tokio::test]
async fn acquire_via_task_runner_surfaces_template_missing_failure() {
    let host = sample_host();
    let control = Arc::new(FakeHostControl::new());
    control.set_reachable_sequence(host.ip, vec![false]);
    let tree = new_tree();

    let task = Acquire::new(Arc::clone(&host), Arc::clone(&control));
    let idx = crate::task::TaskRunner::execute(&task, &tree, None).await;

    let guard = tree.lock();
    assert_eq!(guard.node(idx).state.kind(), StateKind::Failed);
    assert!(matches!(&guard.node(idx).state, JobState::Failed(message) if message.contains("template")));
}
