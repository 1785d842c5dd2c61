//! `--help`/argument-parsing surface.

use assert_cmd::Command;

fn run(args: &[&str]) -> std::process::Output {
    Command::cargo_bin("dazzle")
        .expect("dazzle binary")
        .args(args)
        .output()
        .expect("command should run")
}

#[test]
fn help_lists_every_command() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["wakeup", "shutdown", "execute", "acquire", "receive", "clone", "build"] {
        assert!(stdout.contains(command), "help text missing '{command}'\n{stdout}");
    }
}

#[test]
fn missing_subcommand_exits_with_usage_error() {
    let output = run(&[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_subcommand_exits_with_usage_error() {
    let output = run(&["moonwalk"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn wakeup_without_hosts_exits_with_usage_error() {
    let output = run(&["wakeup"]);
    assert_eq!(output.status.code(), Some(2));
}
