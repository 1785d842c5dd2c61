//! Test helpers for dazzle's behavioral specifications.
//!
//! These tests are black-box: they invoke the compiled `dazzle` binary
//! against a scratch host list file and assert on stdout, stderr, and exit
//! code. `CliBuilder`/`RunAssert` are a thin wrapper over `assert_cmd`,
//! with no daemon to start or stop around each test.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;

/// A scratch directory holding one host list file, torn down on drop.
pub struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a host list file with the given INI body and return its path.
    pub fn hostlist(&self, body: &str) -> PathBuf {
        let path = self.dir.path().join("dazzle.conf");
        std::fs::write(&path, body).expect("write hostlist");
        path
    }
}

/// Build a `dazzle` invocation pointed at `hostlist`.
pub fn dazzle(hostlist: &Path) -> CliBuilder {
    CliBuilder::new(hostlist)
}

pub struct CliBuilder {
    hostlist: PathBuf,
    args: Vec<String>,
}

impl CliBuilder {
    fn new(hostlist: &Path) -> Self {
        CliBuilder {
            hostlist: hostlist.to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn run(self) -> Output {
        Command::cargo_bin("dazzle")
            .expect("dazzle binary")
            .arg("-l")
            .arg(&self.hostlist)
            .args(&self.args)
            .output()
            .expect("command should run")
    }

    /// Run and expect success (exit code 0).
    pub fn passes(self) -> RunAssert {
        let output = self.run();
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        RunAssert { output }
    }

    /// Run and expect failure, asserting the specific exit code.
    pub fn fails_with(self, code: i32) -> RunAssert {
        let output = self.run();
        assert_eq!(
            output.status.code(),
            Some(code),
            "expected exit code {code}, got {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{expected}'\nstdout: {stdout}",
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{expected}'\nstderr: {stderr}",
        );
        self
    }
}

/// A loopback host entry: always reachable, deterministic for "already up"
/// / skip scenarios.
pub const LOOPBACK_HOST: &str = "\
[local]
mac = 02:00:00:00:00:01
ip = 127.0.0.1
";

/// A TEST-NET-3 (RFC 5737) host entry: reserved, non-routable, so ping
/// always fails deterministically without depending on real network
/// topology.
pub const UNREACHABLE_HOST: &str = "\
[ghost]
mac = 02:00:00:00:00:02
ip = 203.0.113.1
";
