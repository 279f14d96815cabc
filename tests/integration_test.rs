#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but replacement requires nightly

use plumber::message::Message;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

fn plumber_cmd() -> assert_cmd::Command {
	assert_cmd::Command::cargo_bin("plumber").unwrap()
}

fn plumb_cmd() -> assert_cmd::Command {
	assert_cmd::Command::cargo_bin("plumb").unwrap()
}

/// Poll until `check` holds or five seconds pass.
fn wait_until(mut check: impl FnMut() -> bool) -> bool {
	let deadline = Instant::now() + Duration::from_secs(5);
	while Instant::now() < deadline {
		if check() {
			return true;
		}
		std::thread::sleep(Duration::from_millis(25));
	}
	false
}

/// Kills the daemon when the test ends, pass or fail.
struct Daemon(Child);

impl Drop for Daemon {
	fn drop(&mut self) {
		let _ = self.0.kill();
		let _ = self.0.wait();
	}
}

/// Children of `pid` that have exited but were never reaped.
#[cfg(target_os = "linux")]
fn zombie_children(pid: u32) -> usize {
	let parent = format!("PPid:\t{pid}");
	fs::read_dir("/proc")
		.unwrap()
		.filter_map(|entry| fs::read_to_string(entry.ok()?.path().join("status")).ok())
		.filter(|status| {
			status.lines().any(|l| l == parent)
				&& status.lines().any(|l| l.starts_with("State:\tZ"))
		})
		.count()
}

fn start_daemon(dir: &Path) -> Daemon {
	let child = Command::new(assert_cmd::cargo::cargo_bin("plumber"))
		.env("PLUMBERD", dir)
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.spawn()
		.unwrap();
	let daemon = Daemon(child);
	assert!(
		wait_until(|| dir.join("send").exists()),
		"daemon never created its channel"
	);
	daemon
}

// ============================================================================
// CLI flag tests
// ============================================================================

#[test]
fn test_plumber_help_flag() {
	plumber_cmd()
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains("Message-routing daemon"));
}

#[test]
fn test_plumber_version_flag() {
	plumber_cmd()
		.arg("--version")
		.assert()
		.success()
		.stdout(predicate::str::contains("plumber"));
}

#[test]
fn test_plumb_help_flag() {
	plumb_cmd()
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains("Send a message to the plumber"));
}

#[test]
fn test_plumber_missing_explicit_config() {
	let temp_dir = tempfile::tempdir().unwrap();

	plumber_cmd()
		.env("PLUMBERD", temp_dir.path())
		.args(["--config", "nope.toml"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("Config file not found"));
}

// ============================================================================
// --check tests
// ============================================================================

#[test]
fn test_check_valid_rules() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join("rules"),
		"# editor\ntype is text\nplumb start acme $data\n\ndata matches x\nplumb to /dev/null\n",
	)
	.unwrap();

	plumber_cmd()
		.env("PLUMBERD", temp_dir.path())
		.arg("--check")
		.assert()
		.success()
		.stdout(predicate::str::contains("2 rule groups"));
}

#[test]
fn test_check_invalid_rules() {
	let temp_dir = tempfile::tempdir().unwrap();
	let rules = temp_dir.path().join("my-rules");
	fs::write(&rules, "type is text\nplumb launch acme\n").unwrap();

	plumber_cmd()
		.env("PLUMBERD", temp_dir.path())
		.arg("--check")
		.arg("-r")
		.arg(&rules)
		.assert()
		.failure()
		.stderr(predicate::str::contains("Invalid rules file"))
		.stderr(predicate::str::contains("line 2"));
}

// ============================================================================
// plumb tests
// ============================================================================

#[test]
fn test_plumb_writes_decodable_message() {
	let temp_dir = tempfile::tempdir().unwrap();
	let channel = temp_dir.path().join("send");
	fs::write(&channel, "").unwrap();

	plumb_cmd()
		.env("PLUMBERD", temp_dir.path())
		.args(["-d", "edit", "-w", "/src", "-a", "action=showfile", "main.rs:12", "-x"])
		.assert()
		.success();

	let bytes = fs::read(&channel).unwrap();
	let msg = Message::decode(&mut bytes.as_slice()).unwrap();
	assert_eq!(msg.src, "plumb");
	assert_eq!(msg.dst, "edit");
	assert_eq!(msg.wdir, "/src");
	assert_eq!(msg.kind, "text");
	assert_eq!(msg.attr.get("action").unwrap(), "showfile");
	assert_eq!(msg.data, b"main.rs:12 -x");
}

#[test]
fn test_plumb_stdin_appends_newline() {
	let temp_dir = tempfile::tempdir().unwrap();
	let channel = temp_dir.path().join("fifo");
	fs::write(&channel, "").unwrap();

	plumb_cmd()
		.arg("-p")
		.arg(&channel)
		.arg("-i")
		.write_stdin("hello")
		.assert()
		.success();

	let bytes = fs::read(&channel).unwrap();
	let msg = Message::decode(&mut bytes.as_slice()).unwrap();
	assert_eq!(msg.data, b"hello\n");
	assert!(!msg.wdir.is_empty());
}

#[test]
fn test_plumb_empty_stdin_fails() {
	let temp_dir = tempfile::tempdir().unwrap();
	let channel = temp_dir.path().join("send");
	fs::write(&channel, "").unwrap();

	plumb_cmd()
		.arg("-p")
		.arg(&channel)
		.arg("-i")
		.write_stdin("")
		.assert()
		.failure()
		.stderr(predicate::str::contains("no input provided"));
}

#[test]
fn test_plumb_rejects_bad_attribute() {
	plumb_cmd()
		.args(["-a", "novalue", "data"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("NAME=VALUE"));
}

#[test]
fn test_plumb_missing_channel() {
	let temp_dir = tempfile::tempdir().unwrap();

	plumb_cmd()
		.env("PLUMBERD", temp_dir.path())
		.arg("data")
		.assert()
		.failure()
		.stderr(predicate::str::contains("Failed to open"));
}

// ============================================================================
// Daemon tests (Unix only - these use a named pipe and /bin/sh)
// ============================================================================

#[cfg(unix)]
#[test]
fn test_daemon_routes_messages() {
	let temp_dir = tempfile::tempdir().unwrap();
	let dir = temp_dir.path();
	let urls = dir.join("urls");
	let work = dir.join("work");
	fs::create_dir(&work).unwrap();

	fs::write(
		dir.join("rules"),
		format!(
			"\
# urls are collected
type is text
data matches '^https?://'
arg set $data
plumb to {}

# everything for the editor opens a file
dst is edit
arg isfile $data
plumb start touch opened
",
			urls.display()
		),
	)
	.unwrap();
	fs::write(work.join("notes.txt"), "").unwrap();

	let _daemon = start_daemon(dir);

	plumb_cmd()
		.env("PLUMBERD", dir)
		.arg("-i")
		.write_stdin("https://example.com")
		.assert()
		.success();

	plumb_cmd()
		.env("PLUMBERD", dir)
		.arg("-d")
		.arg("edit")
		.arg("-w")
		.arg(&work)
		.arg("notes.txt")
		.assert()
		.success();

	assert!(wait_until(|| {
		fs::read_to_string(&urls).is_ok_and(|s| s == "https://example.com\n")
	}));
	assert!(wait_until(|| work.join("opened").exists()));
	assert!(wait_until(|| {
		fs::read_to_string(dir.join("log")).is_ok_and(|log| log.contains("matched rule"))
	}));
}

#[cfg(unix)]
#[test]
fn test_daemon_survives_bad_messages_and_rules() {
	let temp_dir = tempfile::tempdir().unwrap();
	let dir = temp_dir.path();
	let out = dir.join("out");

	fs::write(
		dir.join("rules"),
		format!(
			"\
dst is broken
arg isdir /nonexistent/plumber

type is text
arg set $data
plumb to {}
",
			out.display()
		),
	)
	.unwrap();

	let _daemon = start_daemon(dir);

	// The stat error aborts this dispatch only.
	plumb_cmd()
		.env("PLUMBERD", dir)
		.args(["-d", "broken", "first"])
		.assert()
		.success();

	// Raw garbage on the channel is dropped.
	fs::OpenOptions::new()
		.write(true)
		.open(dir.join("send"))
		.and_then(|mut f| std::io::Write::write_all(&mut f, b"not a message"))
		.unwrap();

	// Let the daemon drain the garbage before the next writer shows up,
	// or both land in one read.
	assert!(wait_until(|| {
		fs::read_to_string(dir.join("log")).is_ok_and(|log| log.contains("decode failed"))
	}));

	plumb_cmd()
		.env("PLUMBERD", dir)
		.args(["-d", "fine", "second"])
		.assert()
		.success();

	assert!(wait_until(|| {
		fs::read_to_string(&out).is_ok_and(|s| s == "second")
	}));
	assert!(wait_until(|| {
		fs::read_to_string(dir.join("log")).is_ok_and(|log| log.contains("dispatch failed"))
	}));
}

#[cfg(target_os = "linux")]
#[test]
fn test_daemon_leaves_no_zombie_children() {
	let temp_dir = tempfile::tempdir().unwrap();
	let dir = temp_dir.path();

	fs::write(dir.join("rules"), "type is text\nplumb start touch $data\n").unwrap();

	let daemon = start_daemon(dir);

	let names = ["c1", "c2", "c3", "c4", "c5"];
	for name in names {
		plumb_cmd()
			.env("PLUMBERD", dir)
			.arg("-w")
			.arg(dir)
			.arg(name)
			.assert()
			.success();
	}

	assert!(wait_until(|| names.iter().all(|name| dir.join(name).exists())));
	assert!(
		wait_until(|| zombie_children(daemon.0.id()) == 0),
		"exited children were left unreaped"
	);
}
