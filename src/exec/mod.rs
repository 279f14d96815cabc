//! Process launching for `plumb start`.
//!
//! This module handles:
//! - Running a command line through the configured shell
//! - Detaching the child so the daemon never waits on it
//! - Letting the kernel reap exited children

use crate::error::{PlumbError, Result};
use nix::sys::signal::{SigHandler, Signal, signal};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

/// Default shell and flag used to interpret `plumb start` command lines.
pub const DEFAULT_SHELL: [&str; 2] = ["/bin/sh", "-c"];

/// Ignore SIGCHLD so exited children are reaped by the kernel instead of
/// lingering as zombies of the daemon.
///
/// Process-wide: nothing in the process may wait on a child afterwards.
pub fn reap_children() -> Result<()> {
	// SAFETY: installs SIG_IGN, not a handler, so no code runs in signal context.
	unsafe { signal(Signal::SIGCHLD, SigHandler::SigIgn) }
		.map_err(|source| PlumbError::ChildReaping { source })?;
	Ok(())
}

/// Launches the commands named by `plumb start` rules.
pub trait Launcher: Send + Sync {
	/// Start `command` with `wdir` as its working directory and return once
	/// it has been launched.
	fn start(&self, command: &str, wdir: &str) -> Result<()>;
}

/// Runs commands through a system shell, fire-and-forget.
#[derive(Debug, Clone)]
pub struct ShellLauncher {
	/// Shell program followed by its leading arguments, e.g. `["/bin/sh", "-c"]`.
	shell: Vec<String>,
}

impl ShellLauncher {
	pub fn new(shell: Vec<String>) -> Self {
		Self { shell }
	}

	fn command(&self, command: &str, wdir: &str) -> Command {
		let (program, args) = match self.shell.split_first() {
			Some((program, args)) => (program.as_str(), args),
			None => (DEFAULT_SHELL[0], &[][..]),
		};
		let mut cmd = Command::new(program);
		cmd.args(args)
			.arg(command)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.process_group(0);
		if !wdir.is_empty() {
			cmd.current_dir(wdir);
		}
		cmd
	}
}

impl Default for ShellLauncher {
	fn default() -> Self {
		Self::new(DEFAULT_SHELL.iter().map(|s| s.to_string()).collect())
	}
}

impl Launcher for ShellLauncher {
	fn start(&self, command: &str, wdir: &str) -> Result<()> {
		let child = self
			.command(command, wdir)
			.spawn()
			.map_err(|source| PlumbError::CommandFailed {
				command: command.to_string(),
				source,
			})?;
		// The handle is released here; the child is neither killed nor waited on.
		// Reaping is left to the kernel, see `reap_children`.
		tracing::info!(pid = child.id(), command, wdir, "started");
		Ok(())
	}
}
