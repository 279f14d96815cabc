use crate::error::{PlumbError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Optional settings file, `plumber.toml` in the plumbing directory.
///
/// Relative paths are taken relative to the plumbing directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// Named pipe senders write messages to.
	pub channel: Option<PathBuf>,

	/// Rule file, re-read for every message.
	pub rules: Option<PathBuf>,

	/// Daemon log file.
	pub log: Option<PathBuf>,

	/// Shell program and leading arguments used by `plumb start`.
	pub shell: Option<Vec<String>>,

	/// Pause after an empty channel read, in milliseconds.
	pub backoff_ms: Option<u64>,
}

impl Config {
	/// Reject values that would only fail later, at dispatch time.
	pub fn validate(&self, path: &Path) -> Result<()> {
		if let Some(ref shell) = self.shell
			&& shell.first().is_none_or(|program| program.is_empty())
		{
			return Err(PlumbError::InvalidConfig {
				path: path.to_path_buf(),
				reason: "shell must name a program".to_string(),
			});
		}
		Ok(())
	}
}

/// Values supplied on the command line; each one beats the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub config: Option<PathBuf>,
	pub channel: Option<PathBuf>,
	pub rules: Option<PathBuf>,
	pub log: Option<PathBuf>,
}

/// Fully resolved startup settings, built once and handed to the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
	pub channel: PathBuf,
	pub rules: PathBuf,
	pub log: PathBuf,
	pub shell: Vec<String>,
	pub backoff: Duration,
}
