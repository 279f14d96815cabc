use crate::config::parser::parse_config_file;
use crate::config::types::{Config, Overrides, Settings};
use crate::error::{PlumbError, Result};
use crate::exec::DEFAULT_SHELL;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the plumbing directory.
pub const DEFAULT_ENV_VAR: &str = "PLUMBERD";

/// Plumbing directory used when [`DEFAULT_ENV_VAR`] is unset or empty.
pub const DEFAULT_DIR: &str = "/mnt/plumb";

pub const CONFIG_FILE: &str = "plumber.toml";
pub const CHANNEL_FILE: &str = "send";
pub const RULES_FILE: &str = "rules";
pub const LOG_FILE: &str = "log";

/// Pause after an empty channel read.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

/// The plumbing directory for this process.
pub fn plumb_dir() -> PathBuf {
	plumb_dir_from(std::env::var(DEFAULT_ENV_VAR).ok())
}

/// The plumbing directory for a given value of [`DEFAULT_ENV_VAR`].
pub fn plumb_dir_from(value: Option<String>) -> PathBuf {
	match value {
		Some(dir) if !dir.is_empty() => PathBuf::from(dir),
		_ => PathBuf::from(DEFAULT_DIR),
	}
}

/// Build the startup settings.
///
/// Precedence, lowest first: files inside `dir`, the config file, the
/// command-line overrides. A config file named explicitly must exist; the
/// default `dir/plumber.toml` is optional.
pub fn resolve_settings(dir: &Path, overrides: &Overrides) -> Result<Settings> {
	let config = load_config(dir, overrides.config.as_deref())?;

	let pick = |flag: &Option<PathBuf>, file: Option<PathBuf>, default: &str| {
		flag.clone()
			.or_else(|| file.map(|p| dir.join(p)))
			.unwrap_or_else(|| dir.join(default))
	};

	Ok(Settings {
		channel: pick(&overrides.channel, config.channel, CHANNEL_FILE),
		rules: pick(&overrides.rules, config.rules, RULES_FILE),
		log: pick(&overrides.log, config.log, LOG_FILE),
		shell: config
			.shell
			.unwrap_or_else(|| DEFAULT_SHELL.iter().map(|s| s.to_string()).collect()),
		backoff: config
			.backoff_ms
			.map(Duration::from_millis)
			.unwrap_or(DEFAULT_BACKOFF),
	})
}

fn load_config(dir: &Path, explicit: Option<&Path>) -> Result<Config> {
	match explicit {
		Some(path) if !path.exists() => Err(PlumbError::ConfigNotFound {
			path: path.to_path_buf(),
		}),
		Some(path) => parse_config_file(path),
		None => {
			let path = dir.join(CONFIG_FILE);
			if path.exists() {
				parse_config_file(&path)
			} else {
				Ok(Config::default())
			}
		}
	}
}
