//! Log sink setup for the daemon.

use std::fs::OpenOptions;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to `path`, truncating it.
///
/// Every event is handed whole to a single background writer, so lines
/// from concurrent dispatches never interleave. If the file cannot be
/// opened the daemon logs to stderr instead. Keep the returned guard
/// alive for the life of the process so buffered lines are flushed.
pub fn init(path: &Path) -> WorkerGuard {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	let file = OpenOptions::new()
		.create(true)
		.write(true)
		.truncate(true)
		.open(path);

	let (writer, guard, open_error) = match file {
		Ok(file) => {
			let (writer, guard) = tracing_appender::non_blocking(file);
			(writer, guard, None)
		}
		Err(e) => {
			let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
			(writer, guard, Some(e))
		}
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(writer)
		.with_ansi(false)
		.with_target(false)
		.init();

	if let Some(e) = open_error {
		tracing::error!(path = %path.display(), error = %e, "cannot open log file, logging to stderr");
	}
	guard
}
