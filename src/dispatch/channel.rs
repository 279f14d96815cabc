use crate::error::{PlumbError, Result};
use nix::sys::stat::Mode;
use std::path::Path;

/// Create the channel as a named pipe unless something already exists at
/// `path`. Returns whether a pipe was created.
pub fn ensure_fifo(path: &Path) -> Result<bool> {
	if path.symlink_metadata().is_ok() {
		return Ok(false);
	}
	nix::unistd::mkfifo(path, Mode::from_bits_truncate(0o644)).map_err(|source| {
		PlumbError::ChannelCreate {
			path: path.to_path_buf(),
			source,
		}
	})?;
	tracing::info!(path = %path.display(), "created channel");
	Ok(true)
}

/// Open the channel for reading, creating it first if needed.
///
/// Opening a named pipe waits for the first writer.
pub async fn open(path: &Path) -> Result<tokio::fs::File> {
	ensure_fifo(path)?;
	tokio::fs::File::open(path)
		.await
		.map_err(|source| PlumbError::ChannelOpen {
			path: path.to_path_buf(),
			source,
		})
}
