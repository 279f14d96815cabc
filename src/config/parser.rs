use crate::config::types::Config;
use crate::error::{PlumbError, Result};
use std::path::Path;

/// Read and validate `plumber.toml`; a missing file is a read error here,
/// the caller decides whether that matters.
pub fn parse_config_file(path: &Path) -> Result<Config> {
	let content = std::fs::read_to_string(path).map_err(|source| PlumbError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse settings text. `path` only labels errors and is never opened.
pub fn parse_config_str(content: &str, path: &Path) -> Result<Config> {
	let config: Config =
		toml::from_str(content).map_err(|source| PlumbError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	config.validate(path)?;

	Ok(config)
}
