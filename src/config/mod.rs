//! Startup configuration for plumber.
//!
//! This module handles:
//! - Locating the plumbing directory from `$PLUMBERD`
//! - Parsing the optional `plumber.toml`
//! - Layering command-line overrides on top

pub mod parser;
pub mod resolve;
pub mod types;

pub use parser::{parse_config_file, parse_config_str};
pub use resolve::{DEFAULT_ENV_VAR, plumb_dir, plumb_dir_from, resolve_settings};
pub use types::{Config, Overrides, Settings};
